// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! Secret wrapper types for Tether.
//!
//! This crate provides [`Secret<T>`] and the [`SecretString`] alias, wrappers
//! that prevent sensitive values (directory tokens, SMTP passwords) from
//! leaking into logs or serialized output:
//!
//! - `Debug` and `Display` render as `[REDACTED]`
//! - the inner value is zeroized from memory on drop
//! - serde serialization always emits the redaction marker, never the value
//!
//! # Example
//!
//! ```
//! use tether_common_secret::SecretString;
//!
//! let token = SecretString::new("very-sensitive".to_string());
//! assert_eq!(format!("{token:?}"), "[REDACTED]");
//! assert_eq!(token.expose(), "very-sensitive");
//! ```

use zeroize::Zeroize;

/// The marker emitted anywhere a secret would otherwise appear.
pub const REDACTED: &str = "[REDACTED]";

/// A wrapper that keeps a sensitive value out of logs and serialized output.
///
/// Access to the inner value is explicit via [`Secret::expose`] or
/// [`Secret::into_inner`], so every read of the secret is visible at the
/// call site.
pub struct Secret<T: Zeroize>(T);

/// A secret string value. The common case for tokens and passwords.
pub type SecretString = Secret<String>;

impl<T: Zeroize> Secret<T> {
	/// Wrap a sensitive value.
	pub fn new(value: T) -> Self {
		Secret(value)
	}

	/// Borrow the inner value. The name makes the access greppable.
	pub fn expose(&self) -> &T {
		&self.0
	}

	/// Consume the wrapper and return the inner value.
	///
	/// The returned value is no longer protected; callers take over
	/// responsibility for its lifetime.
	pub fn into_inner(mut self) -> T
	where
		T: Default,
	{
		std::mem::take(&mut self.0)
	}
}

impl SecretString {
	/// Borrow the secret as a `&str`.
	pub fn expose_str(&self) -> &str {
		&self.0
	}
}

impl<T: Zeroize> Drop for Secret<T> {
	fn drop(&mut self) {
		self.0.zeroize();
	}
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
	fn clone(&self) -> Self {
		Secret(self.0.clone())
	}
}

impl<T: Zeroize> std::fmt::Debug for Secret<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T: Zeroize> std::fmt::Display for Secret<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		SecretString::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		SecretString::new(value.to_string())
	}
}

#[cfg(feature = "serde")]
impl<T: Zeroize> serde::Serialize for Secret<T> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

#[cfg(feature = "serde")]
impl<'de, T: Zeroize + serde::Deserialize<'de>> serde::Deserialize<'de> for Secret<T> {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		T::deserialize(deserializer).map(Secret::new)
	}
}
