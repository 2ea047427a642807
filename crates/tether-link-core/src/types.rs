// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! ID newtypes for the two sides of a link.
//!
//! Both identifiers are opaque strings issued by their respective systems:
//! the external platform hands out numeric account ids as strings, the
//! corporate directory hands out object ids (GUID-shaped, but treated as
//! opaque). Newtypes keep the two from being mixed up at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_string_id {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(String);

		impl $name {
			/// Create an ID from its string form.
			pub fn new(id: impl Into<String>) -> Self {
				Self(id.into())
			}

			/// Borrow the ID as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}

			/// Get the inner string value.
			pub fn into_inner(self) -> String {
				self.0
			}

			/// True when the ID is the empty string.
			pub fn is_empty(&self) -> bool {
				self.0.is_empty()
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<String> for $name {
			fn from(id: String) -> Self {
				Self(id)
			}
		}

		impl From<&str> for $name {
			fn from(id: &str) -> Self {
				Self(id.to_string())
			}
		}
	};
}

define_string_id!(
	ExternalAccountId,
	"Unique identifier of the external platform account being linked."
);
define_string_id!(
	CorporateId,
	"Unique identifier of a corporate directory identity."
);

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_round_trips() {
		let id = ExternalAccountId::new("8577281");
		assert_eq!(id.to_string(), "8577281");
		assert_eq!(id.as_str(), "8577281");
	}

	#[test]
	fn serde_is_transparent() {
		let id = CorporateId::new("e3c7a2f0-0000-0000-0000-000000000042");
		let json = serde_json::to_string(&id).unwrap();
		assert_eq!(json, "\"e3c7a2f0-0000-0000-0000-000000000042\"");

		let back: CorporateId = serde_json::from_str(&json).unwrap();
		assert_eq!(back, id);
	}

	#[test]
	fn empty_detection() {
		assert!(ExternalAccountId::new("").is_empty());
		assert!(!ExternalAccountId::new("1").is_empty());
	}
}
