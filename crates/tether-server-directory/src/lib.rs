// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! Corporate directory lookups for Tether.
//!
//! The guest gate needs exactly one question answered before a link is
//! allowed: what kind of identity is this corporate id (member or guest),
//! and what are its canonical names. This crate provides the
//! [`DirectoryClient`] trait for that lookup plus a Graph-style HTTP
//! implementation.
//!
//! The directory is an optional subsystem: [`DirectoryConfig::from_env`]
//! returns `Ok(None)` when no directory is configured. Whether the absence
//! is acceptable is the gate's decision, not this crate's — gating enabled
//! with no directory is a configuration error at the gate.
//!
//! # Security Considerations
//!
//! The API token is wrapped in [`SecretString`] so it never appears in logs
//! or Debug output, and tracing instrumentation skips it.

use async_trait::async_trait;
use serde::Deserialize;
use std::env;
use tether_common_secret::SecretString;
use url::Url;

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur during directory lookups.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
	/// The HTTP request to the directory failed (network error, timeout, etc.).
	#[error("HTTP request failed: {0}")]
	HttpRequest(#[from] reqwest::Error),

	/// The response from the directory could not be parsed as expected.
	#[error("failed to parse response: {0}")]
	Parse(String),

	/// The directory returned an error response.
	#[error("directory API error: {0}")]
	Api(String),

	/// No identity exists for the requested id.
	#[error("identity not found: {0}")]
	NotFound(String),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// A required environment variable was not set.
	#[error("missing environment variable: {0}")]
	MissingEnvVar(String),

	/// A configuration value was empty or invalid.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),
}

// =============================================================================
// Payloads
// =============================================================================

/// The user type value the directory uses for external/guest identities.
pub const GUEST_USER_TYPE: &str = "Guest";

/// Profile attributes resolved for a corporate identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryUser {
	/// The directory object id.
	pub id: String,

	/// Identity classification ("Member", "Guest", ...). Directories omit
	/// this for some object classes, hence optional.
	#[serde(rename = "userType")]
	pub user_type: Option<String>,

	/// Display name.
	#[serde(rename = "displayName")]
	pub display_name: String,

	/// User principal name (canonical sign-in name).
	#[serde(rename = "userPrincipalName")]
	pub user_principal_name: String,

	/// Primary mail address, when published.
	pub mail: Option<String>,
}

impl DirectoryUser {
	/// True when the directory classifies this identity as a guest.
	pub fn is_guest(&self) -> bool {
		self.user_type.as_deref() == Some(GUEST_USER_TYPE)
	}
}

/// A directory user together with their manager, when one is assigned.
///
/// Used by the link page to suggest the service-account flow: identities
/// without a manager are usually automation accounts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryUserWithManager {
	/// The resolved user.
	#[serde(flatten)]
	pub user: DirectoryUser,

	/// The user's manager, absent for service-account candidates.
	pub manager: Option<DirectoryUser>,
}

impl DirectoryUserWithManager {
	/// True when the identity looks like an automation account.
	pub fn is_service_account_candidate(&self) -> bool {
		self.manager.is_none()
	}
}

// =============================================================================
// Contract
// =============================================================================

/// Lookup contract consumed by the guest gate and the link page.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
	/// Resolve a corporate identity to its profile attributes.
	async fn get_user_by_id(&self, id: &str) -> Result<DirectoryUser, DirectoryError>;

	/// Resolve a corporate identity together with its manager.
	async fn get_user_and_manager_by_id(
		&self,
		id: &str,
	) -> Result<DirectoryUserWithManager, DirectoryError>;
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Graph-style directory client.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
	/// Base URL of the directory API (e.g., "https://graph.example.com/v1.0").
	pub base_url: String,

	/// Bearer token for the directory API (wrapped to prevent logging).
	pub token: SecretString,
}

impl DirectoryConfig {
	/// Load directory configuration from environment variables.
	///
	/// Returns `Ok(None)` if no directory is configured
	/// (`TETHER_SERVER_DIRECTORY_BASE_URL` not set). Returns `Err` if the
	/// configuration is incomplete.
	///
	/// Environment variables:
	/// - `TETHER_SERVER_DIRECTORY_BASE_URL` - directory API base URL
	/// - `TETHER_SERVER_DIRECTORY_TOKEN` - bearer token (required if base URL is set)
	pub fn from_env() -> Result<Option<Self>, ConfigError> {
		let base_url = match env::var("TETHER_SERVER_DIRECTORY_BASE_URL") {
			Ok(url) if !url.is_empty() => url,
			_ => return Ok(None),
		};

		let token = env::var("TETHER_SERVER_DIRECTORY_TOKEN").map_err(|_| {
			ConfigError::MissingEnvVar("TETHER_SERVER_DIRECTORY_TOKEN".to_string())
		})?;

		let config = Self {
			base_url,
			token: SecretString::new(token),
		};
		config.validate()?;
		Ok(Some(config))
	}

	/// Validate that all configuration fields are usable.
	pub fn validate(&self) -> Result<(), ConfigError> {
		Url::parse(&self.base_url)
			.map_err(|e| ConfigError::InvalidConfig(format!("base_url is not a valid URL: {e}")))?;
		if self.token.expose().is_empty() {
			return Err(ConfigError::InvalidConfig(
				"token cannot be empty".to_string(),
			));
		}
		Ok(())
	}
}

// =============================================================================
// HTTP client
// =============================================================================

/// Graph-style HTTP directory client.
pub struct GraphDirectoryClient {
	config: DirectoryConfig,
	http: reqwest::Client,
}

impl GraphDirectoryClient {
	pub fn new(config: DirectoryConfig) -> Self {
		Self {
			config,
			http: reqwest::Client::new(),
		}
	}

	async fn get_json<T: serde::de::DeserializeOwned>(
		&self,
		path: &str,
		id: &str,
	) -> Result<T, DirectoryError> {
		let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);

		let response = self
			.http
			.get(&url)
			.bearer_auth(self.config.token.expose())
			.header("accept", "application/json")
			.send()
			.await?;

		if response.status() == reqwest::StatusCode::NOT_FOUND {
			return Err(DirectoryError::NotFound(id.to_string()));
		}
		if !response.status().is_success() {
			let status = response.status();
			let body = response.text().await.unwrap_or_default();
			return Err(DirectoryError::Api(format!("{status}: {body}")));
		}

		response
			.json::<T>()
			.await
			.map_err(|e| DirectoryError::Parse(e.to_string()))
	}
}

#[async_trait]
impl DirectoryClient for GraphDirectoryClient {
	#[tracing::instrument(skip(self), fields(corporate_id = %id))]
	async fn get_user_by_id(&self, id: &str) -> Result<DirectoryUser, DirectoryError> {
		self
			.get_json(
				&format!("users/{id}?$select=id,userType,displayName,userPrincipalName,mail"),
				id,
			)
			.await
	}

	#[tracing::instrument(skip(self), fields(corporate_id = %id))]
	async fn get_user_and_manager_by_id(
		&self,
		id: &str,
	) -> Result<DirectoryUserWithManager, DirectoryError> {
		self
			.get_json(&format!("users/{id}?$expand=manager"), id)
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn make_user(user_type: Option<&str>) -> DirectoryUser {
		DirectoryUser {
			id: "aad-0001".to_string(),
			user_type: user_type.map(str::to_string),
			display_name: "Octo Cat".to_string(),
			user_principal_name: "octo@corp.example.com".to_string(),
			mail: None,
		}
	}

	mod guest_classification {
		use super::*;

		#[test]
		fn guest_user_type_is_guest() {
			assert!(make_user(Some("Guest")).is_guest());
		}

		#[test]
		fn member_is_not_guest() {
			assert!(!make_user(Some("Member")).is_guest());
		}

		#[test]
		fn missing_user_type_is_not_guest() {
			assert!(!make_user(None).is_guest());
		}

		#[test]
		fn classification_is_case_sensitive() {
			// The directory emits the exact literal; "guest" would be a
			// different (unknown) classification.
			assert!(!make_user(Some("guest")).is_guest());
		}
	}

	mod payload_parsing {
		use super::*;

		#[test]
		fn deserializes_directory_casing() {
			let user: DirectoryUser = serde_json::from_str(
				r#"{
					"id": "aad-0001",
					"userType": "Guest",
					"displayName": "Octo Cat",
					"userPrincipalName": "octo@partner.example.com",
					"mail": "octo@partner.example.com"
				}"#,
			)
			.unwrap();

			assert!(user.is_guest());
			assert_eq!(user.user_principal_name, "octo@partner.example.com");
		}

		#[test]
		fn manager_payload_flattens_user() {
			let with_manager: DirectoryUserWithManager = serde_json::from_str(
				r#"{
					"id": "aad-0001",
					"userType": "Member",
					"displayName": "Octo Cat",
					"userPrincipalName": "octo@corp.example.com",
					"mail": null,
					"manager": null
				}"#,
			)
			.unwrap();

			assert_eq!(with_manager.user.id, "aad-0001");
			assert!(with_manager.is_service_account_candidate());
		}
	}

	mod config {
		use super::*;

		#[test]
		fn validate_rejects_bad_url() {
			let config = DirectoryConfig {
				base_url: "not a url".to_string(),
				token: SecretString::new("token".to_string()),
			};
			assert!(config.validate().is_err());
		}

		#[test]
		fn validate_rejects_empty_token() {
			let config = DirectoryConfig {
				base_url: "https://graph.example.com/v1.0".to_string(),
				token: SecretString::new(String::new()),
			};
			assert!(config.validate().is_err());
		}

		#[test]
		fn config_debug_does_not_leak_token() {
			let config = DirectoryConfig {
				base_url: "https://graph.example.com/v1.0".to_string(),
				token: SecretString::new("very-secret-token".to_string()),
			};

			let debug = format!("{config:?}");
			assert!(!debug.contains("very-secret-token"));
			assert!(debug.contains("[REDACTED]"));
		}
	}
}
