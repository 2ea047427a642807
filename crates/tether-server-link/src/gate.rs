// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! The guest gate: the policy decision that runs before any link mutation.
//!
//! With gating disabled the gate answers [`GuestDecision::Allowed`] without
//! touching the directory. With gating enabled it issues exactly one
//! directory lookup and blocks guest identities, except ids on the
//! authorized list, which are allowed and handed the directory's canonical
//! principal name to use for the rest of the request.

use std::sync::Arc;

use tether_link_core::CorporateId;
use tether_server_directory::DirectoryClient;

use crate::config::GuestPolicyConfig;
use crate::error::GateError;

/// Per-request gate decision. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuestDecision {
	/// The identity may link.
	Allowed,

	/// A guest identity specifically permitted to link. The principal name
	/// from the directory response overrides any session-cached username
	/// for the remainder of the request.
	AllowedViaOverride { user_principal_name: String },

	/// A guest identity that is not permitted to link. The names are for
	/// the user-facing rejection message.
	Blocked {
		display_name: String,
		user_principal_name: String,
	},
}

/// Decides whether the acting corporate identity is permitted to create a
/// link.
pub struct GuestGate {
	policy: GuestPolicyConfig,
	directory: Option<Arc<dyn DirectoryClient>>,
}

impl GuestGate {
	pub fn new(policy: GuestPolicyConfig, directory: Option<Arc<dyn DirectoryClient>>) -> Self {
		Self { policy, directory }
	}

	/// Evaluate the gate for one corporate identity.
	///
	/// # Errors
	///
	/// Returns [`GateError::Configuration`] when gating is enabled but no
	/// directory is available (gating is never silently skipped), and
	/// [`GateError::Lookup`] when the directory call fails — the caller
	/// must not proceed to linking in either case.
	#[tracing::instrument(skip(self), fields(corporate_id = %corporate_id))]
	pub async fn evaluate(&self, corporate_id: &CorporateId) -> Result<GuestDecision, GateError> {
		if !self.policy.block_guest_user_types {
			return Ok(GuestDecision::Allowed);
		}

		let directory = self.directory.as_ref().ok_or(GateError::Configuration)?;

		tracing::info!("guest validation started");

		let details = directory
			.get_user_by_id(corporate_id.as_str())
			.await
			.map_err(|e| {
				tracing::error!(error = %e, "guest validation lookup failed");
				GateError::Lookup(e)
			})?;

		let decision = if !details.is_guest() {
			GuestDecision::Allowed
		} else if self.policy.authorizes(corporate_id) {
			GuestDecision::AllowedViaOverride {
				user_principal_name: details.user_principal_name.clone(),
			}
		} else {
			GuestDecision::Blocked {
				display_name: details.display_name.clone(),
				user_principal_name: details.user_principal_name.clone(),
			}
		};

		tracing::info!(
			user_type = details.user_type.as_deref().unwrap_or(""),
			display_name = %details.display_name,
			user_principal_name = %details.user_principal_name,
			blocked = matches!(decision, GuestDecision::Blocked { .. }),
			"guest validation finished"
		);

		Ok(decision)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use tether_server_directory::{DirectoryError, DirectoryUser, DirectoryUserWithManager};

	struct FakeDirectory {
		calls: AtomicUsize,
		response: Result<DirectoryUser, String>,
	}

	impl FakeDirectory {
		fn returning(user: DirectoryUser) -> Self {
			Self {
				calls: AtomicUsize::new(0),
				response: Ok(user),
			}
		}

		fn failing(message: &str) -> Self {
			Self {
				calls: AtomicUsize::new(0),
				response: Err(message.to_string()),
			}
		}

		fn call_count(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl DirectoryClient for FakeDirectory {
		async fn get_user_by_id(&self, _id: &str) -> Result<DirectoryUser, DirectoryError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self
				.response
				.clone()
				.map_err(DirectoryError::Api)
		}

		async fn get_user_and_manager_by_id(
			&self,
			id: &str,
		) -> Result<DirectoryUserWithManager, DirectoryError> {
			Ok(DirectoryUserWithManager {
				user: self.get_user_by_id(id).await?,
				manager: None,
			})
		}
	}

	fn guest_user() -> DirectoryUser {
		DirectoryUser {
			id: "aad-0001".to_string(),
			user_type: Some("Guest".to_string()),
			display_name: "Octo Cat".to_string(),
			user_principal_name: "octo@partner.example.com".to_string(),
			mail: None,
		}
	}

	fn member_user() -> DirectoryUser {
		DirectoryUser {
			user_type: Some("Member".to_string()),
			..guest_user()
		}
	}

	mod gating_disabled {
		use super::*;

		#[tokio::test]
		async fn allows_without_any_directory_call() {
			let directory = Arc::new(FakeDirectory::returning(guest_user()));
			let gate = GuestGate::new(GuestPolicyConfig::disabled(), Some(directory.clone()));

			let decision = gate
				.evaluate(&CorporateId::new("aad-0001"))
				.await
				.unwrap();

			assert_eq!(decision, GuestDecision::Allowed);
			assert_eq!(directory.call_count(), 0);
		}

		#[tokio::test]
		async fn works_without_any_directory_configured() {
			let gate = GuestGate::new(GuestPolicyConfig::disabled(), None);
			let decision = gate
				.evaluate(&CorporateId::new("aad-0001"))
				.await
				.unwrap();
			assert_eq!(decision, GuestDecision::Allowed);
		}
	}

	mod gating_enabled {
		use super::*;

		#[tokio::test]
		async fn missing_directory_is_a_configuration_error() {
			let gate = GuestGate::new(GuestPolicyConfig::blocking::<_, String>([]), None);

			let err = gate
				.evaluate(&CorporateId::new("aad-0001"))
				.await
				.unwrap_err();
			assert!(matches!(err, GateError::Configuration));
		}

		#[tokio::test]
		async fn member_is_allowed_with_one_lookup() {
			let directory = Arc::new(FakeDirectory::returning(member_user()));
			let gate = GuestGate::new(
				GuestPolicyConfig::blocking::<_, String>([]),
				Some(directory.clone()),
			);

			let decision = gate
				.evaluate(&CorporateId::new("aad-0001"))
				.await
				.unwrap();

			assert_eq!(decision, GuestDecision::Allowed);
			assert_eq!(directory.call_count(), 1);
		}

		#[tokio::test]
		async fn unauthorized_guest_is_blocked_with_names() {
			let directory = Arc::new(FakeDirectory::returning(guest_user()));
			let gate = GuestGate::new(
				GuestPolicyConfig::blocking::<_, String>([]),
				Some(directory),
			);

			let decision = gate
				.evaluate(&CorporateId::new("aad-0001"))
				.await
				.unwrap();

			assert_eq!(
				decision,
				GuestDecision::Blocked {
					display_name: "Octo Cat".to_string(),
					user_principal_name: "octo@partner.example.com".to_string(),
				}
			);
		}

		#[tokio::test]
		async fn authorized_guest_gets_principal_name_override() {
			let directory = Arc::new(FakeDirectory::returning(guest_user()));
			let gate = GuestGate::new(
				GuestPolicyConfig::blocking(["aad-0001"]),
				Some(directory.clone()),
			);

			let decision = gate
				.evaluate(&CorporateId::new("aad-0001"))
				.await
				.unwrap();

			assert_eq!(
				decision,
				GuestDecision::AllowedViaOverride {
					user_principal_name: "octo@partner.example.com".to_string(),
				}
			);
			assert_eq!(directory.call_count(), 1);
		}

		#[tokio::test]
		async fn authorization_list_does_not_leak_to_other_guests() {
			let directory = Arc::new(FakeDirectory::returning(guest_user()));
			let gate = GuestGate::new(
				GuestPolicyConfig::blocking(["aad-9999"]),
				Some(directory),
			);

			let decision = gate
				.evaluate(&CorporateId::new("aad-0001"))
				.await
				.unwrap();
			assert!(matches!(decision, GuestDecision::Blocked { .. }));
		}

		#[tokio::test]
		async fn lookup_failure_propagates() {
			let directory = Arc::new(FakeDirectory::failing("directory unavailable"));
			let gate = GuestGate::new(
				GuestPolicyConfig::blocking::<_, String>([]),
				Some(directory),
			);

			let err = gate
				.evaluate(&CorporateId::new("aad-0001"))
				.await
				.unwrap_err();
			assert!(matches!(err, GateError::Lookup(_)));
			assert!(err.to_string().contains("directory unavailable"));
		}
	}
}
