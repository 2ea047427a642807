// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! Link policy and branding configuration.

use std::collections::HashSet;
use std::env;

use tether_link_core::CorporateId;

use crate::error::LinkError;

/// Guest gating policy.
///
/// When `block_guest_user_types` is false the gate allows everyone without
/// touching the directory. When true, guests are blocked unless their
/// corporate id appears in `authorized_guest_ids`.
#[derive(Debug, Clone, Default)]
pub struct GuestPolicyConfig {
	/// Whether directory "Guest" identities are blocked from linking.
	pub block_guest_user_types: bool,

	/// Corporate ids of guests specifically permitted to link anyway.
	pub authorized_guest_ids: HashSet<String>,
}

impl GuestPolicyConfig {
	/// Policy that gates nobody. The common fast path.
	pub fn disabled() -> Self {
		Self::default()
	}

	/// Policy that blocks all guests except the given ids.
	pub fn blocking<I, S>(authorized_guest_ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			block_guest_user_types: true,
			authorized_guest_ids: authorized_guest_ids.into_iter().map(Into::into).collect(),
		}
	}

	/// True when this corporate id is specifically permitted despite being
	/// a guest.
	pub fn authorizes(&self, id: &CorporateId) -> bool {
		self.authorized_guest_ids.contains(id.as_str())
	}
}

/// Configuration for the link service.
#[derive(Debug, Clone)]
pub struct LinkConfig {
	/// Guest gating policy.
	pub policy: GuestPolicyConfig,

	/// Company name used in welcome mail copy.
	pub company_name: String,

	/// Operations contact, copy-recipiented on service-account welcome
	/// mails when configured.
	pub operations_email: Option<String>,
}

impl Default for LinkConfig {
	fn default() -> Self {
		Self {
			policy: GuestPolicyConfig::disabled(),
			company_name: "Tether".to_string(),
			operations_email: None,
		}
	}
}

impl LinkConfig {
	/// Load link configuration from environment variables.
	///
	/// Environment variables:
	/// - `TETHER_SERVER_LINK_BLOCK_GUESTS` - block guest identities (default: false)
	/// - `TETHER_SERVER_LINK_AUTHORIZED_GUEST_IDS` - comma-separated corporate ids
	///   permitted despite being guests
	/// - `TETHER_SERVER_LINK_COMPANY_NAME` - brand name for mail copy (default: "Tether")
	/// - `TETHER_SERVER_LINK_OPS_EMAIL` - operations contact for service-account mail
	pub fn from_env() -> Result<Self, LinkError> {
		let block_guest_user_types = match env::var("TETHER_SERVER_LINK_BLOCK_GUESTS") {
			Ok(v) => match v.to_lowercase().as_str() {
				"true" | "1" => true,
				"false" | "0" | "" => false,
				other => {
					return Err(LinkError::Configuration(format!(
						"invalid TETHER_SERVER_LINK_BLOCK_GUESTS value: '{other}'"
					)))
				}
			},
			Err(_) => false,
		};

		let authorized_guest_ids = env::var("TETHER_SERVER_LINK_AUTHORIZED_GUEST_IDS")
			.map(|v| parse_id_list(&v))
			.unwrap_or_default();

		let company_name =
			env::var("TETHER_SERVER_LINK_COMPANY_NAME").unwrap_or_else(|_| "Tether".to_string());

		let operations_email = env::var("TETHER_SERVER_LINK_OPS_EMAIL")
			.ok()
			.filter(|s| !s.is_empty());

		Ok(Self {
			policy: GuestPolicyConfig {
				block_guest_user_types,
				authorized_guest_ids,
			},
			company_name,
			operations_email,
		})
	}
}

fn parse_id_list(value: &str) -> HashSet<String> {
	value
		.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_string)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	mod policy {
		use super::*;

		#[test]
		fn disabled_policy_authorizes_nothing() {
			let policy = GuestPolicyConfig::disabled();
			assert!(!policy.block_guest_user_types);
			assert!(!policy.authorizes(&CorporateId::new("aad-0001")));
		}

		#[test]
		fn blocking_policy_authorizes_listed_ids() {
			let policy = GuestPolicyConfig::blocking(["aad-0001", "aad-0002"]);
			assert!(policy.block_guest_user_types);
			assert!(policy.authorizes(&CorporateId::new("aad-0001")));
			assert!(!policy.authorizes(&CorporateId::new("aad-0003")));
		}
	}

	mod id_list {
		use super::*;

		#[test]
		fn parses_comma_separated_ids() {
			let ids = parse_id_list("aad-0001, aad-0002,aad-0003");
			assert_eq!(ids.len(), 3);
			assert!(ids.contains("aad-0002"));
		}

		#[test]
		fn ignores_empty_entries() {
			let ids = parse_id_list(",aad-0001,, ,");
			assert_eq!(ids.len(), 1);
		}

		#[test]
		fn empty_string_is_empty_set() {
			assert!(parse_id_list("").is_empty());
		}
	}
}
