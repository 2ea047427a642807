// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! The persisted link record and the per-request inputs it is built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{CorporateId, ExternalAccountId};

/// The durable association between one external account and one corporate
/// identity.
///
/// At most one record exists per [`ExternalAccountId`] at any time. The store
/// enforces this with a unique key; the link service compensates for races
/// with a recovery update. Records are created on first successful link and
/// mutated by re-link or recovery flows; this core never deletes them
/// (unlinking is owned by a separate collaborator).
///
/// # PII Handling
///
/// `corporate_display_name`, `corporate_principal_name`, and
/// `service_account_contact_email` are personally identifiable and should be
/// redacted from logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
	/// The external platform account id. Immutable key of the link.
	pub external_account_id: ExternalAccountId,

	/// The external platform login at the time of linking.
	pub external_account_login: String,

	/// The corporate directory object id.
	pub corporate_id: CorporateId,

	/// The corporate user principal name (sign-in name).
	pub corporate_principal_name: String,

	/// The corporate display name.
	pub corporate_display_name: String,

	/// Whether this link represents a non-human automation identity.
	pub is_service_account: bool,

	/// Maintainer contact address. Present iff `is_service_account`.
	pub service_account_contact_email: Option<String>,

	/// Provenance marker: the record was migrated from the legacy system
	/// rather than created through this portal.
	pub imported_from_legacy: bool,

	/// When the link was first created.
	pub created_at: DateTime<Utc>,

	/// When the link was last written.
	pub updated_at: DateTime<Utc>,
}

impl LinkRecord {
	/// Build a record from the request context and per-request input.
	///
	/// Timestamps are set to now; re-link flows overwrite `updated_at` on
	/// write while the store preserves the original `created_at`.
	pub fn from_parts(ctx: &LinkContext, request: &LinkRequest) -> Self {
		let now = Utc::now();
		LinkRecord {
			external_account_id: ctx.external.id.clone(),
			external_account_login: ctx.external.login.clone(),
			corporate_id: ctx.corporate.id.clone(),
			corporate_principal_name: ctx.corporate.principal_name.clone(),
			corporate_display_name: ctx.corporate.display_name.clone(),
			is_service_account: request.is_service_account,
			service_account_contact_email: if request.is_service_account {
				request.service_account_mail.clone()
			} else {
				None
			},
			imported_from_legacy: false,
			created_at: now,
			updated_at: now,
		}
	}
}

/// The external platform side of a link request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAccount {
	/// Account id on the external platform.
	pub id: ExternalAccountId,
	/// Login name on the external platform.
	pub login: String,
}

/// The corporate identity claim carried by an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporateClaim {
	/// Directory object id.
	pub id: CorporateId,
	/// User principal name from the session.
	pub principal_name: String,
	/// Display name from the session.
	pub display_name: String,
}

/// Explicit per-request context for all link operations.
///
/// Both identities are resolved by the caller (authentication is a
/// precondition); the core never reads ambient session state. The guest
/// gate's principal-name override is applied here, via
/// [`LinkContext::with_principal_name`], before a record is built.
#[derive(Debug, Clone)]
pub struct LinkContext {
	/// The external account being linked.
	pub external: ExternalAccount,
	/// The acting corporate identity.
	pub corporate: CorporateClaim,
	/// Correlation id threaded through events and mail for support lookups.
	pub correlation_id: Uuid,
}

impl LinkContext {
	/// Create a context with a fresh correlation id.
	pub fn new(external: ExternalAccount, corporate: CorporateClaim) -> Self {
		LinkContext {
			external,
			corporate,
			correlation_id: Uuid::new_v4(),
		}
	}

	/// Return a copy with the corporate principal name replaced.
	///
	/// Used when the guest gate authorizes a specific guest and hands back
	/// the directory's canonical principal name for the rest of the request.
	pub fn with_principal_name(mut self, principal_name: impl Into<String>) -> Self {
		self.corporate.principal_name = principal_name.into();
		self
	}
}

/// Per-request input to the link lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
	/// The link represents an automation identity.
	pub is_service_account: bool,

	/// Maintainer contact for a service account. Must be a valid mailbox
	/// when `is_service_account` is set; validated before any store access.
	pub service_account_mail: Option<String>,

	/// Where to send the one-time welcome mail. Empty means skip.
	pub linked_account_mail: Option<String>,
}
