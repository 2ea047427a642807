// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! The domain event fired when a link is established.
//!
//! Fire-and-forget: downstream consumers (provisioning, reporting) react to
//! it, but the link flow never waits on them and never fails because of
//! them. The event fires only after the store write it describes has
//! durably succeeded.

use serde::Serialize;
use uuid::Uuid;

use tether_link_core::LinkRecord;

/// Both sides of an established link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkEvent {
	/// External platform account id.
	pub external_account_id: String,

	/// External platform login.
	pub external_account_login: String,

	/// Corporate directory object id.
	pub corporate_id: String,

	/// Corporate principal name.
	pub corporate_principal_name: String,

	/// Corporate display name.
	pub corporate_display_name: String,

	/// Whether the link is a service-account link.
	pub service_account: bool,

	/// Correlation id of the request that created the link.
	pub correlation_id: Uuid,
}

impl LinkEvent {
	/// Build the event from the record that was just written.
	pub fn from_record(record: &LinkRecord, correlation_id: Uuid) -> Self {
		LinkEvent {
			external_account_id: record.external_account_id.to_string(),
			external_account_login: record.external_account_login.clone(),
			corporate_id: record.corporate_id.to_string(),
			corporate_principal_name: record.corporate_principal_name.clone(),
			corporate_display_name: record.corporate_display_name.clone(),
			service_account: record.is_service_account,
			correlation_id,
		}
	}
}

/// Sink for link events.
pub trait LinkEventSink: Send + Sync {
	/// Deliver the event. Must not block and must not fail the caller.
	fn fire_link_event(&self, event: &LinkEvent);
}

/// Default sink: emits the event as a structured tracing event.
pub struct TracingLinkEvents;

impl LinkEventSink for TracingLinkEvents {
	fn fire_link_event(&self, event: &LinkEvent) {
		tracing::info!(
			external_account_id = %event.external_account_id,
			external_account_login = %event.external_account_login,
			corporate_id = %event.corporate_id,
			corporate_principal_name = %event.corporate_principal_name,
			service_account = event.service_account,
			correlation_id = %event.correlation_id,
			"account link established"
		);
	}
}
