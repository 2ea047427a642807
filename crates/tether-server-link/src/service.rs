// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! The link lifecycle state machine.
//!
//! `NoLink → Creating → Linked` on first link; `Linked → Updating → Linked`
//! on re-link. Creation compensates for an insert conflict (a record
//! already exists for the external account, the legacy-upgrade case) with a
//! retroactive update using the same derived record; the outcome of that
//! recovery is externally indistinguishable from a fresh link.
//!
//! Ordering guarantee: the domain event and the welcome mail are triggered
//! only after the store write they describe has durably succeeded.

use std::sync::Arc;

use tether_link_core::{ExternalAccountId, LinkContext, LinkRecord, LinkRequest};
use tether_server_db::LinkStore;
use tether_server_smtp::is_valid_email;

use crate::cache::LinkCacheInvalidator;
use crate::config::LinkConfig;
use crate::error::{LinkError, Result};
use crate::event::{LinkEvent, LinkEventSink};
use crate::gate::{GuestDecision, GuestGate};
use crate::mail::{build_welcome_mail, WelcomeMailer};

/// How a link operation concluded.
///
/// `Recovered` is reported for observability only; callers treat it
/// exactly like `Created`.
#[derive(Debug, Clone)]
pub enum LinkOutcome {
	/// A fresh link was inserted.
	Created(LinkRecord),

	/// Insert hit an existing record and the recovery update won.
	Recovered(LinkRecord),

	/// An explicit re-link updated the record.
	Updated(LinkRecord),
}

impl LinkOutcome {
	/// The record as written.
	pub fn record(&self) -> &LinkRecord {
		match self {
			LinkOutcome::Created(record)
			| LinkOutcome::Recovered(record)
			| LinkOutcome::Updated(record) => record,
		}
	}

	/// True for both creation paths (fresh insert and conflict recovery).
	pub fn is_created(&self) -> bool {
		matches!(self, LinkOutcome::Created(_) | LinkOutcome::Recovered(_))
	}
}

/// Creates and updates links, firing downstream effects in order.
pub struct LinkService {
	store: Arc<dyn LinkStore>,
	events: Arc<dyn LinkEventSink>,
	cache: Arc<dyn LinkCacheInvalidator>,
	mailer: Option<Arc<dyn WelcomeMailer>>,
	config: LinkConfig,
}

impl LinkService {
	pub fn new(
		store: Arc<dyn LinkStore>,
		events: Arc<dyn LinkEventSink>,
		cache: Arc<dyn LinkCacheInvalidator>,
		mailer: Option<Arc<dyn WelcomeMailer>>,
		config: LinkConfig,
	) -> Self {
		Self {
			store,
			events,
			cache,
			mailer,
			config,
		}
	}

	/// Create a link for the request context.
	///
	/// Preconditions: the external account is authenticated and the
	/// corporate claim is resolved; the guest gate has already allowed the
	/// request (see [`link_account`] for the combined flow).
	///
	/// # Errors
	///
	/// - [`LinkError::Validation`] for a bad service-account contact
	///   address, before any store access.
	/// - [`LinkError::Persistence`] when the insert fails for a reason
	///   other than a conflict, or when the conflict-recovery update fails
	///   too (then carrying both errors).
	#[tracing::instrument(
		skip(self, ctx, request),
		fields(
			external_account_id = %ctx.external.id,
			corporate_id = %ctx.corporate.id,
			service_account = request.is_service_account,
			correlation_id = %ctx.correlation_id,
		)
	)]
	pub async fn create(&self, ctx: &LinkContext, request: &LinkRequest) -> Result<LinkOutcome> {
		validate_request(request)?;

		let record = LinkRecord::from_parts(ctx, request);

		tracing::info!("link creation started");

		match self.store.insert_link(&record).await {
			Ok(()) => {
				self.finish_link(ctx, request, &record);
				Ok(LinkOutcome::Created(record))
			}
			Err(insert_err) if insert_err.is_conflict() => {
				// Legacy upgrade scenario: the account reached the creation
				// flow while already linked. Retroactive upsert instead of
				// failing the user.
				tracing::warn!(
					error = %insert_err,
					"insert found an existing link, attempting recovery update"
				);

				match self.store.update_link(&record).await {
					Ok(()) => {
						self.invalidate_cache(&record.external_account_id).await;
						self.finish_link(ctx, request, &record);
						Ok(LinkOutcome::Recovered(record))
					}
					Err(update_err) => {
						tracing::error!(
							insert_error = %insert_err,
							update_error = %update_err,
							"recovery update failed after insert conflict"
						);
						Err(LinkError::Persistence {
							message: "We had trouble storing the corporate identity link \
							          information after 2 tries. Please file this issue and we \
							          will have an administrator take a look."
								.to_string(),
							source: update_err,
							original: Some(insert_err),
						})
					}
				}
			}
			Err(insert_err) => {
				tracing::error!(error = %insert_err, "link insert failed");
				Err(LinkError::Persistence {
					message: format!(
						"We had trouble linking your corporate and platform accounts: {insert_err}"
					),
					source: insert_err,
					original: None,
				})
			}
		}
	}

	/// Update the link for the request context (explicit re-link).
	///
	/// The cached link view is invalidated before the update is declared
	/// complete; callers redirect immediately afterwards.
	#[tracing::instrument(
		skip(self, ctx, request),
		fields(
			external_account_id = %ctx.external.id,
			corporate_id = %ctx.corporate.id,
			correlation_id = %ctx.correlation_id,
		)
	)]
	pub async fn update(&self, ctx: &LinkContext, request: &LinkRequest) -> Result<LinkOutcome> {
		validate_request(request)?;

		let record = LinkRecord::from_parts(ctx, request);

		self.store.update_link(&record).await.map_err(|e| {
			tracing::error!(error = %e, "link update failed");
			LinkError::Persistence {
				message: format!("We had trouble updating the link using the data store: {e}"),
				source: e,
				original: None,
			}
		})?;

		self.invalidate_cache(&record.external_account_id).await;

		Ok(LinkOutcome::Updated(record))
	}

	/// Fire the downstream effects of a durably written link: the domain
	/// event, then the welcome mail dispatch.
	fn finish_link(&self, ctx: &LinkContext, request: &LinkRequest, record: &LinkRecord) {
		let event = LinkEvent::from_record(record, ctx.correlation_id);
		self.events.fire_link_event(&event);
		self.dispatch_welcome_mail(ctx, request, record);
	}

	/// Dispatch the welcome mail fire-and-forget.
	///
	/// Silently skipped without a configured transport or recipient. The
	/// spawned task owns the outcome; failures are logged, never surfaced.
	fn dispatch_welcome_mail(&self, ctx: &LinkContext, request: &LinkRequest, record: &LinkRecord) {
		let Some(mailer) = self.mailer.clone() else {
			tracing::debug!("no mail transport configured, skipping welcome mail");
			return;
		};
		let Some(recipient) = request
			.linked_account_mail
			.clone()
			.filter(|m| !m.is_empty())
		else {
			tracing::debug!("no recipient address, skipping welcome mail");
			return;
		};

		let mail = build_welcome_mail(&self.config, record, &recipient, ctx.correlation_id);

		tokio::spawn(async move {
			match mailer.send(&mail).await {
				Ok(receipt) => {
					tracing::info!(response = %receipt.response, "welcome mail sent");
				}
				Err(e) => {
					tracing::warn!(error = %e, "welcome mail failed");
				}
			}
		});
	}

	/// Await cache invalidation; log and move on if it fails. The durable
	/// write already succeeded.
	async fn invalidate_cache(&self, id: &ExternalAccountId) {
		if let Err(e) = self.cache.invalidate_link(id).await {
			tracing::warn!(error = %e, external_account_id = %id, "link cache invalidation failed");
		}
	}
}

/// Validate per-request input before any store access.
fn validate_request(request: &LinkRequest) -> Result<()> {
	if request.is_service_account {
		let valid = request
			.service_account_mail
			.as_deref()
			.is_some_and(is_valid_email);
		if !valid {
			return Err(LinkError::Validation(
				"Please enter a valid e-mail address for the service account maintainer."
					.to_string(),
			));
		}
	}
	Ok(())
}

/// The combined linking flow: gate first, then create.
///
/// A blocked gate decision surfaces as [`LinkError::PolicyBlocked`] and
/// [`LinkService::create`] is never invoked. An authorized-guest override
/// replaces the context's principal name before the record is built.
pub async fn link_account(
	gate: &GuestGate,
	service: &LinkService,
	ctx: LinkContext,
	request: &LinkRequest,
) -> Result<LinkOutcome> {
	let ctx = match gate.evaluate(&ctx.corporate.id).await? {
		GuestDecision::Allowed => ctx,
		GuestDecision::AllowedViaOverride {
			user_principal_name,
		} => ctx.with_principal_name(user_principal_name),
		GuestDecision::Blocked {
			display_name,
			user_principal_name,
		} => {
			return Err(LinkError::PolicyBlocked {
				display_name,
				user_principal_name,
			})
		}
	};

	service.create(&ctx, request).await
}
