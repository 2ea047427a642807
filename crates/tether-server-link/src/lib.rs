// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! The link lifecycle for Tether.
//!
//! Linking associates an authenticated external platform account with the
//! acting corporate identity. The flow is:
//!
//! 1. [`GuestGate`] decides whether the corporate identity may link at all
//!    (guest accounts are blocked unless specifically authorized).
//! 2. [`LinkService::create`] builds the record and inserts it. An insert
//!    conflict means the account is already linked (the legacy-upgrade
//!    case); the service recovers with a retroactive update instead of
//!    failing the user.
//! 3. After the durable write: the domain link event fires, the welcome
//!    mail is dispatched fire-and-forget, and (on the update paths) the
//!    cached link view is invalidated before the operation is declared
//!    complete.
//!
//! The store is the sole arbiter of the one-link-per-account invariant;
//! the insert-then-recover sequence is a compensating action, not a
//! transaction.

pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod gate;
pub mod mail;
pub mod service;

pub use cache::{CacheError, LinkCacheInvalidator, NoopLinkCache};
pub use config::{GuestPolicyConfig, LinkConfig};
pub use error::{GateError, LinkError, Result};
pub use event::{LinkEvent, LinkEventSink, TracingLinkEvents};
pub use gate::{GuestDecision, GuestGate};
pub use mail::{build_welcome_mail, WelcomeMailer};
pub use service::{link_account, LinkOutcome, LinkService};
