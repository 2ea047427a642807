// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! Domain types for corporate identity links.
//!
//! A *link* is the durable association between one external developer-platform
//! account (e.g. a source-hosting identity) and one corporate directory
//! identity. This crate defines the persisted record, the per-request inputs,
//! and the explicit request context the rest of the system operates on.
//!
//! This crate is pure data: no I/O, no policy. Policy (guest gating) and the
//! link lifecycle live in `tether-server-link`; persistence lives in
//! `tether-server-db`.

pub mod record;
pub mod types;

pub use record::{CorporateClaim, ExternalAccount, LinkContext, LinkRecord, LinkRequest};
pub use types::{CorporateId, ExternalAccountId};
