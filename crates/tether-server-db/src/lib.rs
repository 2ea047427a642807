// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! Link record persistence for Tether.
//!
//! The store is the sole arbiter of the one-link-per-external-account
//! invariant: `links.external_account_id` is the primary key, and a
//! unique-constraint violation on insert surfaces as [`DbError::Conflict`]
//! so the link service can run its recovery update instead of failing.

pub mod error;
pub mod link;
pub mod pool;
pub mod testing;

pub use error::{DbError, Result};
pub use link::{LinkStore, SqliteLinkStore};
pub use pool::create_pool;
