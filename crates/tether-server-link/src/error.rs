// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! Error taxonomy for the link lifecycle.
//!
//! Every error that reaches the boundary is rendered into a single
//! user-facing message by [`LinkError::user_message`]; the full cause chain
//! stays on the error value for logs and support tickets.

use thiserror::Error;

use tether_server_db::DbError;
use tether_server_directory::DirectoryError;

pub type Result<T> = std::result::Result<T, LinkError>;

/// Errors from the guest gate.
#[derive(Debug, Error)]
pub enum GateError {
	/// Gating is enabled but no directory client is available. Fatal and
	/// operator-visible: the gate must never be silently skipped.
	#[error("guest gating is enabled but no directory client is configured")]
	Configuration,

	/// The directory lookup failed; the link attempt must not proceed.
	#[error("directory lookup failed: {0}")]
	Lookup(#[from] DirectoryError),
}

/// Errors from the link lifecycle.
#[derive(Debug, Error)]
pub enum LinkError {
	/// User input was malformed (e.g. a bad service-account email).
	/// User-correctable; nothing was written.
	#[error("{0}")]
	Validation(String),

	/// The acting corporate identity is a guest and not authorized to link.
	#[error("linking blocked for guest account {user_principal_name}")]
	PolicyBlocked {
		display_name: String,
		user_principal_name: String,
	},

	/// The system is misconfigured (e.g. gating enabled without a
	/// directory). Never retried automatically.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// The directory lookup failed. Transient failures are not retried
	/// here; retry policy belongs to the caller.
	#[error("directory lookup failed: {0}")]
	DirectoryLookup(#[from] DirectoryError),

	/// A store write failed. When the recovery update also failed,
	/// `original` carries the insert error that triggered the recovery so
	/// both failures stay observable.
	#[error("{message}")]
	Persistence {
		message: String,
		#[source]
		source: DbError,
		original: Option<DbError>,
	},
}

impl From<GateError> for LinkError {
	fn from(err: GateError) -> Self {
		match err {
			GateError::Configuration => LinkError::Configuration(err.to_string()),
			GateError::Lookup(e) => LinkError::DirectoryLookup(e),
		}
	}
}

impl LinkError {
	/// The single user-facing message for this error.
	pub fn user_message(&self) -> String {
		match self {
			LinkError::Validation(message) => message.clone(),
			LinkError::PolicyBlocked {
				display_name,
				user_principal_name,
			} => format!(
				"This system is not available to guests. You are currently signed in as \
				 {display_name} {user_principal_name}. Please sign out or try a private \
				 browser window."
			),
			LinkError::Configuration(_) | LinkError::DirectoryLookup(_) => {
				"We could not verify your corporate account right now. Please try again later."
					.to_string()
			}
			LinkError::Persistence { message, .. } => message.clone(),
		}
	}

	/// True when correcting the request input can resolve the error.
	pub fn is_user_correctable(&self) -> bool {
		matches!(self, LinkError::Validation(_))
	}
}
