// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl DbError {
	/// True when the error is the unique-key conflict the link service
	/// recovers from with a retroactive update.
	pub fn is_conflict(&self) -> bool {
		matches!(self, DbError::Conflict(_))
	}
}

pub type Result<T> = std::result::Result<T, DbError>;
