// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;

use crate::error::DbError;

use std::time::Duration;

/// Create a SqlitePool for the link store.
///
/// WAL mode with a busy timeout: link writes are short single-row
/// transactions, and concurrent linking attempts for different accounts
/// must not fail on writer contention.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./tether.db")
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid or connection fails.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.busy_timeout(Duration::from_secs(5))
		.foreign_keys(true)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("link store pool created");
	Ok(pool)
}
