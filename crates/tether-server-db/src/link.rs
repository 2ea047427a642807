// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! The link store: one row per external account, keyed by the external
//! account id.
//!
//! `insert_link` maps a unique-key violation to [`DbError::Conflict`] so the
//! link service can distinguish "already linked" (recoverable via update)
//! from a hard persistence failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};

use tether_link_core::{CorporateId, ExternalAccountId, LinkRecord};

use crate::error::DbError;

/// Persistence contract for link records.
///
/// `delete_link` and `list_links` exist for the unlink and reporting
/// collaborators; the link lifecycle itself only inserts, updates, and reads.
#[async_trait]
pub trait LinkStore: Send + Sync {
	async fn insert_link(&self, record: &LinkRecord) -> Result<(), DbError>;
	async fn update_link(&self, record: &LinkRecord) -> Result<(), DbError>;
	async fn get_link(&self, id: &ExternalAccountId) -> Result<Option<LinkRecord>, DbError>;
	async fn delete_link(&self, id: &ExternalAccountId) -> Result<(), DbError>;
	async fn list_links(&self, limit: u32, offset: u32) -> Result<Vec<LinkRecord>, DbError>;
}

/// SQLite-backed link store.
#[derive(Clone)]
pub struct SqliteLinkStore {
	pool: SqlitePool,
}

impl SqliteLinkStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl LinkStore for SqliteLinkStore {
	#[tracing::instrument(
		skip(self, record),
		fields(external_account_id = %record.external_account_id, login = %record.external_account_login)
	)]
	async fn insert_link(&self, record: &LinkRecord) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO links (
				external_account_id, external_account_login,
				corporate_id, corporate_principal_name, corporate_display_name,
				is_service_account, service_account_contact_email,
				imported_from_legacy, created_at, updated_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(record.external_account_id.as_str())
		.bind(&record.external_account_login)
		.bind(record.corporate_id.as_str())
		.bind(&record.corporate_principal_name)
		.bind(&record.corporate_display_name)
		.bind(record.is_service_account)
		.bind(&record.service_account_contact_email)
		.bind(record.imported_from_legacy)
		.bind(record.created_at.to_rfc3339())
		.bind(record.updated_at.to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => DbError::Conflict(
				format!(
					"link already exists for external account {}",
					record.external_account_id
				),
			),
			_ => DbError::Sqlx(e),
		})?;

		Ok(())
	}

	#[tracing::instrument(
		skip(self, record),
		fields(external_account_id = %record.external_account_id)
	)]
	async fn update_link(&self, record: &LinkRecord) -> Result<(), DbError> {
		// created_at is deliberately not touched; the original link time
		// survives re-links and recovery updates.
		let result = sqlx::query(
			r#"
			UPDATE links
			SET external_account_login = ?,
				corporate_id = ?,
				corporate_principal_name = ?,
				corporate_display_name = ?,
				is_service_account = ?,
				service_account_contact_email = ?,
				updated_at = ?
			WHERE external_account_id = ?
			"#,
		)
		.bind(&record.external_account_login)
		.bind(record.corporate_id.as_str())
		.bind(&record.corporate_principal_name)
		.bind(&record.corporate_display_name)
		.bind(record.is_service_account)
		.bind(&record.service_account_contact_email)
		.bind(Utc::now().to_rfc3339())
		.bind(record.external_account_id.as_str())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!(
				"no link for external account {}",
				record.external_account_id
			)));
		}

		Ok(())
	}

	#[tracing::instrument(skip(self), fields(external_account_id = %id))]
	async fn get_link(&self, id: &ExternalAccountId) -> Result<Option<LinkRecord>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT external_account_id, external_account_login,
				corporate_id, corporate_principal_name, corporate_display_name,
				is_service_account, service_account_contact_email,
				imported_from_legacy, created_at, updated_at
			FROM links
			WHERE external_account_id = ?
			"#,
		)
		.bind(id.as_str())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_link(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(external_account_id = %id))]
	async fn delete_link(&self, id: &ExternalAccountId) -> Result<(), DbError> {
		let result = sqlx::query("DELETE FROM links WHERE external_account_id = ?")
			.bind(id.as_str())
			.execute(&self.pool)
			.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!(
				"no link for external account {id}"
			)));
		}

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	async fn list_links(&self, limit: u32, offset: u32) -> Result<Vec<LinkRecord>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT external_account_id, external_account_login,
				corporate_id, corporate_principal_name, corporate_display_name,
				is_service_account, service_account_contact_email,
				imported_from_legacy, created_at, updated_at
			FROM links
			ORDER BY created_at ASC
			LIMIT ? OFFSET ?
			"#,
		)
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_link).collect()
	}
}

fn row_to_link(row: &sqlx::sqlite::SqliteRow) -> Result<LinkRecord, DbError> {
	let created_at: String = row.try_get("created_at")?;
	let updated_at: String = row.try_get("updated_at")?;

	Ok(LinkRecord {
		external_account_id: ExternalAccountId::new(row.try_get::<String, _>("external_account_id")?),
		external_account_login: row.try_get("external_account_login")?,
		corporate_id: CorporateId::new(row.try_get::<String, _>("corporate_id")?),
		corporate_principal_name: row.try_get("corporate_principal_name")?,
		corporate_display_name: row.try_get("corporate_display_name")?,
		is_service_account: row.try_get("is_service_account")?,
		service_account_contact_email: row.try_get("service_account_contact_email")?,
		imported_from_legacy: row.try_get("imported_from_legacy")?,
		created_at: parse_timestamp(&created_at)?,
		updated_at: parse_timestamp(&updated_at)?,
	})
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid timestamp '{value}': {e}")))
}
