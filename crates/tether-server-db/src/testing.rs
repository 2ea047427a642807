// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

use sqlx::sqlite::SqlitePool;

pub async fn create_test_pool() -> SqlitePool {
	SqlitePool::connect(":memory:").await.unwrap()
}

pub async fn create_links_table(pool: &SqlitePool) {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS links (
			external_account_id TEXT PRIMARY KEY,
			external_account_login TEXT NOT NULL,
			corporate_id TEXT NOT NULL,
			corporate_principal_name TEXT NOT NULL,
			corporate_display_name TEXT NOT NULL,
			is_service_account INTEGER NOT NULL DEFAULT 0,
			service_account_contact_email TEXT,
			imported_from_legacy INTEGER NOT NULL DEFAULT 0,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();
}
