// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Helpers for tests that need a migrated database.

use sqlx::sqlite::SqlitePool;

use crate::migrations::run_migrations;
use crate::pool::create_pool;

/// A migrated, single-connection in-memory database.
pub async fn create_test_pool() -> SqlitePool {
	let pool = create_pool("sqlite::memory:").await.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}
