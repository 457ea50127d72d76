// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{
	SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;

use crate::error::DbError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the filter database.
///
/// File databases use WAL so listings can read while a filter is rewritten.
/// An in-memory URL gets a single connection, otherwise every connection
/// would see its own empty database.
///
/// # Errors
/// `DbError::Internal` if the URL is invalid, `DbError::Sqlx` if connecting fails.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	let in_memory = is_in_memory(database_url);
	let mut options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("invalid database URL: {e}")))?
		.foreign_keys(true)
		.busy_timeout(BUSY_TIMEOUT);
	if !in_memory {
		options = options
			.journal_mode(SqliteJournalMode::Wal)
			.synchronous(SqliteSynchronous::Normal)
			.create_if_missing(true);
	}

	let mut pool_options = SqlitePoolOptions::new();
	if in_memory {
		pool_options = pool_options.max_connections(1);
	}
	let pool = pool_options.connect_with(options).await?;

	tracing::debug!(in_memory, "database pool created");
	Ok(pool)
}

fn is_in_memory(database_url: &str) -> bool {
	database_url.contains(":memory:") || database_url.contains("mode=memory")
}
