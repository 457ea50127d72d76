// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sift_server_auth::AuthorizeError;

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
}

impl DbError {
	/// Maps a unique-constraint violation to [`DbError::Conflict`].
	pub(crate) fn from_write(err: sqlx::Error, what: impl FnOnce() -> String) -> Self {
		match &err {
			sqlx::Error::Database(db) if db.is_unique_violation() => DbError::Conflict(what()),
			_ => DbError::Sqlx(err),
		}
	}
}

impl From<DbError> for AuthorizeError {
	fn from(err: DbError) -> Self {
		AuthorizeError::Lookup(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, DbError>;
