// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for filter service operations.

use sift_filters_core::{FilterAction, FilterId, RuleError};
use sift_server_auth::AuthorizeError;
use sift_server_db::DbError;
use thiserror::Error;

use crate::executor::ExecutorError;
use crate::validation::ValidationErrors;

/// Result type for filter service operations.
pub type Result<T> = std::result::Result<T, FilterServiceError>;

#[derive(Debug, Error)]
pub enum FilterServiceError {
	/// The rule sequence is malformed or has invalid rules.
	#[error("invalid filter: {0}")]
	Validation(#[from] ValidationErrors),

	/// A field-catalog lookup for the editor surface failed.
	#[error("invalid field: {0}")]
	Field(#[from] RuleError),

	#[error("not permitted to {action} filter {filter_id}")]
	Forbidden {
		action: FilterAction,
		filter_id: FilterId,
	},

	#[error("not permitted to create filters for {0}")]
	CreateForbidden(String),

	#[error("filter not found: {0}")]
	NotFound(FilterId),

	#[error("invalid request: {0}")]
	InvalidRequest(String),

	#[error("conflict: {0}")]
	Conflict(String),

	#[error("permission lookup failed: {0}")]
	PermissionLookup(String),

	#[error("storage error: {0}")]
	Storage(DbError),

	#[error("execution failed: {0}")]
	Execution(#[from] ExecutorError),
}

impl From<DbError> for FilterServiceError {
	fn from(err: DbError) -> Self {
		match err {
			DbError::Conflict(message) => FilterServiceError::Conflict(message),
			other => FilterServiceError::Storage(other),
		}
	}
}

impl From<AuthorizeError> for FilterServiceError {
	fn from(err: AuthorizeError) -> Self {
		match err {
			AuthorizeError::InvalidRequest(message) => FilterServiceError::InvalidRequest(message),
			AuthorizeError::Lookup(message) => FilterServiceError::PermissionLookup(message),
		}
	}
}
