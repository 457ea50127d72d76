// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Failures of an authorization call. A denial is not an error.
#[derive(Debug, Error)]
pub enum AuthorizeError {
	/// The request itself is malformed, e.g. an unknown action or an unowned filter.
	#[error("invalid authorization request: {0}")]
	InvalidRequest(String),

	/// A role-permission or object-grant lookup failed.
	#[error("permission lookup failed: {0}")]
	Lookup(String),
}

pub type Result<T> = std::result::Result<T, AuthorizeError>;
