// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The data store a compiled predicate runs against.

use async_trait::async_trait;
use sift_filters_core::{MemoryStore, ModelId, Predicate, Record};
use thiserror::Error;

/// An opaque failure from the data store.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ExecutorError(pub String);

/// Runs a predicate and returns the distinct matching records.
#[async_trait]
pub trait PredicateExecutor: Send + Sync {
	async fn execute(
		&self,
		model: &ModelId,
		predicate: &Predicate,
	) -> Result<Vec<Record>, ExecutorError>;
}

#[async_trait]
impl PredicateExecutor for MemoryStore {
	async fn execute(
		&self,
		model: &ModelId,
		predicate: &Predicate,
	) -> Result<Vec<Record>, ExecutorError> {
		Ok(self.query(model, predicate))
	}
}
