// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Saved filter service for Sift.
//!
//! [`FilterService`] ties the rule engine, the permission resolver and the
//! SQLite store together: authoring, sharing, listing and applying filters.

pub mod error;
pub mod executor;
pub mod ordering;
pub mod service;
pub mod telemetry;
pub mod validation;

pub use error::{FilterServiceError, Result};
pub use executor::{ExecutorError, PredicateExecutor};
pub use ordering::FilterOrdering;
pub use service::{owner_only_policy, FilterListing, FilterService, FilterUpdate, NewFilter};
pub use telemetry::init_tracing;
pub use validation::{check_structure, validate, StructureError, ValidationErrors};
