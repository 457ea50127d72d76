// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod database;
mod filters;
mod logging;

pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use filters::{FiltersConfig, FiltersConfigLayer, OrderField, OrderKey};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
