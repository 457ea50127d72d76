// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for saved filters, their grants and role permissions.

pub mod error;
pub mod filter;
pub mod migrations;
pub mod permission;
pub mod pool;
pub mod testing;

pub use error::{DbError, Result};
pub use filter::{FilterRepository, FilterStore};
pub use migrations::run_migrations;
pub use permission::RolePermissionRepository;
pub use pool::create_pool;
