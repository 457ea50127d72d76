// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization for saved Sift filters.
//!
//! [`PermissionResolver::authorize`] combines ownership, the process-wide
//! [`OwnerOnlyPolicy`], model-level [`RolePermissions`] and optional
//! per-filter [`ObjectGrants`] into an [`Access`] decision.

pub mod error;
pub mod policy;
pub mod resolver;
pub mod sources;
pub mod types;

pub use error::{AuthorizeError, Result};
pub use policy::Layer;
pub use resolver::PermissionResolver;
pub use sources::{
	NoObjectGrants, ObjectGrants, RolePermissions, StaticObjectGrants, StaticRolePermissions,
};
pub use types::{Access, Actor, Decision, FilterAttrs, OwnerOnlyPolicy};
