// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The permission resolver.
//!
//! Layers are evaluated in a fixed order and the first one that decides wins:
//!
//! 1. **Superuser**: allow
//! 2. **Owner**: allow, whatever the owner-only flags say
//! 3. **Owner-only flag** for the action: deny non-owners
//! 4. **Role permission** on the filter's model: deny when missing
//! 5. **Object grant** for the filter: allow when present, otherwise deny
//!
//! With grants disabled the resolver is built with [`NoObjectGrants`], so
//! step 5 always allows and step 4 alone decides.

use std::str::FromStr;
use std::sync::Arc;

use sift_filters_core::{FilterAction, ModelId};
use tracing::{debug, instrument};

use crate::error::{AuthorizeError, Result};
use crate::policy::{
	check_grant, check_owner_only, check_ownership, check_role, check_superuser, Layer,
};
use crate::sources::{NoObjectGrants, ObjectGrants, RolePermissions};
use crate::types::{Access, Actor, FilterAttrs, OwnerOnlyPolicy};

/// Decides whether an actor may view, change or delete a saved filter.
#[derive(Clone)]
pub struct PermissionResolver {
	policy: OwnerOnlyPolicy,
	roles: Arc<dyn RolePermissions>,
	grants: Arc<dyn ObjectGrants>,
}

impl PermissionResolver {
	/// Creates a resolver with object grants disabled.
	pub fn new(policy: OwnerOnlyPolicy, roles: Arc<dyn RolePermissions>) -> Self {
		Self {
			policy,
			roles,
			grants: Arc::new(NoObjectGrants),
		}
	}

	/// Builder: require an object grant after the role check.
	pub fn with_object_grants(mut self, grants: Arc<dyn ObjectGrants>) -> Self {
		self.grants = grants;
		self
	}

	pub fn policy(&self) -> &OwnerOnlyPolicy {
		&self.policy
	}

	/// Authorizes `action` on `filter` for `actor`.
	///
	/// # Errors
	/// [`AuthorizeError::InvalidRequest`] when the filter has no owner, and
	/// [`AuthorizeError::Lookup`] when a permission source fails.
	#[instrument(
		level = "debug",
		skip(self, actor, filter),
		fields(user_id = %actor.user_id, filter_id = %filter.filter_id, action = %action)
	)]
	pub async fn authorize(
		&self,
		actor: &Actor,
		action: FilterAction,
		filter: &FilterAttrs,
	) -> Result<Access> {
		let owner = filter.owner.ok_or_else(|| {
			AuthorizeError::InvalidRequest(format!("filter {} has no owner", filter.filter_id))
		})?;

		let static_layers = [
			(Layer::Superuser, check_superuser(actor)),
			(Layer::Owner, check_ownership(actor, owner)),
			(Layer::OwnerOnly, check_owner_only(&self.policy, action)),
		];
		for (layer, decision) in static_layers {
			if let Some(access) = decision.settle() {
				return Ok(decided(layer, access));
			}
		}

		let has_role = self
			.roles
			.has_permission(actor, &filter.model, action)
			.await?;
		if let Some(access) = check_role(has_role).settle() {
			return Ok(decided(Layer::Role, access));
		}

		let granted = self
			.grants
			.permits(filter.filter_id, actor, action)
			.await?;
		let access = check_grant(granted).settle().unwrap_or(Access::Deny);
		Ok(decided(Layer::Grant, access))
	}

	/// Like [`authorize`](Self::authorize) for an action given by name.
	pub async fn authorize_action(
		&self,
		actor: &Actor,
		action: &str,
		filter: &FilterAttrs,
	) -> Result<Access> {
		let action = FilterAction::from_str(action)
			.map_err(|e| AuthorizeError::InvalidRequest(e.to_string()))?;
		self.authorize(actor, action, filter).await
	}

	/// Whether `actor` may author filters for `model`: superusers, or holders
	/// of the view or change permission on it.
	#[instrument(level = "debug", skip(self, actor), fields(user_id = %actor.user_id, model = %model))]
	pub async fn can_create(&self, actor: &Actor, model: &ModelId) -> Result<bool> {
		if actor.is_superuser {
			return Ok(true);
		}
		for action in [FilterAction::View, FilterAction::Change] {
			if self.roles.has_permission(actor, model, action).await? {
				return Ok(true);
			}
		}
		debug!("actor cannot access model");
		Ok(false)
	}
}

fn decided(layer: Layer, access: Access) -> Access {
	debug!(layer = layer.as_str(), access = ?access, "authorization decided");
	access
}
