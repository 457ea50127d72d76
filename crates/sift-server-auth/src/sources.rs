// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lookups the resolver depends on.
//!
//! Both are read-only and queried fresh on every call. The `Static*` types
//! hold their data in memory; `sift-server-db` provides SQLite-backed ones.

use async_trait::async_trait;
use std::collections::HashSet;

use sift_filters_core::{FilterAction, FilterId, Grant, ModelId, Principal};

use crate::error::Result;
use crate::types::Actor;

/// Model-level permissions held by a user or any of its groups.
#[async_trait]
pub trait RolePermissions: Send + Sync {
	async fn has_permission(&self, actor: &Actor, model: &ModelId, action: FilterAction)
		-> Result<bool>;
}

/// Per-filter grants for users and groups.
#[async_trait]
pub trait ObjectGrants: Send + Sync {
	/// True when a grant exists for the actor's user id or one of its groups.
	async fn permits(&self, filter_id: FilterId, actor: &Actor, action: FilterAction)
		-> Result<bool>;
}

/// Used when object-level grants are disabled: role permission alone suffices.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObjectGrants;

#[async_trait]
impl ObjectGrants for NoObjectGrants {
	async fn permits(&self, _: FilterId, _: &Actor, _: FilterAction) -> Result<bool> {
		Ok(true)
	}
}

/// In-memory role permissions.
#[derive(Debug, Clone, Default)]
pub struct StaticRolePermissions {
	entries: HashSet<(Principal, ModelId, FilterAction)>,
}

impl StaticRolePermissions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder: grant `action` on every filter of `model` to `principal`.
	pub fn with(mut self, principal: Principal, model: impl Into<ModelId>, action: FilterAction) -> Self {
		self.entries.insert((principal, model.into(), action));
		self
	}
}

#[async_trait]
impl RolePermissions for StaticRolePermissions {
	async fn has_permission(
		&self,
		actor: &Actor,
		model: &ModelId,
		action: FilterAction,
	) -> Result<bool> {
		Ok(actor
			.principals()
			.into_iter()
			.any(|p| self.entries.contains(&(p, model.clone(), action))))
	}
}

/// In-memory object grants.
#[derive(Debug, Clone, Default)]
pub struct StaticObjectGrants {
	grants: HashSet<Grant>,
}

impl StaticObjectGrants {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder: add a grant.
	pub fn with(mut self, grant: Grant) -> Self {
		self.grants.insert(grant);
		self
	}
}

#[async_trait]
impl ObjectGrants for StaticObjectGrants {
	async fn permits(&self, filter_id: FilterId, actor: &Actor, action: FilterAction) -> Result<bool> {
		Ok(actor.principals().into_iter().any(|principal| {
			self.grants.contains(&Grant {
				filter_id,
				principal,
				action,
			})
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sift_filters_core::{GroupId, UserId};

	#[tokio::test]
	async fn role_permission_via_group() {
		let group = GroupId::generate();
		let roles = StaticRolePermissions::new().with(
			Principal::Group(group),
			"core.ticket",
			FilterAction::View,
		);
		let member = Actor::new(UserId::generate()).with_groups([group]);
		let model = ModelId::from("core.ticket");

		assert!(roles.has_permission(&member, &model, FilterAction::View).await.unwrap());
		assert!(!roles.has_permission(&member, &model, FilterAction::Change).await.unwrap());
		assert!(!roles
			.has_permission(&Actor::new(UserId::generate()), &model, FilterAction::View)
			.await
			.unwrap());
	}

	#[tokio::test]
	async fn grant_matches_user_or_group() {
		let filter_id = FilterId::generate();
		let user = UserId::generate();
		let group = GroupId::generate();
		let grants = StaticObjectGrants::new()
			.with(Grant {
				filter_id,
				principal: Principal::User(user),
				action: FilterAction::View,
			})
			.with(Grant {
				filter_id,
				principal: Principal::Group(group),
				action: FilterAction::Change,
			});

		let actor = Actor::new(user);
		assert!(grants.permits(filter_id, &actor, FilterAction::View).await.unwrap());
		assert!(!grants.permits(filter_id, &actor, FilterAction::Change).await.unwrap());

		let member = Actor::new(UserId::generate()).with_groups([group]);
		assert!(grants.permits(filter_id, &member, FilterAction::Change).await.unwrap());
		assert!(!grants
			.permits(FilterId::generate(), &member, FilterAction::Change)
			.await
			.unwrap());
	}

	#[test]
	fn no_object_grants_imposes_nothing() {
		let actor = Actor::new(UserId::generate());
		let permitted = tokio_test::block_on(NoObjectGrants.permits(
			FilterId::generate(),
			&actor,
			FilterAction::Delete,
		))
		.unwrap();
		assert!(permitted);
	}
}
