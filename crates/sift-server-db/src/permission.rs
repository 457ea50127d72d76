// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Model-level role permissions.

use async_trait::async_trait;
use sift_filters_core::{FilterAction, ModelId, Principal};
use sift_server_auth::{Actor, AuthorizeError, RolePermissions};
use sqlx::sqlite::SqlitePool;
use sqlx::Sqlite;

use crate::error::DbError;
use crate::filter::push_principal_match;

#[derive(Clone)]
pub struct RolePermissionRepository {
	pool: SqlitePool,
}

impl RolePermissionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Give a user or group `action` on every filter of `model`. Idempotent.
	#[tracing::instrument(skip(self), fields(principal = %principal, model = %model, action = %action))]
	pub async fn grant_permission(
		&self,
		principal: Principal,
		model: &ModelId,
		action: FilterAction,
	) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT OR IGNORE INTO role_permissions (principal_type, principal_id, model, action)
			VALUES (?, ?, ?, ?)
			"#,
		)
		.bind(principal.kind())
		.bind(principal.id().to_string())
		.bind(model.as_str())
		.bind(action.as_str())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	/// # Returns
	/// `false` if the permission was not held.
	#[tracing::instrument(skip(self), fields(principal = %principal, model = %model, action = %action))]
	pub async fn revoke_permission(
		&self,
		principal: Principal,
		model: &ModelId,
		action: FilterAction,
	) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM role_permissions
			WHERE principal_type = ? AND principal_id = ? AND model = ? AND action = ?
			"#,
		)
		.bind(principal.kind())
		.bind(principal.id().to_string())
		.bind(model.as_str())
		.bind(action.as_str())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Whether the actor's user id or any of its groups holds the permission.
	#[tracing::instrument(skip(self, actor), fields(user_id = %actor.user_id, model = %model, action = %action))]
	pub async fn has_permission(
		&self,
		actor: &Actor,
		model: &ModelId,
		action: FilterAction,
	) -> Result<bool, DbError> {
		let mut query = sqlx::QueryBuilder::<Sqlite>::new(
			"SELECT COUNT(*) FROM role_permissions WHERE model = ",
		);
		query.push_bind(model.as_str().to_string());
		query.push(" AND action = ");
		query.push_bind(action.as_str());
		push_principal_match(&mut query, actor);

		let count: i64 = query.build_query_scalar().fetch_one(&self.pool).await?;
		Ok(count > 0)
	}
}

#[async_trait]
impl RolePermissions for RolePermissionRepository {
	async fn has_permission(
		&self,
		actor: &Actor,
		model: &ModelId,
		action: FilterAction,
	) -> Result<bool, AuthorizeError> {
		Ok(RolePermissionRepository::has_permission(self, actor, model, action).await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;
	use sift_filters_core::{GroupId, UserId};

	fn ticket() -> ModelId {
		ModelId::from("core.ticket")
	}

	#[tokio::test]
	async fn user_permission_is_scoped_to_model_and_action() {
		let repo = RolePermissionRepository::new(create_test_pool().await);
		let user = UserId::generate();
		repo
			.grant_permission(Principal::User(user), &ticket(), FilterAction::View)
			.await
			.unwrap();

		let actor = Actor::new(user);
		assert!(repo.has_permission(&actor, &ticket(), FilterAction::View).await.unwrap());
		assert!(!repo.has_permission(&actor, &ticket(), FilterAction::Change).await.unwrap());
		assert!(!repo
			.has_permission(&actor, &ModelId::from("core.product"), FilterAction::View)
			.await
			.unwrap());
	}

	#[tokio::test]
	async fn group_permission_applies_to_members() {
		let repo = RolePermissionRepository::new(create_test_pool().await);
		let group = GroupId::generate();
		repo
			.grant_permission(Principal::Group(group), &ticket(), FilterAction::Delete)
			.await
			.unwrap();

		let member = Actor::new(UserId::generate()).with_groups([group]);
		let outsider = Actor::new(UserId::generate()).with_groups([GroupId::generate()]);
		assert!(RolePermissions::has_permission(&repo, &member, &ticket(), FilterAction::Delete)
			.await
			.unwrap());
		assert!(!RolePermissions::has_permission(&repo, &outsider, &ticket(), FilterAction::Delete)
			.await
			.unwrap());
	}

	#[tokio::test]
	async fn revoke_is_reported() {
		let repo = RolePermissionRepository::new(create_test_pool().await);
		let principal = Principal::User(UserId::generate());
		repo
			.grant_permission(principal, &ticket(), FilterAction::Change)
			.await
			.unwrap();
		repo
			.grant_permission(principal, &ticket(), FilterAction::Change)
			.await
			.unwrap();

		assert!(repo
			.revoke_permission(principal, &ticket(), FilterAction::Change)
			.await
			.unwrap());
		assert!(!repo
			.revoke_permission(principal, &ticket(), FilterAction::Change)
			.await
			.unwrap());
	}
}
