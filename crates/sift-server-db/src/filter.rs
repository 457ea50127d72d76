// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Saved filter repository.
//!
//! A filter and its rules are written and read inside one transaction, so a
//! reader never sees a mix of old and new rules.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sift_filters_core::{
	Filter, FilterAction, FilterId, Grant, GroupId, ModelId, Principal, Rule, StoredRule, UserId,
};
use sift_server_auth::{Actor, AuthorizeError, ObjectGrants};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::DbError;

#[async_trait]
pub trait FilterStore: Send + Sync {
	async fn create_filter(&self, filter: &Filter) -> Result<(), DbError>;
	async fn get_filter(&self, id: &FilterId) -> Result<Option<Filter>, DbError>;
	async fn list_filters(&self, model: &ModelId) -> Result<Vec<Filter>, DbError>;
	async fn update_filter(&self, filter: &Filter) -> Result<(), DbError>;
	async fn delete_filter(&self, id: &FilterId) -> Result<bool, DbError>;
	async fn add_grant(&self, grant: &Grant) -> Result<(), DbError>;
	async fn remove_grant(&self, grant: &Grant) -> Result<bool, DbError>;
	async fn list_grants(&self, filter_id: &FilterId) -> Result<Vec<Grant>, DbError>;
}

#[async_trait]
impl FilterStore for FilterRepository {
	async fn create_filter(&self, filter: &Filter) -> Result<(), DbError> {
		self.create_filter(filter).await
	}

	async fn get_filter(&self, id: &FilterId) -> Result<Option<Filter>, DbError> {
		self.get_filter(id).await
	}

	async fn list_filters(&self, model: &ModelId) -> Result<Vec<Filter>, DbError> {
		self.list_filters(model).await
	}

	async fn update_filter(&self, filter: &Filter) -> Result<(), DbError> {
		self.update_filter(filter).await
	}

	async fn delete_filter(&self, id: &FilterId) -> Result<bool, DbError> {
		self.delete_filter(id).await
	}

	async fn add_grant(&self, grant: &Grant) -> Result<(), DbError> {
		self.add_grant(grant).await
	}

	async fn remove_grant(&self, grant: &Grant) -> Result<bool, DbError> {
		self.remove_grant(grant).await
	}

	async fn list_grants(&self, filter_id: &FilterId) -> Result<Vec<Grant>, DbError> {
		self.list_grants(filter_id).await
	}
}

#[async_trait]
impl ObjectGrants for FilterRepository {
	async fn permits(
		&self,
		filter_id: FilterId,
		actor: &Actor,
		action: FilterAction,
	) -> Result<bool, AuthorizeError> {
		Ok(self.has_grant(&filter_id, actor, action).await?)
	}
}

/// Repository for saved filters, their rules and object grants.
#[derive(Clone)]
pub struct FilterRepository {
	pool: SqlitePool,
}

impl FilterRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a filter with its rules.
	///
	/// # Errors
	/// `DbError::Conflict` if the owner already has a filter with this name for the model.
	#[tracing::instrument(skip(self, filter), fields(filter_id = %filter.id, model = %filter.model))]
	pub async fn create_filter(&self, filter: &Filter) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;

		sqlx::query(
			r#"
			INSERT INTO filters (
				id, name, description, model, owner_id, ephemeral, created_at, updated_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(filter.id.to_string())
		.bind(&filter.name)
		.bind(&filter.description)
		.bind(filter.model.as_str())
		.bind(filter.owner.map(|o| o.to_string()))
		.bind(filter.ephemeral)
		.bind(filter.created_at.to_rfc3339())
		.bind(filter.updated_at.to_rfc3339())
		.execute(&mut *tx)
		.await
		.map_err(|e| DbError::from_write(e, || name_conflict(filter)))?;

		insert_rules(&mut tx, &filter.id, &filter.rules).await?;
		tx.commit().await?;

		tracing::debug!(rules = filter.rules.len(), "filter created");
		Ok(())
	}

	/// Load a filter and its rules from one snapshot.
	#[tracing::instrument(skip(self), fields(filter_id = %id))]
	pub async fn get_filter(&self, id: &FilterId) -> Result<Option<Filter>, DbError> {
		let mut tx = self.pool.begin().await?;

		let row = sqlx::query(
			r#"
			SELECT id, name, description, model, owner_id, ephemeral, created_at, updated_at
			FROM filters
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&mut *tx)
		.await?;

		let Some(row) = row else {
			return Ok(None);
		};
		let mut filter = parse_filter_row(&row)?;

		let rule_rows = sqlx::query(
			r#"
			SELECT field, operator, value, negate
			FROM filter_rules
			WHERE filter_id = ?
			ORDER BY position
			"#,
		)
		.bind(id.to_string())
		.fetch_all(&mut *tx)
		.await?;
		tx.commit().await?;

		filter.rules = rule_rows
			.iter()
			.map(parse_rule_row)
			.collect::<Result<_, _>>()?;
		Ok(Some(filter))
	}

	/// All filters for a model with their rules, in no particular order.
	#[tracing::instrument(skip(self), fields(model = %model))]
	pub async fn list_filters(&self, model: &ModelId) -> Result<Vec<Filter>, DbError> {
		let mut tx = self.pool.begin().await?;

		let rows = sqlx::query(
			r#"
			SELECT id, name, description, model, owner_id, ephemeral, created_at, updated_at
			FROM filters
			WHERE model = ?
			"#,
		)
		.bind(model.as_str())
		.fetch_all(&mut *tx)
		.await?;

		let rule_rows = sqlx::query(
			r#"
			SELECT r.filter_id, r.field, r.operator, r.value, r.negate
			FROM filter_rules r
			JOIN filters f ON f.id = r.filter_id
			WHERE f.model = ?
			ORDER BY r.filter_id, r.position
			"#,
		)
		.bind(model.as_str())
		.fetch_all(&mut *tx)
		.await?;
		tx.commit().await?;

		let mut rules: HashMap<String, Vec<Rule>> = HashMap::new();
		for row in &rule_rows {
			let filter_id: String = row.try_get("filter_id")?;
			rules.entry(filter_id).or_default().push(parse_rule_row(row)?);
		}

		rows
			.iter()
			.map(|row| -> Result<Filter, DbError> {
				let mut filter = parse_filter_row(row)?;
				filter.rules = rules.remove(&filter.id.to_string()).unwrap_or_default();
				Ok(filter)
			})
			.collect()
	}

	/// Replace a filter's attributes and its whole rule sequence atomically.
	/// The target model and owner are never changed.
	///
	/// # Errors
	/// `DbError::NotFound` if the filter does not exist.
	#[tracing::instrument(skip(self, filter), fields(filter_id = %filter.id))]
	pub async fn update_filter(&self, filter: &Filter) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;

		let result = sqlx::query(
			r#"
			UPDATE filters
			SET name = ?, description = ?, ephemeral = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&filter.name)
		.bind(&filter.description)
		.bind(filter.ephemeral)
		.bind(filter.updated_at.to_rfc3339())
		.bind(filter.id.to_string())
		.execute(&mut *tx)
		.await
		.map_err(|e| DbError::from_write(e, || name_conflict(filter)))?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("filter {}", filter.id)));
		}

		sqlx::query("DELETE FROM filter_rules WHERE filter_id = ?")
			.bind(filter.id.to_string())
			.execute(&mut *tx)
			.await?;
		insert_rules(&mut tx, &filter.id, &filter.rules).await?;
		tx.commit().await?;

		tracing::debug!(rules = filter.rules.len(), "filter updated");
		Ok(())
	}

	/// Delete a filter together with its rules and grants.
	///
	/// # Returns
	/// `false` if no filter existed with this ID.
	#[tracing::instrument(skip(self), fields(filter_id = %id))]
	pub async fn delete_filter(&self, id: &FilterId) -> Result<bool, DbError> {
		let mut tx = self.pool.begin().await?;
		for table in ["filter_rules", "filter_grants"] {
			sqlx::query(&format!("DELETE FROM {table} WHERE filter_id = ?"))
				.bind(id.to_string())
				.execute(&mut *tx)
				.await?;
		}
		let result = sqlx::query("DELETE FROM filters WHERE id = ?")
			.bind(id.to_string())
			.execute(&mut *tx)
			.await?;
		tx.commit().await?;

		Ok(result.rows_affected() > 0)
	}

	/// Record an object grant. Granting twice is a no-op.
	///
	/// # Errors
	/// `DbError::NotFound` if the filter does not exist.
	#[tracing::instrument(skip(self), fields(filter_id = %grant.filter_id, principal = %grant.principal, action = %grant.action))]
	pub async fn add_grant(&self, grant: &Grant) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			INSERT OR IGNORE INTO filter_grants (filter_id, principal_type, principal_id, action)
			SELECT id, ?, ?, ? FROM filters WHERE id = ?
			"#,
		)
		.bind(grant.principal.kind())
		.bind(grant.principal.id().to_string())
		.bind(grant.action.as_str())
		.bind(grant.filter_id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 && !self.filter_exists(&grant.filter_id).await? {
			return Err(DbError::NotFound(format!("filter {}", grant.filter_id)));
		}
		Ok(())
	}

	/// Remove an object grant.
	///
	/// # Returns
	/// `false` if the grant did not exist.
	#[tracing::instrument(skip(self), fields(filter_id = %grant.filter_id, principal = %grant.principal, action = %grant.action))]
	pub async fn remove_grant(&self, grant: &Grant) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM filter_grants
			WHERE filter_id = ? AND principal_type = ? AND principal_id = ? AND action = ?
			"#,
		)
		.bind(grant.filter_id.to_string())
		.bind(grant.principal.kind())
		.bind(grant.principal.id().to_string())
		.bind(grant.action.as_str())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip(self), fields(filter_id = %filter_id))]
	pub async fn list_grants(&self, filter_id: &FilterId) -> Result<Vec<Grant>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT principal_type, principal_id, action
			FROM filter_grants
			WHERE filter_id = ?
			ORDER BY principal_type, principal_id, action
			"#,
		)
		.bind(filter_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows
			.iter()
			.map(|row| -> Result<Grant, DbError> {
				Ok(Grant {
					filter_id: *filter_id,
					principal: parse_principal(row.try_get("principal_type")?, row.try_get("principal_id")?)?,
					action: parse_action(row.try_get("action")?)?,
				})
			})
			.collect()
	}

	/// Whether a grant exists for the actor's user id or any of its groups.
	#[tracing::instrument(skip(self, actor), fields(filter_id = %filter_id, user_id = %actor.user_id, action = %action))]
	pub async fn has_grant(
		&self,
		filter_id: &FilterId,
		actor: &Actor,
		action: FilterAction,
	) -> Result<bool, DbError> {
		let mut query = sqlx::QueryBuilder::<Sqlite>::new(
			"SELECT COUNT(*) FROM filter_grants WHERE filter_id = ",
		);
		query.push_bind(filter_id.to_string());
		query.push(" AND action = ");
		query.push_bind(action.as_str());
		push_principal_match(&mut query, actor);

		let count: i64 = query.build_query_scalar().fetch_one(&self.pool).await?;
		Ok(count > 0)
	}

	async fn filter_exists(&self, id: &FilterId) -> Result<bool, DbError> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM filters WHERE id = ?")
			.bind(id.to_string())
			.fetch_one(&self.pool)
			.await?;
		Ok(count > 0)
	}
}

/// Appends ` AND (<actor's user> OR <any of its groups>)`.
pub(crate) fn push_principal_match(query: &mut sqlx::QueryBuilder<'_, Sqlite>, actor: &Actor) {
	query.push(" AND ((principal_type = 'user' AND principal_id = ");
	query.push_bind(actor.user_id.to_string());
	query.push(")");
	if !actor.groups.is_empty() {
		query.push(" OR (principal_type = 'group' AND principal_id IN (");
		let mut ids = query.separated(", ");
		for group in &actor.groups {
			ids.push_bind(group.to_string());
		}
		ids.push_unseparated("))");
	}
	query.push(")");
}

async fn insert_rules(
	tx: &mut Transaction<'_, Sqlite>,
	filter_id: &FilterId,
	rules: &[Rule],
) -> Result<(), DbError> {
	for (position, rule) in rules.iter().enumerate() {
		let stored = rule.to_stored();
		sqlx::query(
			r#"
			INSERT INTO filter_rules (filter_id, position, field, operator, value, negate)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(filter_id.to_string())
		.bind(position as i64)
		.bind(stored.field)
		.bind(stored.operator)
		.bind(stored.value)
		.bind(stored.negate)
		.execute(&mut **tx)
		.await?;
	}
	Ok(())
}

fn name_conflict(filter: &Filter) -> String {
	format!(
		"a filter named '{}' already exists for {}",
		filter.name.as_deref().unwrap_or_default(),
		filter.model
	)
}

fn parse_filter_row(row: &SqliteRow) -> Result<Filter, DbError> {
	let owner: Option<String> = row.try_get("owner_id")?;
	Ok(Filter {
		id: FilterId::new(parse_uuid(&row.try_get::<String, _>("id")?)?),
		name: row.try_get("name")?,
		description: row.try_get("description")?,
		model: ModelId::new(row.try_get::<String, _>("model")?),
		owner: owner
			.as_deref()
			.map(parse_uuid)
			.transpose()?
			.map(UserId::new),
		rules: Vec::new(),
		ephemeral: row.try_get("ephemeral")?,
		created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
		updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
	})
}

fn parse_rule_row(row: &SqliteRow) -> Result<Rule, DbError> {
	Ok(Rule::from_stored(StoredRule {
		field: row.try_get("field")?,
		operator: row.try_get("operator")?,
		value: row.try_get("value")?,
		negate: row.try_get("negate")?,
	}))
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DbError> {
	Uuid::parse_str(s).map_err(|e| DbError::Internal(format!("invalid UUID '{s}': {e}")))
}

pub(crate) fn parse_principal(kind: String, id: String) -> Result<Principal, DbError> {
	let id = parse_uuid(&id)?;
	match kind.as_str() {
		"user" => Ok(Principal::User(UserId::new(id))),
		"group" => Ok(Principal::Group(GroupId::new(id))),
		other => Err(DbError::Internal(format!("unknown principal type '{other}'"))),
	}
}

pub(crate) fn parse_action(action: String) -> Result<FilterAction, DbError> {
	action
		.parse()
		.map_err(|e: sift_filters_core::ParseActionError| DbError::Internal(e.to_string()))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(s)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid timestamp '{s}': {e}")))
}
