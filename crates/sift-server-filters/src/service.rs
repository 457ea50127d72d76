// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Filter service: every operation on saved filters goes through here.
//!
//! Each operation loads the filter, asks the [`PermissionResolver`] for the
//! needed action and only then touches the store. Rules are validated before
//! they are persisted and compiled again from the stored snapshot when a
//! filter is applied.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sift_filters_core::{
	field_data, ChoiceOption, FieldCatalog, FieldCategory, FieldData, Filter, FilterAction,
	FilterId, Grant, ModelId, OperatorCatalog, OperatorDef, Principal, Record, Rule, RuleEngine,
	RuleInputs,
};
use sift_server_auth::{Access, Actor, AuthorizeError, FilterAttrs, OwnerOnlyPolicy, PermissionResolver};
use sift_server_config::{FiltersConfig, ServerConfig};
use sift_server_db::{
	create_pool, run_migrations, FilterRepository, FilterStore, RolePermissionRepository,
};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{FilterServiceError, Result};
use crate::executor::PredicateExecutor;
use crate::ordering::FilterOrdering;
use crate::validation::validate;

/// Input for [`FilterService::create`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFilter {
	pub model: ModelId,
	pub name: Option<String>,
	pub description: Option<String>,
	pub rules: Vec<Rule>,
	#[serde(default)]
	pub ephemeral: bool,
}

/// Replacement attributes for [`FilterService::update`]. The model and owner
/// of a filter never change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterUpdate {
	pub name: Option<String>,
	pub description: Option<String>,
	pub rules: Vec<Rule>,
	#[serde(default)]
	pub ephemeral: bool,
}

/// One entry of a filter listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterListing {
	pub filter: Filter,
	/// Marked with a trailing ` *` when the filter belongs to someone else.
	pub display_name: String,
	pub owned_by_actor: bool,
}

impl FilterListing {
	fn new(filter: Filter, actor: &Actor) -> Self {
		let owned_by_actor = filter.is_owned_by(actor.user_id);
		let mut display_name = filter.display_name();
		if !owned_by_actor {
			display_name.push_str(" *");
		}
		Self {
			filter,
			display_name,
			owned_by_actor,
		}
	}
}

#[derive(Clone)]
pub struct FilterService {
	store: Arc<dyn FilterStore>,
	resolver: PermissionResolver,
	fields: Arc<dyn FieldCatalog>,
	engine: RuleEngine<'static>,
	ordering: FilterOrdering,
}

impl FilterService {
	pub fn new(
		store: Arc<dyn FilterStore>,
		resolver: PermissionResolver,
		fields: Arc<dyn FieldCatalog>,
	) -> Self {
		OperatorCatalog::init();
		Self {
			store,
			resolver,
			fields,
			engine: RuleEngine::default(),
			ordering: FilterOrdering::default(),
		}
	}

	/// Wires the SQLite repositories and the configured policy together.
	pub fn from_config(
		config: &FiltersConfig,
		pool: SqlitePool,
		fields: Arc<dyn FieldCatalog>,
	) -> Self {
		let filters = Arc::new(FilterRepository::new(pool.clone()));
		let roles = Arc::new(RolePermissionRepository::new(pool));

		let mut resolver = PermissionResolver::new(owner_only_policy(config), roles);
		if config.object_grants {
			resolver = resolver.with_object_grants(filters.clone());
		}

		info!(
			object_grants = config.object_grants,
			order_by = ?config.order_by,
			"filter service configured"
		);
		Self::new(filters, resolver, fields).with_ordering(FilterOrdering::new(config.order_by.clone()))
	}

	/// Opens the configured database, applies the schema and builds the
	/// service from the `filters` section.
	///
	/// # Errors
	/// `Storage` when the database cannot be opened or migrated.
	#[instrument(skip(config, fields), fields(database = %config.database.url))]
	pub async fn connect(config: &ServerConfig, fields: Arc<dyn FieldCatalog>) -> Result<Self> {
		let pool = create_pool(&config.database.url).await?;
		run_migrations(&pool).await?;
		Ok(Self::from_config(&config.filters, pool, fields))
	}

	/// Builder: set the listing order.
	pub fn with_ordering(mut self, ordering: FilterOrdering) -> Self {
		self.ordering = ordering;
		self
	}

	/// Builder: compile against a different operator catalog.
	pub fn with_operators(mut self, operators: &'static OperatorCatalog) -> Self {
		self.engine = RuleEngine::new(operators);
		self
	}

	pub fn resolver(&self) -> &PermissionResolver {
		&self.resolver
	}

	/// Saves a new filter owned by `actor`.
	///
	/// # Errors
	/// `CreateForbidden` when the actor has no access to the model,
	/// `Validation` when the rules are malformed and `Conflict` when the actor
	/// already has a filter with this name for the model.
	#[instrument(skip(self, actor, input), fields(user_id = %actor.user_id, model = %input.model))]
	pub async fn create(&self, actor: &Actor, input: NewFilter) -> Result<Filter> {
		if !self.resolver.can_create(actor, &input.model).await? {
			return Err(FilterServiceError::CreateForbidden(input.model.to_string()));
		}
		validate(&self.engine, &input.model, &input.rules, self.fields.as_ref())?;

		let mut filter = Filter::new(input.model, actor.user_id).with_rules(input.rules);
		filter.name = normalize(input.name);
		filter.description = normalize(input.description);
		filter.ephemeral = input.ephemeral;

		self.store.create_filter(&filter).await?;
		info!(filter_id = %filter.id, "filter created");
		Ok(filter)
	}

	#[instrument(skip(self, actor), fields(user_id = %actor.user_id, filter_id = %id))]
	pub async fn get(&self, actor: &Actor, id: FilterId) -> Result<Filter> {
		let filter = self.load(id).await?;
		self.require(actor, FilterAction::View, &filter).await?;
		Ok(filter)
	}

	/// Replaces the name, description, ephemeral flag and rules in one write.
	#[instrument(skip(self, actor, update), fields(user_id = %actor.user_id, filter_id = %id))]
	pub async fn update(&self, actor: &Actor, id: FilterId, update: FilterUpdate) -> Result<Filter> {
		let mut filter = self.load(id).await?;
		self.require(actor, FilterAction::Change, &filter).await?;
		validate(&self.engine, &filter.model, &update.rules, self.fields.as_ref())?;

		filter.name = normalize(update.name);
		filter.description = normalize(update.description);
		filter.ephemeral = update.ephemeral;
		filter.rules = update.rules;
		filter.updated_at = Utc::now();

		self.store.update_filter(&filter).await?;
		info!("filter updated");
		Ok(filter)
	}

	#[instrument(skip(self, actor), fields(user_id = %actor.user_id, filter_id = %id))]
	pub async fn delete(&self, actor: &Actor, id: FilterId) -> Result<()> {
		let filter = self.load(id).await?;
		self.require(actor, FilterAction::Delete, &filter).await?;
		if !self.store.delete_filter(&id).await? {
			return Err(FilterServiceError::NotFound(id));
		}
		info!("filter deleted");
		Ok(())
	}

	/// Filters for `model` the actor may view, in the configured order.
	/// Filters without an owner are never listed.
	#[instrument(skip(self, actor), fields(user_id = %actor.user_id, model = %model))]
	pub async fn list_for_actor(&self, actor: &Actor, model: &ModelId) -> Result<Vec<FilterListing>> {
		let mut visible = Vec::new();
		for filter in self.store.list_filters(model).await? {
			match self
				.resolver
				.authorize(actor, FilterAction::View, &FilterAttrs::from(&filter))
				.await
			{
				Ok(Access::Allow) => visible.push(filter),
				Ok(Access::Deny) => {}
				Err(AuthorizeError::InvalidRequest(reason)) => {
					debug!(filter_id = %filter.id, %reason, "skipping filter");
				}
				Err(err) => return Err(err.into()),
			}
		}

		self.ordering.sort(&mut visible);
		debug!(count = visible.len(), "filters listed");
		Ok(visible
			.into_iter()
			.map(|filter| FilterListing::new(filter, actor))
			.collect())
	}

	/// Runs a saved filter against `model` using `executor`.
	///
	/// The rules are compiled from the stored snapshot. An ephemeral filter
	/// applied by its owner is deleted afterwards.
	#[instrument(skip(self, actor, executor), fields(user_id = %actor.user_id, filter_id = %id, model = %model))]
	pub async fn apply(
		&self,
		actor: &Actor,
		id: FilterId,
		model: &ModelId,
		executor: &dyn PredicateExecutor,
	) -> Result<Vec<Record>> {
		let filter = self.load(id).await?;
		self.require(actor, FilterAction::View, &filter).await?;
		if &filter.model != model {
			return Err(FilterServiceError::InvalidRequest(format!(
				"filter {} targets {}, not {}",
				filter.id, filter.model, model
			)));
		}

		let predicate = self
			.engine
			.compile(&filter.model, &filter.rules, self.fields.as_ref())
			.map_err(|errors| FilterServiceError::Validation(errors.into()))?;
		let records = executor.execute(model, &predicate).await?;
		debug!(groups = predicate.groups.len(), matched = records.len(), "filter applied");

		if filter.ephemeral && filter.is_owned_by(actor.user_id) {
			self.store.delete_filter(&filter.id).await?;
			info!("ephemeral filter discarded");
		}
		Ok(records)
	}

	/// Records an object grant. Requires change access to the filter.
	#[instrument(skip(self, actor), fields(user_id = %actor.user_id, filter_id = %id, principal = %principal, action = %action))]
	pub async fn grant(
		&self,
		actor: &Actor,
		id: FilterId,
		principal: Principal,
		action: FilterAction,
	) -> Result<Grant> {
		let filter = self.load(id).await?;
		self.require(actor, FilterAction::Change, &filter).await?;
		let grant = Grant {
			filter_id: id,
			principal,
			action,
		};
		self.store.add_grant(&grant).await?;
		Ok(grant)
	}

	/// Removes an object grant. Returns `false` if it was not recorded.
	#[instrument(skip(self, actor), fields(user_id = %actor.user_id, filter_id = %id, principal = %principal, action = %action))]
	pub async fn revoke(
		&self,
		actor: &Actor,
		id: FilterId,
		principal: Principal,
		action: FilterAction,
	) -> Result<bool> {
		let filter = self.load(id).await?;
		self.require(actor, FilterAction::Change, &filter).await?;
		Ok(self
			.store
			.remove_grant(&Grant {
				filter_id: id,
				principal,
				action,
			})
			.await?)
	}

	pub async fn grants(&self, actor: &Actor, id: FilterId) -> Result<Vec<Grant>> {
		let filter = self.load(id).await?;
		self.require(actor, FilterAction::Change, &filter).await?;
		Ok(self.store.list_grants(&id).await?)
	}

	/// Whether `actor` may change `filter`. Unowned filters read as `false`.
	pub async fn can_change(&self, actor: &Actor, filter: &Filter) -> Result<bool> {
		match self
			.resolver
			.authorize(actor, FilterAction::Change, &FilterAttrs::from(filter))
			.await
		{
			Ok(access) => Ok(access.is_allowed()),
			Err(AuthorizeError::InvalidRequest(_)) => Ok(false),
			Err(err) => Err(err.into()),
		}
	}

	pub fn operators_for(&self, category: FieldCategory) -> Result<Vec<OperatorDef>> {
		Ok(self.engine.operators().operators_for(category)?.to_vec())
	}

	pub fn values_for(&self, model: &ModelId, field: &str) -> Result<Option<Vec<ChoiceOption>>> {
		self
			.fields
			.values_for(model, field)
			.map_err(|e| FilterServiceError::Field(e.into()))
	}

	pub fn field_data(&self, model: &ModelId) -> Result<FieldData> {
		Ok(field_data(model, self.fields.as_ref(), self.engine.operators())?)
	}

	/// Editor state for a rule row once `selection` is chosen.
	pub fn rule_inputs(&self, model: &ModelId, selection: &str) -> Result<RuleInputs> {
		Ok(RuleInputs::for_selection(
			model,
			selection,
			self.fields.as_ref(),
			self.engine.operators(),
		)?)
	}

	async fn load(&self, id: FilterId) -> Result<Filter> {
		self
			.store
			.get_filter(&id)
			.await?
			.ok_or(FilterServiceError::NotFound(id))
	}

	async fn require(&self, actor: &Actor, action: FilterAction, filter: &Filter) -> Result<()> {
		match self
			.resolver
			.authorize(actor, action, &FilterAttrs::from(filter))
			.await?
		{
			Access::Allow => Ok(()),
			Access::Deny => Err(FilterServiceError::Forbidden {
				action,
				filter_id: filter.id,
			}),
		}
	}
}

pub fn owner_only_policy(config: &FiltersConfig) -> OwnerOnlyPolicy {
	OwnerOnlyPolicy {
		view: config.view_owner_only,
		change: config.change_owner_only,
		delete: config.delete_owner_only,
	}
}

fn normalize(text: Option<String>) -> Option<String> {
	text.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn policy_follows_config_flags() {
		let config = FiltersConfig {
			view_owner_only: false,
			delete_owner_only: false,
			..FiltersConfig::default()
		};
		assert_eq!(
			owner_only_policy(&config),
			OwnerOnlyPolicy {
				view: false,
				change: true,
				delete: false,
			}
		);
	}

	#[test]
	fn blank_text_is_dropped() {
		assert_eq!(normalize(Some("  ".to_string())), None);
		assert_eq!(normalize(Some("Open".to_string())), Some("Open".to_string()));
		assert_eq!(normalize(None), None);
	}
}
