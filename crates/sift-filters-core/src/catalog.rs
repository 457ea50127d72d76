// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Field catalog: which fields of a data model can be filtered on.
//!
//! The host application owns model introspection. The rule engine only talks
//! to it through the [`FieldCatalog`] trait. [`StaticFieldCatalog`] is a
//! schema-backed implementation for hosts that describe their models up front.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::CatalogError;
use crate::types::ModelId;

/// Separator between steps of a relation-qualified field path.
pub const PATH_SEPARATOR: char = '.';

/// The category of a field, which determines its operators and value coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
	Text,
	Number,
	Date,
	Boolean,
	Choice,
	Uuid,
	Relation,
}

impl FieldCategory {
	pub fn all() -> &'static [FieldCategory] {
		&[
			FieldCategory::Text,
			FieldCategory::Number,
			FieldCategory::Date,
			FieldCategory::Boolean,
			FieldCategory::Choice,
			FieldCategory::Uuid,
			FieldCategory::Relation,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			FieldCategory::Text => "text",
			FieldCategory::Number => "number",
			FieldCategory::Date => "date",
			FieldCategory::Boolean => "boolean",
			FieldCategory::Choice => "choice",
			FieldCategory::Uuid => "uuid",
			FieldCategory::Relation => "relation",
		}
	}
}

impl fmt::Display for FieldCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One entry of a bounded-choice field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
	pub key: String,
	pub label: String,
}

impl ChoiceOption {
	pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			label: label.into(),
		}
	}
}

/// A filterable field as listed for a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
	pub path: String,
	pub category: FieldCategory,
	pub label: String,
}

/// One traversal step of a resolved field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
	/// The model the step's field lives on.
	pub model: ModelId,
	pub field: String,
}

/// A field path resolved against the catalog, step by step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
	pub path: String,
	pub steps: Vec<PathStep>,
	pub category: FieldCategory,
	pub label: String,
	pub choices: Vec<ChoiceOption>,
}

impl ResolvedField {
	/// Relation steps that must be traversed before reaching the leaf field.
	pub fn relations(&self) -> &[PathStep] {
		&self.steps[..self.steps.len().saturating_sub(1)]
	}

	/// The final step holding the compared value. `None` when a catalog
	/// resolved the path without any steps.
	pub fn leaf(&self) -> Option<&PathStep> {
		self.steps.last()
	}
}

/// Field introspection consumed by the rule engine and the rule editor.
pub trait FieldCatalog: Send + Sync {
	/// Lists the filterable fields of a model in display order.
	fn fields_for(&self, model: &ModelId) -> Result<Vec<FieldDescriptor>, CatalogError>;

	/// Resolves a field path, validating every relation step independently.
	fn resolve(&self, model: &ModelId, path: &str) -> Result<ResolvedField, CatalogError>;

	/// Returns the enumerated choices of a bounded-choice field.
	fn values_for(
		&self,
		model: &ModelId,
		path: &str,
	) -> Result<Option<Vec<ChoiceOption>>, CatalogError> {
		let field = self.resolve(model, path)?;
		if field.choices.is_empty() {
			Ok(None)
		} else {
			Ok(Some(field.choices))
		}
	}
}

// =============================================================================
// Static schema-backed catalog
// =============================================================================

/// Declaration of a single field on a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
	pub name: String,
	pub label: String,
	pub category: FieldCategory,
	pub choices: Vec<ChoiceOption>,
	/// Target model for relation fields.
	pub target: Option<ModelId>,
}

impl FieldDef {
	pub fn new(name: impl Into<String>, category: FieldCategory) -> Self {
		let name = name.into();
		Self {
			label: title_case(&name),
			name,
			category,
			choices: Vec::new(),
			target: None,
		}
	}

	pub fn text(name: impl Into<String>) -> Self {
		Self::new(name, FieldCategory::Text)
	}

	pub fn number(name: impl Into<String>) -> Self {
		Self::new(name, FieldCategory::Number)
	}

	pub fn date(name: impl Into<String>) -> Self {
		Self::new(name, FieldCategory::Date)
	}

	pub fn boolean(name: impl Into<String>) -> Self {
		Self::new(name, FieldCategory::Boolean)
	}

	pub fn uuid(name: impl Into<String>) -> Self {
		Self::new(name, FieldCategory::Uuid)
	}

	pub fn choice<K, L>(name: impl Into<String>, choices: impl IntoIterator<Item = (K, L)>) -> Self
	where
		K: Into<String>,
		L: Into<String>,
	{
		let mut field = Self::new(name, FieldCategory::Choice);
		field.choices = choices
			.into_iter()
			.map(|(key, label)| ChoiceOption::new(key, label))
			.collect();
		field
	}

	pub fn relation(name: impl Into<String>, target: impl Into<ModelId>) -> Self {
		let mut field = Self::new(name, FieldCategory::Relation);
		field.target = Some(target.into());
		field
	}

	/// Builder: set the display label.
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}
}

/// Fields of one model, plus which paths are exposed for filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSchema {
	pub model: ModelId,
	fields: Vec<FieldDef>,
	/// Exposed paths with an optional label override.
	exposed: Vec<(String, Option<String>)>,
}

impl ModelSchema {
	pub fn new(model: impl Into<ModelId>) -> Self {
		Self {
			model: model.into(),
			fields: Vec::new(),
			exposed: Vec::new(),
		}
	}

	/// Builder: declare a field and expose it for filtering.
	pub fn field(mut self, field: FieldDef) -> Self {
		self.exposed.push((field.name.clone(), None));
		self.fields.push(field);
		self
	}

	/// Builder: declare a field that is only reachable as a traversal step.
	pub fn hidden_field(mut self, field: FieldDef) -> Self {
		self.fields.push(field);
		self
	}

	/// Builder: expose a relation-qualified path under a custom label.
	pub fn expose(mut self, path: impl Into<String>, label: impl Into<String>) -> Self {
		self.exposed.push((path.into(), Some(label.into())));
		self
	}

	pub fn get(&self, name: &str) -> Option<&FieldDef> {
		self.fields.iter().find(|f| f.name == name)
	}

	fn is_exposed(&self, path: &str) -> bool {
		self.exposed.iter().any(|(p, _)| p == path)
	}

	fn label_override(&self, path: &str) -> Option<&str> {
		self
			.exposed
			.iter()
			.find(|(p, _)| p == path)
			.and_then(|(_, label)| label.as_deref())
	}
}

/// In-memory [`FieldCatalog`] built from [`ModelSchema`] declarations.
#[derive(Debug, Clone, Default)]
pub struct StaticFieldCatalog {
	models: HashMap<ModelId, ModelSchema>,
}

impl StaticFieldCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder: register a model schema.
	pub fn with_model(mut self, schema: ModelSchema) -> Self {
		self.models.insert(schema.model.clone(), schema);
		self
	}

	/// Walks `path` from `model` without checking exposure.
	fn walk(&self, model: &ModelId, path: &str) -> Result<(Vec<PathStep>, &FieldDef), CatalogError> {
		let unknown = |segment: &str| CatalogError::UnknownField {
			path: path.to_string(),
			segment: segment.to_string(),
		};

		let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
		let mut current = model.clone();
		let mut steps = Vec::with_capacity(segments.len());

		for (i, segment) in segments.iter().copied().enumerate() {
			let schema = self.models.get(&current).ok_or_else(|| unknown(segment))?;
			let field = schema.get(segment).ok_or_else(|| unknown(segment))?;
			steps.push(PathStep {
				model: current.clone(),
				field: field.name.clone(),
			});

			if i + 1 == segments.len() {
				return Ok((steps, field));
			}

			// Only relations can be traversed; the next segment cannot exist otherwise.
			current = match (&field.category, &field.target) {
				(FieldCategory::Relation, Some(target)) => target.clone(),
				_ => return Err(unknown(segments[i + 1])),
			};
		}

		Err(unknown(path))
	}
}

impl FieldCatalog for StaticFieldCatalog {
	fn fields_for(&self, model: &ModelId) -> Result<Vec<FieldDescriptor>, CatalogError> {
		let schema = self
			.models
			.get(model)
			.ok_or_else(|| CatalogError::UnknownModel(model.clone()))?;

		schema
			.exposed
			.iter()
			.map(|(path, _)| -> Result<FieldDescriptor, CatalogError> {
				let field = self.resolve(model, path)?;
				Ok(FieldDescriptor {
					path: field.path,
					category: field.category,
					label: field.label,
				})
			})
			.collect()
	}

	fn resolve(&self, model: &ModelId, path: &str) -> Result<ResolvedField, CatalogError> {
		let (steps, field) = self.walk(model, path)?;

		// `walk` succeeded, so the root schema exists.
		let schema = &self.models[model];
		if !schema.is_exposed(path) {
			return Err(CatalogError::UnknownField {
				path: path.to_string(),
				segment: path.to_string(),
			});
		}

		let label = schema
			.label_override(path)
			.map(str::to_string)
			.unwrap_or_else(|| field.label.clone());

		Ok(ResolvedField {
			path: path.to_string(),
			steps,
			category: field.category,
			label,
			choices: field.choices.clone(),
		})
	}
}

fn title_case(name: &str) -> String {
	name
		.split(['_', ' '])
		.filter(|w| !w.is_empty())
		.map(|word| {
			let mut chars = word.chars();
			match chars.next() {
				Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn catalog() -> StaticFieldCatalog {
		StaticFieldCatalog::new()
			.with_model(
				ModelSchema::new("core.ticket")
					.field(FieldDef::text("title"))
					.field(FieldDef::choice("status", [("open", "Open"), ("closed", "Closed")]))
					.field(FieldDef::relation("owner", "auth.user"))
					.expose("owner.username", "Owner Username")
					.expose("owner.department.name", "Owner Department"),
			)
			.with_model(
				ModelSchema::new("auth.user")
					.field(FieldDef::text("username"))
					.field(FieldDef::boolean("is_active")),
			)
	}

	#[test]
	fn resolves_direct_field() {
		let field = catalog()
			.resolve(&ModelId::from("core.ticket"), "title")
			.unwrap();
		assert_eq!(field.category, FieldCategory::Text);
		assert_eq!(field.label, "Title");
		assert_eq!(field.steps.len(), 1);
		assert!(field.relations().is_empty());
	}

	#[test]
	fn resolves_relation_path_with_label_override() {
		let field = catalog()
			.resolve(&ModelId::from("core.ticket"), "owner.username")
			.unwrap();
		assert_eq!(field.category, FieldCategory::Text);
		assert_eq!(field.label, "Owner Username");
		assert_eq!(field.relations().len(), 1);
		assert_eq!(field.relations()[0].field, "owner");
		assert_eq!(field.leaf().unwrap().model, ModelId::from("auth.user"));
	}

	#[test]
	fn missing_intermediate_relation_points_at_segment() {
		let err = catalog()
			.resolve(&ModelId::from("core.ticket"), "owner.department.name")
			.unwrap_err();
		assert_eq!(
			err,
			CatalogError::UnknownField {
				path: "owner.department.name".to_string(),
				segment: "department".to_string(),
			}
		);
	}

	#[test]
	fn traversing_a_non_relation_fails_on_next_segment() {
		let err = catalog()
			.resolve(&ModelId::from("core.ticket"), "title.length")
			.unwrap_err();
		assert!(matches!(err, CatalogError::UnknownField { segment, .. } if segment == "length"));
	}

	#[test]
	fn unexposed_field_is_unknown() {
		let catalog = StaticFieldCatalog::new().with_model(
			ModelSchema::new("auth.user")
				.field(FieldDef::text("username"))
				.hidden_field(FieldDef::text("password")),
		);
		let err = catalog
			.resolve(&ModelId::from("auth.user"), "password")
			.unwrap_err();
		assert!(matches!(err, CatalogError::UnknownField { .. }));
	}

	#[test]
	fn fields_for_unknown_model_fails() {
		let err = catalog()
			.fields_for(&ModelId::from("core.nothing"))
			.unwrap_err();
		assert_eq!(err, CatalogError::UnknownModel(ModelId::from("core.nothing")));
	}

	#[test]
	fn fields_for_fails_when_an_exposed_path_is_broken() {
		// `owner.department.name` is exposed but unresolvable.
		assert!(catalog().fields_for(&ModelId::from("core.ticket")).is_err());
	}

	#[test]
	fn values_for_choice_field() {
		let catalog = catalog();
		let model = ModelId::from("core.ticket");
		let values = catalog.values_for(&model, "status").unwrap().unwrap();
		assert_eq!(values.len(), 2);
		assert_eq!(values[0].key, "open");
		assert!(catalog.values_for(&model, "title").unwrap().is_none());
	}

	#[test]
	fn title_case_splits_on_underscores() {
		assert_eq!(title_case("serial_number"), "Serial Number");
		assert_eq!(title_case("name"), "Name");
	}
}
