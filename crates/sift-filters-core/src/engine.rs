// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rule engine: compiles a stored rule sequence into a [`Predicate`].
//!
//! Rules are scanned in order. Each OR marker closes the current group and
//! opens a new one; conditions inside a group are ANDed and groups are ORed.
//! Every invalid rule is reported, not just the first.

use crate::catalog::{FieldCatalog, ResolvedField};
use crate::error::{CompileErrors, RuleError, RuleViolation};
use crate::filter::{Condition, Rule};
use crate::operator::{Operator, OperatorCatalog};
use crate::predicate::{Atom, ConditionGroup, Lookup, Pattern, Predicate};
use crate::types::ModelId;
use crate::value::Value;

/// Compiles rules against a field catalog using one operator catalog.
#[derive(Debug, Clone, Copy)]
pub struct RuleEngine<'a> {
	operators: &'a OperatorCatalog,
}

impl Default for RuleEngine<'static> {
	fn default() -> Self {
		Self::new(OperatorCatalog::standard())
	}
}

impl<'a> RuleEngine<'a> {
	pub fn new(operators: &'a OperatorCatalog) -> Self {
		Self { operators }
	}

	pub fn operators(&self) -> &'a OperatorCatalog {
		self.operators
	}

	/// Compiles `rules` for `model`. An empty sequence yields the match-all predicate.
	pub fn compile(
		&self,
		model: &ModelId,
		rules: &[Rule],
		fields: &dyn FieldCatalog,
	) -> Result<Predicate, CompileErrors> {
		if rules.is_empty() {
			return Ok(Predicate::match_all());
		}

		let mut groups = vec![ConditionGroup::default()];
		let mut violations = Vec::new();

		for (index, rule) in rules.iter().enumerate() {
			match rule {
				Rule::OrGroup => groups.push(ConditionGroup::default()),
				Rule::Condition(condition) => match self.compile_condition(model, condition, fields) {
					Ok(atom) => {
						if let Some(group) = groups.last_mut() {
							group.conditions.push(atom);
						}
					}
					Err(error) => violations.push(RuleViolation { index, error }),
				},
			}
		}

		if violations.is_empty() {
			Ok(Predicate { groups })
		} else {
			Err(CompileErrors { violations })
		}
	}

	/// Validates a single condition: field path, operator, then value.
	pub fn compile_condition(
		&self,
		model: &ModelId,
		condition: &Condition,
		fields: &dyn FieldCatalog,
	) -> Result<Atom, RuleError> {
		let field = fields.resolve(model, &condition.field)?;
		if field.steps.is_empty() {
			return Err(RuleError::UnknownField {
				path: condition.field.clone(),
				segment: condition.field.clone(),
			});
		}
		let operator = self.operators.lookup(field.category, &condition.operator)?;
		let lookup = lookup_for(&field, operator, &condition.value)?;
		Ok(Atom {
			field,
			lookup,
			negate: condition.negate,
		})
	}
}

/// Compiles with the standard operator catalog.
pub fn compile(
	model: &ModelId,
	rules: &[Rule],
	fields: &dyn FieldCatalog,
) -> Result<Predicate, CompileErrors> {
	RuleEngine::default().compile(model, rules, fields)
}

fn lookup_for(field: &ResolvedField, operator: Operator, raw: &str) -> Result<Lookup, RuleError> {
	let invalid = |message: String| RuleError::InvalidValue {
		field: field.path.clone(),
		category: field.category,
		message,
	};

	if !operator.takes_value() {
		return Ok(match operator {
			Operator::IsEmpty => Lookup::IsEmpty,
			Operator::IsTrue => Lookup::IsTrue,
			Operator::IsFalse => Lookup::IsFalse,
			_ => Lookup::IsNull,
		});
	}

	if raw.is_empty() {
		return Err(invalid(format!("operator '{operator}' requires a value")));
	}

	let coerce = || Value::coerce(field.category, raw, &field.choices).map_err(invalid);
	let lookup = match operator {
		Operator::Exact => Lookup::Exact(coerce()?),
		Operator::Lt => Lookup::Lt(coerce()?),
		Operator::Gt => Lookup::Gt(coerce()?),
		Operator::Lte => Lookup::Lte(coerce()?),
		Operator::Gte => Lookup::Gte(coerce()?),
		Operator::IExact => Lookup::IExact(raw.to_string()),
		Operator::Contains => Lookup::Contains(raw.to_string()),
		Operator::IContains => Lookup::IContains(raw.to_string()),
		Operator::Regex | Operator::IRegex => {
			let pattern = Pattern::new(raw, operator == Operator::IRegex)
				.map_err(|e| invalid(format!("invalid regular expression: {e}")))?;
			Lookup::Regex(pattern)
		}
		Operator::IsNull | Operator::IsEmpty | Operator::IsTrue | Operator::IsFalse => {
			Lookup::IsNull
		}
	};
	Ok(lookup)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::{FieldCategory, FieldDef, ModelSchema, StaticFieldCatalog};
	use crate::record::{MemoryStore, Record};
	use proptest::prelude::*;

	fn ticket() -> ModelId {
		ModelId::from("core.ticket")
	}

	fn catalog() -> StaticFieldCatalog {
		StaticFieldCatalog::new()
			.with_model(
				ModelSchema::new("core.ticket")
					.field(FieldDef::text("title"))
					.field(FieldDef::choice("status", [("open", "Open"), ("closed", "Closed")]))
					.field(FieldDef::number("priority"))
					.field(FieldDef::date("due"))
					.field(FieldDef::boolean("urgent"))
					.field(FieldDef::relation("owner", "auth.user"))
					.expose("owner.username", "Owner Username")
					.expose("owner.department.name", "Owner Department"),
			)
			.with_model(ModelSchema::new("auth.user").field(FieldDef::text("username")))
	}

	fn store() -> MemoryStore {
		let rows = [
			("1", "Broken login", "open", 3i64, true),
			("2", "Slow search", "closed", 7, false),
			("3", "Typo on page", "open", 8, false),
			("4", "Crash on save", "closed", 2, true),
		];
		rows
			.into_iter()
			.fold(MemoryStore::new(), |store, (id, title, status, priority, urgent)| {
				store.with_record(
					"core.ticket",
					Record::new(id)
						.with("title", title)
						.with("status", status)
						.with("priority", priority)
						.with("urgent", urgent)
						.with("owner", Record::new(format!("u{id}")).with("username", format!("user{id}"))),
				)
			})
	}

	fn ids(predicate: &Predicate) -> Vec<String> {
		store()
			.query(&ticket(), predicate)
			.into_iter()
			.map(|r| r.id)
			.collect()
	}

	/// A host catalog that resolves every path without traversal steps.
	struct FlatCatalog;

	impl FieldCatalog for FlatCatalog {
		fn fields_for(
			&self,
			_: &ModelId,
		) -> std::result::Result<Vec<crate::catalog::FieldDescriptor>, crate::error::CatalogError> {
			Ok(Vec::new())
		}

		fn resolve(
			&self,
			_: &ModelId,
			path: &str,
		) -> std::result::Result<ResolvedField, crate::error::CatalogError> {
			Ok(ResolvedField {
				path: path.to_string(),
				steps: Vec::new(),
				category: FieldCategory::Text,
				label: path.to_string(),
				choices: Vec::new(),
			})
		}
	}

	#[test]
	fn stepless_resolution_is_unknown_field() {
		let rules = vec![Rule::condition("title", Operator::Contains, "a")];
		let errors = compile(&ticket(), &rules, &FlatCatalog).unwrap_err();
		assert_eq!(
			errors.for_rule(0),
			Some(&RuleError::UnknownField {
				path: "title".to_string(),
				segment: "title".to_string(),
			})
		);
	}

	#[test]
	fn single_condition_matches_choice() {
		let rules = vec![Rule::condition("status", Operator::Exact, "open")];
		let predicate = compile(&ticket(), &rules, &catalog()).unwrap();
		assert_eq!(predicate.groups.len(), 1);
		assert_eq!(ids(&predicate), vec!["1", "3"]);
	}

	#[test]
	fn marker_splits_into_or_groups() {
		let rules = vec![
			Rule::condition("status", Operator::Exact, "open"),
			Rule::OrGroup,
			Rule::condition("priority", Operator::Gt, "5"),
		];
		let predicate = compile(&ticket(), &rules, &catalog()).unwrap();
		assert_eq!(predicate.groups.len(), 2);
		assert_eq!(ids(&predicate), vec!["1", "2", "3"]);
		assert_eq!(predicate.to_string(), "(status exact 'open') OR (priority gt 5)");
	}

	#[test]
	fn conditions_in_a_group_are_anded() {
		let rules = vec![
			Rule::condition("status", Operator::Exact, "open"),
			Rule::condition("priority", Operator::Gt, "5"),
		];
		let predicate = compile(&ticket(), &rules, &catalog()).unwrap();
		assert_eq!(ids(&predicate), vec!["3"]);
	}

	#[test]
	fn empty_rules_match_everything() {
		let predicate = compile(&ticket(), &[], &catalog()).unwrap();
		assert!(predicate.groups.is_empty());
		assert_eq!(ids(&predicate).len(), 4);
	}

	#[test]
	fn negated_condition() {
		let rules = vec![Rule::Condition(
			Condition::new("urgent", Operator::IsTrue, "").negated(),
		)];
		let predicate = compile(&ticket(), &rules, &catalog()).unwrap();
		assert_eq!(ids(&predicate), vec!["2", "3"]);
	}

	#[test]
	fn relation_path_traverses() {
		let rules = vec![Rule::condition("owner.username", Operator::IExact, "USER2")];
		let predicate = compile(&ticket(), &rules, &catalog()).unwrap();
		assert_eq!(ids(&predicate), vec!["2"]);
	}

	#[test]
	fn invalid_intermediate_relation_is_unknown_field() {
		let rules = vec![Rule::condition("owner.department.name", Operator::Contains, "Eng")];
		let errors = compile(&ticket(), &rules, &catalog()).unwrap_err();
		assert_eq!(
			errors.for_rule(0),
			Some(&RuleError::UnknownField {
				path: "owner.department.name".to_string(),
				segment: "department".to_string(),
			})
		);
	}

	#[test]
	fn all_invalid_rules_are_reported() {
		let rules = vec![
			Rule::condition("missing", Operator::Exact, "x"),
			Rule::condition("title", Operator::Exact, "ok"),
			Rule::OrGroup,
			Rule::condition("urgent", Operator::Contains, "x"),
			Rule::condition("priority", Operator::Gt, "high"),
			Rule::condition("due", Operator::Lt, "yesterday"),
			Rule::condition("status", Operator::Exact, "pending"),
			Rule::condition("title", Operator::Regex, "(unclosed"),
		];
		let errors = compile(&ticket(), &rules, &catalog()).unwrap_err();
		let indices: Vec<usize> = errors.violations.iter().map(|v| v.index).collect();
		assert_eq!(indices, vec![0, 3, 4, 5, 6, 7]);
		assert!(matches!(errors.for_rule(0), Some(RuleError::UnknownField { .. })));
		assert!(matches!(errors.for_rule(3), Some(RuleError::InvalidOperator { .. })));
		assert!(matches!(
			errors.for_rule(4),
			Some(RuleError::InvalidValue { category: FieldCategory::Number, .. })
		));
		assert!(matches!(errors.for_rule(5), Some(RuleError::InvalidValue { .. })));
		assert!(matches!(errors.for_rule(6), Some(RuleError::InvalidValue { .. })));
		assert!(matches!(errors.for_rule(7), Some(RuleError::InvalidValue { .. })));
	}

	#[test]
	fn unregistered_operator_key_is_invalid() {
		let rules = vec![Rule::Condition(Condition {
			field: "title".to_string(),
			operator: "startswith".to_string(),
			value: "a".to_string(),
			negate: false,
		})];
		let errors = compile(&ticket(), &rules, &catalog()).unwrap_err();
		assert!(matches!(errors.for_rule(0), Some(RuleError::InvalidOperator { .. })));
	}

	#[test]
	fn value_taking_operator_requires_a_value() {
		let rules = vec![Rule::condition("title", Operator::Exact, "")];
		let errors = compile(&ticket(), &rules, &catalog()).unwrap_err();
		assert!(matches!(errors.for_rule(0), Some(RuleError::InvalidValue { .. })));
	}

	#[test]
	fn no_value_operator_ignores_stored_value() {
		let rules = vec![Rule::condition("due", Operator::IsNull, "ignored")];
		let predicate = compile(&ticket(), &rules, &catalog()).unwrap();
		assert_eq!(ids(&predicate).len(), 4);
	}

	#[test]
	fn category_without_operators_is_unknown_category() {
		let operators = OperatorCatalog::from_table(&[]);
		let engine = RuleEngine::new(&operators);
		let rules = vec![Rule::condition("title", Operator::Exact, "x")];
		let errors = engine.compile(&ticket(), &rules, &catalog()).unwrap_err();
		assert_eq!(
			errors.for_rule(0),
			Some(&RuleError::UnknownCategory(FieldCategory::Text))
		);
	}

	fn valid_condition() -> impl Strategy<Value = Rule> {
		prop_oneof![
			prop::sample::select(vec!["open", "closed"])
				.prop_map(|s| Rule::condition("status", Operator::Exact, s)),
			(0i64..10).prop_map(|n| Rule::condition("priority", Operator::Gt, n.to_string())),
			(0i64..10).prop_map(|n| Rule::condition("priority", Operator::Lte, n.to_string())),
			Just(Rule::condition("urgent", Operator::IsTrue, "")),
			Just(Rule::condition("urgent", Operator::IsFalse, "")),
			prop::sample::select(vec!["o", "a", "e", "login"])
				.prop_map(|s| Rule::condition("title", Operator::IContains, s)),
		]
	}

	fn any_rule() -> impl Strategy<Value = Rule> {
		prop_oneof![4 => valid_condition(), 1 => Just(Rule::OrGroup)]
	}

	proptest! {
		#[test]
		fn compiling_twice_is_deterministic(rules in prop::collection::vec(any_rule(), 0..12)) {
			let catalog = catalog();
			let first = compile(&ticket(), &rules, &catalog).unwrap();
			let second = compile(&ticket(), &rules, &catalog).unwrap();
			prop_assert_eq!(first, second);
		}

		#[test]
		fn without_markers_there_is_one_group(rules in prop::collection::vec(valid_condition(), 1..8)) {
			let predicate = compile(&ticket(), &rules, &catalog()).unwrap();
			prop_assert_eq!(predicate.groups.len(), 1);
			prop_assert_eq!(predicate.groups[0].conditions.len(), rules.len());
		}

		#[test]
		fn marker_splits_group_membership_at_its_position(
			rules in prop::collection::vec(valid_condition(), 2..8),
			split in 1usize..7,
		) {
			let k = split.min(rules.len() - 1);
			let mut with_marker = rules.clone();
			with_marker.insert(k, Rule::OrGroup);
			let predicate = compile(&ticket(), &with_marker, &catalog()).unwrap();
			prop_assert_eq!(predicate.groups.len(), 2);
			prop_assert_eq!(predicate.groups[0].conditions.len(), k);
			prop_assert_eq!(predicate.groups[1].conditions.len(), rules.len() - k);
		}

		#[test]
		fn adding_a_condition_never_widens_a_group(
			rules in prop::collection::vec(valid_condition(), 1..8),
			victim in 0usize..8,
		) {
			let catalog = catalog();
			let full = compile(&ticket(), &rules, &catalog).unwrap();
			let mut fewer = rules.clone();
			fewer.remove(victim % rules.len());
			let reduced = compile(&ticket(), &fewer, &catalog).unwrap();
			let full_ids = ids(&full);
			let reduced_ids = ids(&reduced);
			for id in &full_ids {
				prop_assert!(reduced_ids.contains(id));
			}
		}

		#[test]
		fn stored_operators_belong_to_their_category(rules in prop::collection::vec(valid_condition(), 1..8)) {
			let catalog = catalog();
			let operators = OperatorCatalog::standard();
			for rule in &rules {
				if let Rule::Condition(c) = rule {
					let field = catalog.resolve(&ticket(), &c.field).unwrap();
					let listed = operators.operators_for(field.category).unwrap();
					prop_assert!(listed.iter().any(|d| d.operator.key() == c.operator));
				}
			}
		}
	}
}
