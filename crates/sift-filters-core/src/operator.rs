// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operator catalog: which comparison operators each field category accepts.
//!
//! The rule engine and the rule editor read the same [`OperatorCatalog`], so
//! the list offered to an author is exactly the list the engine will accept.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::catalog::FieldCategory;
use crate::error::RuleError;

/// A comparison operator, keyed by its stored name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
	Exact,
	IExact,
	Contains,
	IContains,
	Regex,
	IRegex,
	Lt,
	Gt,
	Lte,
	Gte,
	IsNull,
	IsEmpty,
	IsTrue,
	IsFalse,
}

impl Operator {
	pub fn all() -> &'static [Operator] {
		&[
			Operator::Exact,
			Operator::IExact,
			Operator::Contains,
			Operator::IContains,
			Operator::Regex,
			Operator::IRegex,
			Operator::Lt,
			Operator::Gt,
			Operator::Lte,
			Operator::Gte,
			Operator::IsNull,
			Operator::IsEmpty,
			Operator::IsTrue,
			Operator::IsFalse,
		]
	}

	/// The key stored on a rule.
	pub fn key(&self) -> &'static str {
		match self {
			Operator::Exact => "exact",
			Operator::IExact => "iexact",
			Operator::Contains => "contains",
			Operator::IContains => "icontains",
			Operator::Regex => "regex",
			Operator::IRegex => "iregex",
			Operator::Lt => "lt",
			Operator::Gt => "gt",
			Operator::Lte => "lte",
			Operator::Gte => "gte",
			Operator::IsNull => "isnull",
			Operator::IsEmpty => "isempty",
			Operator::IsTrue => "istrue",
			Operator::IsFalse => "isfalse",
		}
	}

	pub fn from_key(key: &str) -> Option<Operator> {
		Operator::all().iter().copied().find(|op| op.key() == key)
	}

	/// Returns false for operators whose stored value is forced empty.
	pub fn takes_value(&self) -> bool {
		!matches!(
			self,
			Operator::IsNull | Operator::IsEmpty | Operator::IsTrue | Operator::IsFalse
		)
	}
}

impl fmt::Display for Operator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.key())
	}
}

/// An operator as offered for one field category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperatorDef {
	#[serde(rename = "key")]
	pub operator: Operator,
	#[serde(rename = "display")]
	pub label: &'static str,
}

const fn def(operator: Operator, label: &'static str) -> OperatorDef {
	OperatorDef { operator, label }
}

const TEXT_OPERATORS: &[OperatorDef] = &[
	def(Operator::Exact, "Equals (case-sensitive)"),
	def(Operator::IExact, "Equals (ignore case)"),
	def(Operator::Contains, "Contains (case-sensitive)"),
	def(Operator::IContains, "Contains (ignore case)"),
	def(Operator::Regex, "Regex Match (case-sensitive)"),
	def(Operator::IRegex, "Regex Match (ignore case)"),
	def(Operator::IsEmpty, "Is Empty"),
	def(Operator::IsNull, "Is NULL"),
];

const NUMBER_OPERATORS: &[OperatorDef] = &[
	def(Operator::Exact, "Equals (numeric)"),
	def(Operator::Lt, "Less Than"),
	def(Operator::Gt, "Greater Than"),
	def(Operator::Lte, "Less Than or Equal To"),
	def(Operator::Gte, "Greater Than or Equal To"),
	def(Operator::IsNull, "Is NULL"),
];

const DATE_OPERATORS: &[OperatorDef] = &[
	def(Operator::Exact, "Equals (date/time)"),
	def(Operator::Lt, "Less Than"),
	def(Operator::Gt, "Greater Than"),
	def(Operator::Lte, "Less Than or Equal To"),
	def(Operator::Gte, "Greater Than or Equal To"),
	def(Operator::IsNull, "Is NULL"),
];

const BOOLEAN_OPERATORS: &[OperatorDef] = &[
	def(Operator::IsTrue, "Is TRUE"),
	def(Operator::IsFalse, "Is FALSE"),
	def(Operator::IsNull, "Is NULL"),
];

const CHOICE_OPERATORS: &[OperatorDef] = &[
	def(Operator::Exact, "Equals (choice)"),
	def(Operator::IsNull, "Is NULL"),
];

const UUID_OPERATORS: &[OperatorDef] = &[
	def(Operator::Exact, "Equals (UUID)"),
	def(Operator::IsNull, "Is NULL"),
];

const RELATION_OPERATORS: &[OperatorDef] = &[
	def(Operator::Exact, "Equals (exact)"),
	def(Operator::IsNull, "Is NULL"),
];

/// The built-in category table.
pub const STANDARD_TABLE: &[(FieldCategory, &[OperatorDef])] = &[
	(FieldCategory::Text, TEXT_OPERATORS),
	(FieldCategory::Number, NUMBER_OPERATORS),
	(FieldCategory::Date, DATE_OPERATORS),
	(FieldCategory::Boolean, BOOLEAN_OPERATORS),
	(FieldCategory::Choice, CHOICE_OPERATORS),
	(FieldCategory::Uuid, UUID_OPERATORS),
	(FieldCategory::Relation, RELATION_OPERATORS),
];

static STANDARD: LazyLock<OperatorCatalog> =
	LazyLock::new(|| OperatorCatalog::from_table(STANDARD_TABLE));

/// Ordered operator lists per field category. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorCatalog {
	table: Vec<(FieldCategory, Vec<OperatorDef>)>,
}

impl OperatorCatalog {
	pub fn from_table(table: &[(FieldCategory, &[OperatorDef])]) -> Self {
		Self {
			table: table
				.iter()
				.map(|(category, defs)| (*category, defs.to_vec()))
				.collect(),
		}
	}

	/// The process-wide catalog built from [`STANDARD_TABLE`].
	pub fn standard() -> &'static OperatorCatalog {
		&STANDARD
	}

	/// Forces construction of the standard catalog before it is first used.
	pub fn init() {
		LazyLock::force(&STANDARD);
	}

	/// Returns the ordered operators registered for `category`.
	pub fn operators_for(&self, category: FieldCategory) -> Result<&[OperatorDef], RuleError> {
		self
			.table
			.iter()
			.find(|(c, _)| *c == category)
			.map(|(_, defs)| defs.as_slice())
			.filter(|defs| !defs.is_empty())
			.ok_or(RuleError::UnknownCategory(category))
	}

	/// Resolves a stored operator key, requiring it to be registered for `category`.
	pub fn lookup(&self, category: FieldCategory, key: &str) -> Result<Operator, RuleError> {
		let invalid = || RuleError::InvalidOperator {
			operator: key.to_string(),
			category,
		};
		let operator = Operator::from_key(key).ok_or_else(invalid)?;
		self
			.operators_for(category)?
			.iter()
			.find(|d| d.operator == operator)
			.map(|d| d.operator)
			.ok_or_else(invalid)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_category_has_operators() {
		let catalog = OperatorCatalog::standard();
		for category in FieldCategory::all() {
			assert!(!catalog.operators_for(*category).unwrap().is_empty());
		}
	}

	#[test]
	fn text_operators_keep_table_order() {
		let keys: Vec<&str> = OperatorCatalog::standard()
			.operators_for(FieldCategory::Text)
			.unwrap()
			.iter()
			.map(|d| d.operator.key())
			.collect();
		assert_eq!(
			keys,
			vec!["exact", "iexact", "contains", "icontains", "regex", "iregex", "isempty", "isnull"]
		);
	}

	#[test]
	fn missing_category_is_unknown() {
		let catalog = OperatorCatalog::from_table(&[(FieldCategory::Text, TEXT_OPERATORS)]);
		assert_eq!(
			catalog.operators_for(FieldCategory::Number).unwrap_err(),
			RuleError::UnknownCategory(FieldCategory::Number)
		);
	}

	#[test]
	fn lookup_rejects_operator_from_another_category() {
		let err = OperatorCatalog::standard()
			.lookup(FieldCategory::Boolean, "contains")
			.unwrap_err();
		assert!(matches!(err, RuleError::InvalidOperator { .. }));
	}

	#[test]
	fn lookup_rejects_unknown_key() {
		let err = OperatorCatalog::standard()
			.lookup(FieldCategory::Text, "startswith")
			.unwrap_err();
		assert_eq!(
			err,
			RuleError::InvalidOperator {
				operator: "startswith".to_string(),
				category: FieldCategory::Text,
			}
		);
	}

	#[test]
	fn operator_keys_round_trip() {
		for op in Operator::all() {
			assert_eq!(Operator::from_key(op.key()), Some(*op));
		}
	}

	#[test]
	fn serialized_def_uses_key_and_display() {
		let json = serde_json::to_value(def(Operator::IExact, "Equals (ignore case)")).unwrap();
		assert_eq!(json["key"], "iexact");
		assert_eq!(json["display"], "Equals (ignore case)");
	}
}
