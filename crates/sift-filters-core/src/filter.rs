// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Saved filters, their rules and object-level grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::operator::Operator;
use crate::types::{FilterAction, FilterId, ModelId, Principal, UserId};

/// Field value that marks the start of a new OR group.
pub const OR_MARKER: &str = "_OR";

/// Format used when an unnamed filter is displayed.
pub const DISPLAY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A saved, reusable query definition over one data model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
	pub id: FilterId,
	pub name: Option<String>,
	pub description: Option<String>,
	pub model: ModelId,
	pub owner: Option<UserId>,
	pub rules: Vec<Rule>,
	/// Deleted once its owner has applied it.
	pub ephemeral: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Filter {
	pub fn new(model: ModelId, owner: UserId) -> Self {
		let now = Utc::now();
		Self {
			id: FilterId::generate(),
			name: None,
			description: None,
			model,
			owner: Some(owner),
			rules: Vec::new(),
			ephemeral: false,
			created_at: now,
			updated_at: now,
		}
	}

	/// Builder: set the name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Builder: set the rules.
	pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
		self.rules = rules;
		self
	}

	/// The name, or the creation time when the filter is unnamed.
	pub fn display_name(&self) -> String {
		match self.name.as_deref() {
			Some(name) if !name.is_empty() => name.to_string(),
			_ => self.created_at.format(DISPLAY_DATE_FORMAT).to_string(),
		}
	}

	pub fn is_owned_by(&self, user: UserId) -> bool {
		self.owner == Some(user)
	}
}

/// One atomic comparison.
///
/// `operator` and `value` are kept as stored; they are checked against the
/// field's category when the rule is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
	pub field: String,
	pub operator: String,
	pub value: String,
	#[serde(default)]
	pub negate: bool,
}

impl Condition {
	pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			operator: operator.key().to_string(),
			value: value.into(),
			negate: false,
		}
	}

	/// Builder: invert the condition.
	pub fn negated(mut self) -> Self {
		self.negate = true;
		self
	}
}

/// An entry of a filter's ordered rule sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
	Condition(Condition),
	/// Starts a new OR group. Carries no operator or value.
	OrGroup,
}

impl Rule {
	pub fn condition(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
		Rule::Condition(Condition::new(field, operator, value))
	}

	pub fn is_marker(&self) -> bool {
		matches!(self, Rule::OrGroup)
	}

	/// Reads a stored row. A marker row's operator, value and negate flag are ignored.
	pub fn from_stored(stored: StoredRule) -> Self {
		if stored.field == OR_MARKER {
			return Rule::OrGroup;
		}
		Rule::Condition(Condition {
			field: stored.field,
			operator: stored.operator,
			value: stored.value,
			negate: stored.negate,
		})
	}

	/// The persisted form. Markers are written with operator `exact`, an empty value and no negation.
	pub fn to_stored(&self) -> StoredRule {
		match self {
			Rule::OrGroup => StoredRule::marker(),
			Rule::Condition(c) => StoredRule {
				field: c.field.clone(),
				operator: c.operator.clone(),
				value: c.value.clone(),
				negate: c.negate,
			},
		}
	}
}

impl From<Condition> for Rule {
	fn from(condition: Condition) -> Self {
		Rule::Condition(condition)
	}
}

/// Flat row representation of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRule {
	pub field: String,
	pub operator: String,
	pub value: String,
	pub negate: bool,
}

impl StoredRule {
	pub fn marker() -> Self {
		Self {
			field: OR_MARKER.to_string(),
			operator: Operator::Exact.key().to_string(),
			value: String::new(),
			negate: false,
		}
	}
}

/// An object-level permission on one filter for one principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grant {
	pub filter_id: FilterId,
	pub principal: Principal,
	pub action: FilterAction,
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	#[test]
	fn marker_round_trips_through_storage() {
		let stored = Rule::OrGroup.to_stored();
		assert_eq!(stored.field, OR_MARKER);
		assert_eq!(stored.operator, "exact");
		assert!(stored.value.is_empty());
		assert!(!stored.negate);
		assert_eq!(Rule::from_stored(stored), Rule::OrGroup);
	}

	#[test]
	fn stored_marker_ignores_operator_and_value() {
		let stored = StoredRule {
			field: OR_MARKER.to_string(),
			operator: "gt".to_string(),
			value: "7".to_string(),
			negate: true,
		};
		assert_eq!(Rule::from_stored(stored), Rule::OrGroup);
	}

	#[test]
	fn display_name_falls_back_to_created_at() {
		let mut filter = Filter::new(ModelId::from("core.ticket"), UserId::generate());
		filter.created_at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
		assert_eq!(filter.display_name(), "2024-05-06 07:08:09");

		filter.name = Some(String::new());
		assert_eq!(filter.display_name(), "2024-05-06 07:08:09");

		let filter = filter.with_name("Open tickets");
		assert_eq!(filter.display_name(), "Open tickets");
	}

	#[test]
	fn ownership_check() {
		let owner = UserId::generate();
		let filter = Filter::new(ModelId::from("core.ticket"), owner);
		assert!(filter.is_owned_by(owner));
		assert!(!filter.is_owned_by(UserId::generate()));
	}

	#[test]
	fn rule_serializes_with_kind_tag() {
		let json = serde_json::to_value(Rule::condition("status", Operator::Exact, "open")).unwrap();
		assert_eq!(json["kind"], "condition");
		assert_eq!(json["operator"], "exact");
		let marker = serde_json::to_value(Rule::OrGroup).unwrap();
		assert_eq!(marker["kind"], "or_group");
	}
}
