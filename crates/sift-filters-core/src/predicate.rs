// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Compiled predicates: an OR of AND-groups of atomic conditions.
//!
//! A predicate mirrors the order of the rules it was compiled from, so two
//! compilations of the same rules compare equal. Stores translate it into
//! their native query form; [`Predicate::matches`] evaluates it directly
//! against an in-memory [`Record`].

use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::fmt;

use crate::catalog::{FieldCategory, ResolvedField};
use crate::operator::Operator;
use crate::record::{FieldValue, Record};
use crate::value::Value;

/// Groups combine with OR. No groups matches everything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Predicate {
	pub groups: Vec<ConditionGroup>,
}

impl Predicate {
	pub fn match_all() -> Self {
		Self::default()
	}

	pub fn matches(&self, record: &Record) -> bool {
		self.groups.is_empty() || self.groups.iter().any(|g| g.matches(record))
	}

	/// Total number of atomic conditions.
	pub fn len(&self) -> usize {
		self.groups.iter().map(|g| g.conditions.len()).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl fmt::Display for Predicate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.groups.is_empty() {
			return f.write_str("TRUE");
		}
		let parenthesize = self.groups.len() > 1;
		for (i, group) in self.groups.iter().enumerate() {
			if i > 0 {
				f.write_str(" OR ")?;
			}
			if parenthesize {
				write!(f, "({group})")?;
			} else {
				write!(f, "{group}")?;
			}
		}
		Ok(())
	}
}

/// Conditions combine with AND. An empty group matches everything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionGroup {
	pub conditions: Vec<Atom>,
}

impl ConditionGroup {
	pub fn matches(&self, record: &Record) -> bool {
		self.conditions.iter().all(|c| c.matches(record))
	}
}

impl fmt::Display for ConditionGroup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.conditions.is_empty() {
			return f.write_str("TRUE");
		}
		for (i, atom) in self.conditions.iter().enumerate() {
			if i > 0 {
				f.write_str(" AND ")?;
			}
			write!(f, "{atom}")?;
		}
		Ok(())
	}
}

/// A single `field OP value` comparison, optionally negated.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
	pub field: ResolvedField,
	pub lookup: Lookup,
	pub negate: bool,
}

impl Atom {
	/// To-many relations are existential: the comparison holds if any
	/// reachable value satisfies it. Negation holds if none does.
	pub fn matches(&self, record: &Record) -> bool {
		let leaves = leaf_values(record, &self.field);
		let holds = match &self.lookup {
			Lookup::IsNull => leaves.is_empty() || leaves.iter().any(|v| matches!(v, Leaf::Null)),
			lookup => leaves.iter().any(|v| lookup.test(v)),
		};
		holds != self.negate
	}
}

impl fmt::Display for Atom {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.negate {
			f.write_str("NOT ")?;
		}
		write!(f, "{} {}", self.field.path, self.lookup.operator())?;
		if let Some(value) = self.lookup.display_value() {
			write!(f, " {value}")?;
		}
		Ok(())
	}
}

/// A compiled regular expression, compared by source and case flag.
#[derive(Debug, Clone)]
pub struct Pattern {
	pub source: String,
	pub case_insensitive: bool,
	regex: Regex,
}

impl Pattern {
	pub fn new(source: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
		let regex = RegexBuilder::new(source)
			.case_insensitive(case_insensitive)
			.build()?;
		Ok(Self {
			source: source.to_string(),
			case_insensitive,
			regex,
		})
	}

	pub fn is_match(&self, text: &str) -> bool {
		self.regex.is_match(text)
	}
}

impl PartialEq for Pattern {
	fn eq(&self, other: &Self) -> bool {
		self.source == other.source && self.case_insensitive == other.case_insensitive
	}
}

/// The comparison performed by an [`Atom`], with its coerced operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
	Exact(Value),
	IExact(String),
	Contains(String),
	IContains(String),
	Regex(Pattern),
	Lt(Value),
	Gt(Value),
	Lte(Value),
	Gte(Value),
	IsNull,
	IsEmpty,
	IsTrue,
	IsFalse,
}

impl Lookup {
	pub fn operator(&self) -> Operator {
		match self {
			Lookup::Exact(_) => Operator::Exact,
			Lookup::IExact(_) => Operator::IExact,
			Lookup::Contains(_) => Operator::Contains,
			Lookup::IContains(_) => Operator::IContains,
			Lookup::Regex(p) if p.case_insensitive => Operator::IRegex,
			Lookup::Regex(_) => Operator::Regex,
			Lookup::Lt(_) => Operator::Lt,
			Lookup::Gt(_) => Operator::Gt,
			Lookup::Lte(_) => Operator::Lte,
			Lookup::Gte(_) => Operator::Gte,
			Lookup::IsNull => Operator::IsNull,
			Lookup::IsEmpty => Operator::IsEmpty,
			Lookup::IsTrue => Operator::IsTrue,
			Lookup::IsFalse => Operator::IsFalse,
		}
	}

	fn display_value(&self) -> Option<String> {
		match self {
			Lookup::Exact(v) | Lookup::Lt(v) | Lookup::Gt(v) | Lookup::Lte(v) | Lookup::Gte(v) => {
				Some(v.to_string())
			}
			Lookup::IExact(s) | Lookup::Contains(s) | Lookup::IContains(s) => Some(format!("'{s}'")),
			Lookup::Regex(p) => Some(format!("/{}/", p.source)),
			Lookup::IsNull | Lookup::IsEmpty | Lookup::IsTrue | Lookup::IsFalse => None,
		}
	}

	fn test(&self, leaf: &Leaf<'_>) -> bool {
		match (self, leaf) {
			(_, Leaf::Null) => false,
			(Lookup::Exact(v), leaf) => leaf.compare(v) == Some(Ordering::Equal),
			(Lookup::Lt(v), leaf) => leaf.compare(v) == Some(Ordering::Less),
			(Lookup::Gt(v), leaf) => leaf.compare(v) == Some(Ordering::Greater),
			(Lookup::Lte(v), leaf) => {
				matches!(leaf.compare(v), Some(Ordering::Less | Ordering::Equal))
			}
			(Lookup::Gte(v), leaf) => {
				matches!(leaf.compare(v), Some(Ordering::Greater | Ordering::Equal))
			}
			(Lookup::IExact(s), Leaf::Text(t)) => t.to_lowercase() == s.to_lowercase(),
			(Lookup::Contains(s), Leaf::Text(t)) => t.contains(s.as_str()),
			(Lookup::IContains(s), Leaf::Text(t)) => t.to_lowercase().contains(&s.to_lowercase()),
			(Lookup::Regex(p), Leaf::Text(t)) => p.is_match(t),
			(Lookup::IsEmpty, Leaf::Text(t)) => t.is_empty(),
			(Lookup::IsTrue, Leaf::Bool(b)) => *b,
			(Lookup::IsFalse, Leaf::Bool(b)) => !*b,
			_ => false,
		}
	}
}

/// A value reached at the end of a field path.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Leaf<'a> {
	Null,
	Text(&'a str),
	Number(f64),
	Bool(bool),
	Date(chrono::DateTime<chrono::Utc>),
	Uuid(uuid::Uuid),
}

impl Leaf<'_> {
	fn compare(&self, value: &Value) -> Option<Ordering> {
		match (self, value) {
			(Leaf::Text(t), Value::Text(v)) => Some((*t).cmp(v.as_str())),
			(Leaf::Number(n), Value::Number(v)) => n.partial_cmp(v),
			(Leaf::Date(d), Value::Date(v)) => Some(d.cmp(v)),
			(Leaf::Uuid(u), Value::Uuid(v)) => Some(u.cmp(v)),
			(Leaf::Text(t), Value::Uuid(v)) => uuid::Uuid::parse_str(t).ok().map(|u| u.cmp(v)),
			_ => None,
		}
	}
}

/// Follows the relation steps of `field` from `record` and collects the leaf values.
///
/// A relation leaf yields the ids of its related records.
fn leaf_values<'a>(record: &'a Record, field: &ResolvedField) -> Vec<Leaf<'a>> {
	let mut current: Vec<&'a Record> = vec![record];
	for step in field.relations() {
		current = current
			.into_iter()
			.flat_map(|r| match r.get(&step.field) {
				FieldValue::Related(related) => related.iter().collect::<Vec<_>>(),
				_ => Vec::new(),
			})
			.collect();
	}

	let Some(leaf) = field.leaf().map(|step| step.field.as_str()) else {
		return Vec::new();
	};
	let mut values = Vec::new();
	for r in current {
		match r.get(leaf) {
			FieldValue::Null => values.push(Leaf::Null),
			FieldValue::Text(t) => values.push(Leaf::Text(t)),
			FieldValue::Number(n) => values.push(Leaf::Number(*n)),
			FieldValue::Bool(b) => values.push(Leaf::Bool(*b)),
			FieldValue::Date(d) => values.push(Leaf::Date(*d)),
			FieldValue::Uuid(u) => values.push(Leaf::Uuid(*u)),
			FieldValue::Related(related) if field.category == FieldCategory::Relation => {
				if related.is_empty() {
					values.push(Leaf::Null);
				}
				values.extend(related.iter().map(|rel| Leaf::Text(&rel.id)));
			}
			FieldValue::Related(_) => values.push(Leaf::Null),
		}
	}
	values
}
