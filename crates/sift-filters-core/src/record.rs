// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory records and a store that evaluates compiled predicates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

use crate::predicate::Predicate;
use crate::types::ModelId;

/// A field value held by a [`Record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
	Null,
	Text(String),
	Number(f64),
	Bool(bool),
	Date(DateTime<Utc>),
	Uuid(Uuid),
	/// Records reachable through a relation. To-one relations hold at most one.
	Related(Vec<Record>),
}

impl From<&str> for FieldValue {
	fn from(s: &str) -> Self {
		FieldValue::Text(s.to_string())
	}
}

impl From<String> for FieldValue {
	fn from(s: String) -> Self {
		FieldValue::Text(s)
	}
}

impl From<f64> for FieldValue {
	fn from(n: f64) -> Self {
		FieldValue::Number(n)
	}
}

impl From<i64> for FieldValue {
	fn from(n: i64) -> Self {
		FieldValue::Number(n as f64)
	}
}

impl From<bool> for FieldValue {
	fn from(b: bool) -> Self {
		FieldValue::Bool(b)
	}
}

impl From<DateTime<Utc>> for FieldValue {
	fn from(d: DateTime<Utc>) -> Self {
		FieldValue::Date(d)
	}
}

impl From<Uuid> for FieldValue {
	fn from(u: Uuid) -> Self {
		FieldValue::Uuid(u)
	}
}

impl From<Record> for FieldValue {
	fn from(r: Record) -> Self {
		FieldValue::Related(vec![r])
	}
}

impl From<Vec<Record>> for FieldValue {
	fn from(r: Vec<Record>) -> Self {
		FieldValue::Related(r)
	}
}

/// A record of some model, keyed by field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
	pub id: String,
	pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			fields: BTreeMap::new(),
		}
	}

	/// Builder: set a field.
	pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
		self.fields.insert(field.into(), value.into());
		self
	}

	/// Missing fields read as [`FieldValue::Null`].
	pub fn get(&self, field: &str) -> &FieldValue {
		self.fields.get(field).unwrap_or(&FieldValue::Null)
	}
}

/// Records grouped by model, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
	records: HashMap<ModelId, Vec<Record>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, model: ModelId, record: Record) {
		self.records.entry(model).or_default().push(record);
	}

	/// Builder: add a record.
	pub fn with_record(mut self, model: impl Into<ModelId>, record: Record) -> Self {
		self.insert(model.into(), record);
		self
	}

	pub fn records(&self, model: &ModelId) -> &[Record] {
		self.records.get(model).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Returns each matching record once, in insertion order.
	pub fn query(&self, model: &ModelId, predicate: &Predicate) -> Vec<Record> {
		let mut seen = HashSet::new();
		self
			.records(model)
			.iter()
			.filter(|record| predicate.matches(record))
			.filter(|record| seen.insert(record.id.clone()))
			.cloned()
			.collect()
	}
}
