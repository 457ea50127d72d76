// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed rule values.
//!
//! Rules store their value as text. It is coerced into a [`Value`] for the
//! field's category when the rule is compiled.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::catalog::{ChoiceOption, FieldCategory};

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A rule value coerced for its field category.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Text(String),
	Number(f64),
	Date(DateTime<Utc>),
	Uuid(Uuid),
}

impl Value {
	/// Coerces `raw` for a field of `category`. The error is a human readable reason.
	pub fn coerce(
		category: FieldCategory,
		raw: &str,
		choices: &[ChoiceOption],
	) -> Result<Value, String> {
		match category {
			FieldCategory::Text | FieldCategory::Relation => Ok(Value::Text(raw.to_string())),
			FieldCategory::Number => parse_number(raw).map(Value::Number),
			FieldCategory::Date => parse_date(raw).map(Value::Date),
			FieldCategory::Uuid => Uuid::parse_str(raw.trim())
				.map(Value::Uuid)
				.map_err(|e| format!("'{raw}' is not a valid UUID: {e}")),
			FieldCategory::Choice => {
				if choices.iter().any(|c| c.key == raw) {
					Ok(Value::Text(raw.to_string()))
				} else {
					Err(format!("'{raw}' is not one of the available choices"))
				}
			}
			FieldCategory::Boolean => Err("boolean fields take no value".to_string()),
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Text(s) => write!(f, "'{s}'"),
			Value::Number(n) => write!(f, "{n}"),
			Value::Date(d) => write!(f, "{}", d.to_rfc3339()),
			Value::Uuid(u) => write!(f, "{u}"),
		}
	}
}

fn parse_number(raw: &str) -> Result<f64, String> {
	let n: f64 = raw
		.trim()
		.parse()
		.map_err(|_| format!("'{raw}' is not a number"))?;
	if n.is_finite() {
		Ok(n)
	} else {
		Err(format!("'{raw}' is not a finite number"))
	}
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
	let raw = raw.trim();
	if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
		return Ok(dt.with_timezone(&Utc));
	}
	if let Ok(dt) = NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT) {
		return Ok(dt.and_utc());
	}
	NaiveDate::parse_from_str(raw, DATE_FORMAT)
		.ok()
		.and_then(|d| d.and_hms_opt(0, 0, 0))
		.map(|dt| dt.and_utc())
		.ok_or_else(|| format!("'{raw}' is not a valid date"))
}
