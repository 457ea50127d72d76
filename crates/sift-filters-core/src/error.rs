// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use crate::catalog::FieldCategory;
use crate::types::ModelId;

/// An action name that is not one of `view`, `change` or `delete`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter action: {0}")]
pub struct ParseActionError(pub String);

/// Field catalog lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
	#[error("unknown model: {0}")]
	UnknownModel(ModelId),

	/// `segment` is the first path step that failed to resolve.
	#[error("unknown field '{path}': cannot resolve '{segment}'")]
	UnknownField { path: String, segment: String },
}

/// A single rule that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
	#[error("unknown field '{path}': cannot resolve '{segment}'")]
	UnknownField { path: String, segment: String },

	#[error("operator '{operator}' is not allowed for {category} fields")]
	InvalidOperator {
		operator: String,
		category: FieldCategory,
	},

	#[error("value is not valid for field '{field}' ({category}): {message}")]
	InvalidValue {
		field: String,
		category: FieldCategory,
		message: String,
	},

	#[error("no operators are registered for {0} fields")]
	UnknownCategory(FieldCategory),
}

impl From<CatalogError> for RuleError {
	fn from(err: CatalogError) -> Self {
		match err {
			CatalogError::UnknownModel(model) => RuleError::UnknownField {
				path: String::new(),
				segment: model.to_string(),
			},
			CatalogError::UnknownField { path, segment } => RuleError::UnknownField { path, segment },
		}
	}
}

/// A rule error tagged with the position of the offending rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
	pub index: usize,
	pub error: RuleError,
}

impl fmt::Display for RuleViolation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "rule {}: {}", self.index, self.error)
	}
}

/// Every invalid rule found while compiling a rule sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} invalid rule(s): {}", .violations.len(), display_violations(.violations))]
pub struct CompileErrors {
	pub violations: Vec<RuleViolation>,
}

impl CompileErrors {
	/// Returns the error reported for the rule at `index`, if any.
	pub fn for_rule(&self, index: usize) -> Option<&RuleError> {
		self
			.violations
			.iter()
			.find(|v| v.index == index)
			.map(|v| &v.error)
	}
}

fn display_violations(violations: &[RuleViolation]) -> String {
	violations
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("; ")
}

pub type Result<T> = std::result::Result<T, RuleError>;
