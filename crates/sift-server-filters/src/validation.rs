// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Checks applied to a rule sequence before it is persisted.
//!
//! The rule engine accepts any sequence. A saved filter must additionally be
//! non-empty and may not start or end with an OR marker, nor contain two
//! markers in a row.

use sift_filters_core::{
	CompileErrors, FieldCatalog, ModelId, Predicate, Rule, RuleEngine, RuleViolation,
};
use std::fmt;
use thiserror::Error;

/// A problem with the shape of a rule sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StructureError {
	#[error("a filter needs at least one rule")]
	Empty,

	#[error("the first rule cannot be an OR marker")]
	LeadingMarker,

	#[error("the last rule cannot be an OR marker")]
	TrailingMarker,

	/// `index` is the second marker of the pair.
	#[error("rule {index}: two OR markers in a row")]
	ConsecutiveMarkers { index: usize },
}

/// Structure errors and per-rule compile errors, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
	pub structure: Vec<StructureError>,
	pub violations: Vec<RuleViolation>,
}

impl ValidationErrors {
	pub fn is_empty(&self) -> bool {
		self.structure.is_empty() && self.violations.is_empty()
	}
}

impl fmt::Display for ValidationErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let messages: Vec<String> = self
			.structure
			.iter()
			.map(ToString::to_string)
			.chain(self.violations.iter().map(ToString::to_string))
			.collect();
		f.write_str(&messages.join("; "))
	}
}

impl std::error::Error for ValidationErrors {}

impl From<CompileErrors> for ValidationErrors {
	fn from(errors: CompileErrors) -> Self {
		Self {
			structure: Vec::new(),
			violations: errors.violations,
		}
	}
}

pub fn check_structure(rules: &[Rule]) -> Vec<StructureError> {
	let Some((first, last)) = rules.first().zip(rules.last()) else {
		return vec![StructureError::Empty];
	};

	let mut errors = Vec::new();
	if first.is_marker() {
		errors.push(StructureError::LeadingMarker);
	}
	if last.is_marker() {
		errors.push(StructureError::TrailingMarker);
	}
	for (index, pair) in rules.windows(2).enumerate() {
		if pair[0].is_marker() && pair[1].is_marker() {
			errors.push(StructureError::ConsecutiveMarkers { index: index + 1 });
		}
	}
	errors
}

/// Checks structure and compiles, collecting every problem found.
pub fn validate(
	engine: &RuleEngine<'_>,
	model: &ModelId,
	rules: &[Rule],
	fields: &dyn FieldCatalog,
) -> Result<Predicate, ValidationErrors> {
	let structure = check_structure(rules);
	match engine.compile(model, rules, fields) {
		Ok(predicate) if structure.is_empty() => Ok(predicate),
		Ok(_) => Err(ValidationErrors {
			structure,
			violations: Vec::new(),
		}),
		Err(errors) => Err(ValidationErrors {
			structure,
			violations: errors.violations,
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use sift_filters_core::{FieldDef, ModelSchema, Operator, RuleError, StaticFieldCatalog};

	fn cond() -> Rule {
		Rule::condition("status", Operator::Exact, "open")
	}

	#[test]
	fn empty_sequence_is_rejected() {
		assert_eq!(check_structure(&[]), vec![StructureError::Empty]);
	}

	#[test]
	fn well_formed_sequences_pass() {
		assert!(check_structure(&[cond()]).is_empty());
		assert!(check_structure(&[cond(), Rule::OrGroup, cond()]).is_empty());
	}

	#[test]
	fn sole_marker_reports_both_ends() {
		assert_eq!(
			check_structure(&[Rule::OrGroup]),
			vec![StructureError::LeadingMarker, StructureError::TrailingMarker]
		);
	}

	#[test]
	fn consecutive_markers_point_at_the_second() {
		let rules = [cond(), Rule::OrGroup, Rule::OrGroup, cond()];
		assert_eq!(
			check_structure(&rules),
			vec![StructureError::ConsecutiveMarkers { index: 2 }]
		);
	}

	#[test]
	fn validate_reports_structure_and_rule_errors_together() {
		let fields = StaticFieldCatalog::new().with_model(
			ModelSchema::new("core.ticket")
				.field(FieldDef::choice("status", [("open", "Open"), ("closed", "Closed")])),
		);
		let rules = [
			Rule::OrGroup,
			Rule::condition("status", Operator::Exact, "pending"),
		];
		let errors = validate(
			&RuleEngine::default(),
			&ModelId::from("core.ticket"),
			&rules,
			&fields,
		)
		.unwrap_err();

		assert_eq!(errors.structure, vec![StructureError::LeadingMarker]);
		assert_eq!(errors.violations.len(), 1);
		assert_eq!(errors.violations[0].index, 1);
		assert!(matches!(
			errors.violations[0].error,
			RuleError::InvalidValue { .. }
		));
		assert!(!errors.is_empty());
	}

	proptest! {
		#[test]
		fn marker_free_nonempty_sequences_are_well_formed(len in 1usize..12) {
			let rules: Vec<Rule> = (0..len).map(|_| cond()).collect();
			prop_assert!(check_structure(&rules).is_empty());
		}

		#[test]
		fn flagged_pairs_are_exactly_the_adjacent_markers(mask in prop::collection::vec(any::<bool>(), 2..16)) {
			let rules: Vec<Rule> = mask
				.iter()
				.map(|&marker| if marker { Rule::OrGroup } else { cond() })
				.collect();
			let flagged: Vec<usize> = check_structure(&rules)
				.into_iter()
				.filter_map(|e| match e {
					StructureError::ConsecutiveMarkers { index } => Some(index),
					_ => None,
				})
				.collect();
			let expected: Vec<usize> = (1..mask.len()).filter(|&i| mask[i - 1] && mask[i]).collect();
			prop_assert_eq!(flagged, expected);
		}
	}
}
