// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Data for rule-editing widgets.
//!
//! [`RuleInputs`] says what the operator, value and negate inputs of a rule
//! row should offer once a field is selected. [`FieldData`] is the whole
//! payload a widget needs for one model. Both read the operator catalog used
//! by the rule engine, but the engine never trusts what an editor enforced.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::{ChoiceOption, FieldCatalog};
use crate::error::RuleError;
use crate::filter::{StoredRule, OR_MARKER};
use crate::operator::{OperatorCatalog, OperatorDef};
use crate::types::ModelId;

/// Label of the OR-group marker in field selectors.
pub const OR_MARKER_LABEL: &str = "--- OR ---";

/// Input state for a rule row, keyed by the selected field.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleInputs {
	Field {
		operators: Vec<OperatorDef>,
		values: Option<Vec<ChoiceOption>>,
	},
	/// The marker: operator, value and negate are fixed and disabled.
	GroupMarker,
}

impl RuleInputs {
	pub fn for_selection(
		model: &ModelId,
		selection: &str,
		fields: &dyn FieldCatalog,
		operators: &OperatorCatalog,
	) -> Result<RuleInputs, RuleError> {
		if selection == OR_MARKER {
			return Ok(RuleInputs::GroupMarker);
		}
		let field = fields.resolve(model, selection)?;
		let defs = operators.operators_for(field.category)?.to_vec();
		let values = (!field.choices.is_empty()).then_some(field.choices);
		Ok(RuleInputs::Field {
			operators: defs,
			values,
		})
	}

	/// The values a marker row is forced to.
	pub fn forced_rule(&self) -> Option<StoredRule> {
		match self {
			RuleInputs::GroupMarker => Some(StoredRule::marker()),
			RuleInputs::Field { .. } => None,
		}
	}

	pub fn inputs_enabled(&self) -> bool {
		matches!(self, RuleInputs::Field { .. })
	}
}

/// A `{key, display}` entry of a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
	pub key: String,
	pub display: String,
}

/// Everything a rule-editing widget needs for one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldData {
	/// Filterable fields in catalog order, followed by the marker.
	pub fields: Vec<Choice>,
	pub operators: BTreeMap<String, Vec<OperatorDef>>,
	/// Only bounded-choice fields have an entry. Labels read `label (key)`.
	pub values: BTreeMap<String, Vec<Choice>>,
}

/// Builds the widget payload for `model`.
pub fn field_data(
	model: &ModelId,
	fields: &dyn FieldCatalog,
	operators: &OperatorCatalog,
) -> Result<FieldData, RuleError> {
	let descriptors = fields.fields_for(model)?;

	let mut data = FieldData {
		fields: Vec::with_capacity(descriptors.len() + 1),
		operators: BTreeMap::new(),
		values: BTreeMap::new(),
	};

	for descriptor in descriptors {
		data.operators.insert(
			descriptor.path.clone(),
			operators.operators_for(descriptor.category)?.to_vec(),
		);
		if let Some(choices) = fields.values_for(model, &descriptor.path)? {
			data.values.insert(
				descriptor.path.clone(),
				choices
					.into_iter()
					.map(|c| Choice {
						display: format!("{} ({})", c.label, c.key),
						key: c.key,
					})
					.collect(),
			);
		}
		data.fields.push(Choice {
			key: descriptor.path,
			display: descriptor.label,
		});
	}

	data.fields.push(Choice {
		key: OR_MARKER.to_string(),
		display: OR_MARKER_LABEL.to_string(),
	});
	Ok(data)
}
