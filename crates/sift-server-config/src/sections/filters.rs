// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Saved-filter policy and listing configuration.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

const ORDER_BY_KEY: &str = "filters.order_by";

/// Column a filter listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
	/// Case-insensitive; unnamed filters sort first when ascending.
	Name,
	Created,
	Modified,
}

/// One sort key, e.g. `-created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderKey {
	pub field: OrderField,
	pub descending: bool,
}

impl OrderKey {
	pub const fn asc(field: OrderField) -> Self {
		Self {
			field,
			descending: false,
		}
	}

	pub const fn desc(field: OrderField) -> Self {
		Self {
			field,
			descending: true,
		}
	}

	/// Listing order used when none is configured.
	pub fn defaults() -> Vec<OrderKey> {
		vec![
			OrderKey::asc(OrderField::Name),
			OrderKey::desc(OrderField::Created),
		]
	}
}

impl FromStr for OrderKey {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		let (descending, name) = match s.strip_prefix('-') {
			Some(rest) => (true, rest),
			None => (false, s),
		};
		let field = match name {
			"name" => OrderField::Name,
			"created" => OrderField::Created,
			"modified" => OrderField::Modified,
			_ => {
				return Err(ConfigError::invalid_value(
					ORDER_BY_KEY,
					format!("unknown order field '{s}'"),
				))
			}
		};
		Ok(OrderKey { field, descending })
	}
}

impl fmt::Display for OrderKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.descending {
			f.write_str("-")?;
		}
		f.write_str(match self.field {
			OrderField::Name => "name",
			OrderField::Created => "created",
			OrderField::Modified => "modified",
		})
	}
}

/// Filters configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiltersConfig {
	pub view_owner_only: bool,
	pub change_owner_only: bool,
	pub delete_owner_only: bool,
	/// Require a per-filter grant on top of the role permission.
	pub object_grants: bool,
	pub order_by: Vec<OrderKey>,
}

impl Default for FiltersConfig {
	fn default() -> Self {
		Self {
			view_owner_only: true,
			change_owner_only: true,
			delete_owner_only: true,
			object_grants: false,
			order_by: OrderKey::defaults(),
		}
	}
}

/// Filters configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FiltersConfigLayer {
	#[serde(default)]
	pub view_owner_only: Option<bool>,
	#[serde(default)]
	pub change_owner_only: Option<bool>,
	#[serde(default)]
	pub delete_owner_only: Option<bool>,
	#[serde(default)]
	pub object_grants: Option<bool>,
	#[serde(default)]
	pub order_by: Option<Vec<String>>,
}

impl FiltersConfigLayer {
	pub fn merge(&mut self, other: FiltersConfigLayer) {
		if other.view_owner_only.is_some() {
			self.view_owner_only = other.view_owner_only;
		}
		if other.change_owner_only.is_some() {
			self.change_owner_only = other.change_owner_only;
		}
		if other.delete_owner_only.is_some() {
			self.delete_owner_only = other.delete_owner_only;
		}
		if other.object_grants.is_some() {
			self.object_grants = other.object_grants;
		}
		if other.order_by.is_some() {
			self.order_by = other.order_by;
		}
	}

	pub fn finalize(self) -> Result<FiltersConfig, ConfigError> {
		let order_by = match self.order_by {
			Some(entries) if !entries.is_empty() => entries
				.iter()
				.map(|e| e.parse())
				.collect::<Result<Vec<OrderKey>, _>>()?,
			_ => OrderKey::defaults(),
		};

		Ok(FiltersConfig {
			view_owner_only: self.view_owner_only.unwrap_or(true),
			change_owner_only: self.change_owner_only.unwrap_or(true),
			delete_owner_only: self.delete_owner_only.unwrap_or(true),
			object_grants: self.object_grants.unwrap_or(false),
			order_by,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_defaults_are_owner_only_without_grants() {
		let config = FiltersConfigLayer::default().finalize().unwrap();
		assert_eq!(config, FiltersConfig::default());
		assert!(config.view_owner_only && config.change_owner_only && config.delete_owner_only);
		assert!(!config.object_grants);
		assert_eq!(config.order_by, OrderKey::defaults());
	}

	#[test]
	fn test_order_by_parsing() {
		let layer = FiltersConfigLayer {
			order_by: Some(vec!["-modified".to_string(), "name".to_string()]),
			..Default::default()
		};
		let config = layer.finalize().unwrap();
		assert_eq!(
			config.order_by,
			vec![
				OrderKey::desc(OrderField::Modified),
				OrderKey::asc(OrderField::Name)
			]
		);
	}

	#[test]
	fn test_unknown_order_field_is_rejected() {
		let layer = FiltersConfigLayer {
			order_by: Some(vec!["owner".to_string()]),
			..Default::default()
		};
		let err = layer.finalize().unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "filters.order_by"));
	}

	#[test]
	fn test_empty_order_by_uses_defaults() {
		let layer = FiltersConfigLayer {
			order_by: Some(Vec::new()),
			..Default::default()
		};
		assert_eq!(layer.finalize().unwrap().order_by, OrderKey::defaults());
	}

	#[test]
	fn test_merge_overrides_only_set_fields() {
		let mut base = FiltersConfigLayer {
			view_owner_only: Some(false),
			change_owner_only: Some(false),
			..Default::default()
		};
		base.merge(FiltersConfigLayer {
			change_owner_only: Some(true),
			..Default::default()
		});
		assert_eq!(base.view_owner_only, Some(false));
		assert_eq!(base.change_owner_only, Some(true));
	}

	fn order_key() -> impl Strategy<Value = OrderKey> {
		(
			prop::sample::select(vec![OrderField::Name, OrderField::Created, OrderField::Modified]),
			any::<bool>(),
		)
			.prop_map(|(field, descending)| OrderKey { field, descending })
	}

	proptest! {
		#[test]
		fn order_key_display_parses_back(key in order_key()) {
			prop_assert_eq!(key.to_string().parse::<OrderKey>().unwrap(), key);
		}
	}
}
