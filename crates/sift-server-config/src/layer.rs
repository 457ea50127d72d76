// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration as read from one source.

use serde::Deserialize;

use crate::sections::{DatabaseConfigLayer, FiltersConfigLayer, LoggingConfigLayer};

/// One source's view of the configuration. Unset sections are `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub filters: Option<FiltersConfigLayer>,
}

impl ServerConfigLayer {
	/// Overlays `other` on top of `self`; set values in `other` win.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_section(&mut self.filters, other.filters, FiltersConfigLayer::merge);
	}
}

fn merge_section<T>(current: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (current.as_mut(), other) {
		(Some(current), Some(other)) => merge(current, other),
		(None, Some(other)) => *current = Some(other),
		(_, None) => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn later_layer_wins() {
		let mut base: ServerConfigLayer = toml::from_str(
			r#"
			[database]
			url = "sqlite:/var/lib/sift/a.db"

			[filters]
			view_owner_only = false
			"#,
		)
		.unwrap();
		let top: ServerConfigLayer = toml::from_str(
			r#"
			[filters]
			object_grants = true
			"#,
		)
		.unwrap();
		base.merge(top);

		let filters = base.filters.unwrap();
		assert_eq!(filters.view_owner_only, Some(false));
		assert_eq!(filters.object_grants, Some(true));
		assert_eq!(
			base.database.unwrap().url.as_deref(),
			Some("sqlite:/var/lib/sift/a.db")
		);
	}

	#[test]
	fn missing_sections_stay_unset() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer::default());
		assert!(base.database.is_none());
		assert!(base.logging.is_none());
		assert!(base.filters.is_none());
	}
}
