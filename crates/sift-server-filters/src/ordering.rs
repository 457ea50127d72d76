// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sort order for filter listings.

use sift_filters_core::Filter;
use sift_server_config::{OrderField, OrderKey};
use std::cmp::Ordering;

/// Applies configured [`OrderKey`]s in sequence. Remaining ties fall back to
/// the filter id so listings are stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOrdering {
	keys: Vec<OrderKey>,
}

impl Default for FilterOrdering {
	fn default() -> Self {
		Self::new(OrderKey::defaults())
	}
}

impl FilterOrdering {
	/// An empty key list means the default order.
	pub fn new(keys: Vec<OrderKey>) -> Self {
		if keys.is_empty() {
			return Self::default();
		}
		Self { keys }
	}

	pub fn keys(&self) -> &[OrderKey] {
		&self.keys
	}

	pub fn compare(&self, a: &Filter, b: &Filter) -> Ordering {
		self
			.keys
			.iter()
			.map(|key| {
				let ord = compare_field(key.field, a, b);
				if key.descending {
					ord.reverse()
				} else {
					ord
				}
			})
			.find(|ord| ord.is_ne())
			.unwrap_or_else(|| a.id.cmp(&b.id))
	}

	pub fn sort(&self, filters: &mut [Filter]) {
		filters.sort_by(|a, b| self.compare(a, b));
	}
}

fn compare_field(field: OrderField, a: &Filter, b: &Filter) -> Ordering {
	match field {
		// `None` sorts before `Some`, so unnamed filters come first.
		OrderField::Name => sort_name(a).cmp(&sort_name(b)),
		OrderField::Created => a.created_at.cmp(&b.created_at),
		OrderField::Modified => a.updated_at.cmp(&b.updated_at),
	}
}

fn sort_name(filter: &Filter) -> Option<String> {
	filter
		.name
		.as_deref()
		.filter(|name| !name.is_empty())
		.map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, Utc};
	use sift_filters_core::{ModelId, UserId};

	fn filter(name: Option<&str>, age_minutes: i64) -> Filter {
		let mut filter = Filter::new(ModelId::from("core.ticket"), UserId::generate());
		filter.name = name.map(str::to_string);
		filter.created_at = Utc::now() - Duration::minutes(age_minutes);
		filter.updated_at = filter.created_at;
		filter
	}

	fn names(filters: &[Filter]) -> Vec<Option<&str>> {
		filters.iter().map(|f| f.name.as_deref()).collect()
	}

	#[test]
	fn default_is_name_then_newest() {
		let mut filters = vec![
			filter(Some("beta"), 0),
			filter(None, 10),
			filter(Some("Alpha"), 5),
			filter(None, 1),
			filter(Some("alpha"), 1),
		];
		FilterOrdering::default().sort(&mut filters);

		assert_eq!(
			names(&filters),
			vec![None, None, Some("alpha"), Some("Alpha"), Some("beta")]
		);
		// Unnamed ties break on creation time, newest first.
		assert!(filters[0].created_at > filters[1].created_at);
	}

	#[test]
	fn descending_name_puts_unnamed_last() {
		let mut filters = vec![filter(None, 0), filter(Some("a"), 0), filter(Some("B"), 0)];
		FilterOrdering::new(vec![OrderKey::desc(OrderField::Name)]).sort(&mut filters);
		assert_eq!(names(&filters), vec![Some("B"), Some("a"), None]);
	}

	#[test]
	fn modified_ascending() {
		let mut old = filter(Some("x"), 0);
		old.updated_at = Utc::now() - Duration::days(1);
		let fresh = filter(Some("y"), 30);
		let mut filters = vec![fresh, old];
		FilterOrdering::new(vec![OrderKey::asc(OrderField::Modified)]).sort(&mut filters);
		assert_eq!(names(&filters), vec![Some("x"), Some("y")]);
	}

	#[test]
	fn empty_keys_fall_back_to_default() {
		assert_eq!(FilterOrdering::new(Vec::new()), FilterOrdering::default());
	}
}
