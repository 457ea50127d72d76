// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attributes consumed by the permission resolver.
//!
//! - [`Actor`]: who is asking, with group memberships and the superuser flag
//! - [`FilterAttrs`]: the parts of a saved filter that authorization reads
//! - [`Decision`]: the outcome of one policy layer
//! - [`OwnerOnlyPolicy`]: process-wide owner-only flags, one per action

use serde::{Deserialize, Serialize};
use sift_filters_core::{Filter, FilterAction, FilterId, GroupId, ModelId, Principal, UserId};

/// The user making a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
	pub user_id: UserId,
	pub groups: Vec<GroupId>,
	pub is_superuser: bool,
}

impl Actor {
	pub fn new(user_id: UserId) -> Self {
		Self {
			user_id,
			groups: Vec::new(),
			is_superuser: false,
		}
	}

	pub fn superuser(user_id: UserId) -> Self {
		Self {
			is_superuser: true,
			..Self::new(user_id)
		}
	}

	/// Builder: add group memberships.
	pub fn with_groups(mut self, groups: impl IntoIterator<Item = GroupId>) -> Self {
		self.groups.extend(groups);
		self
	}

	/// The actor's own user principal followed by each of its groups.
	pub fn principals(&self) -> Vec<Principal> {
		std::iter::once(Principal::User(self.user_id))
			.chain(self.groups.iter().copied().map(Principal::Group))
			.collect()
	}
}

/// Attributes of a saved filter needed for authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterAttrs {
	pub filter_id: FilterId,
	pub model: ModelId,
	pub owner: Option<UserId>,
}

impl From<&Filter> for FilterAttrs {
	fn from(filter: &Filter) -> Self {
		Self {
			filter_id: filter.id,
			model: filter.model.clone(),
			owner: filter.owner,
		}
	}
}

/// Final outcome of an authorization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
	Allow,
	Deny,
}

impl Access {
	pub fn is_allowed(&self) -> bool {
		matches!(self, Access::Allow)
	}
}

/// Outcome of a single policy layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	Allow,
	Deny,
	/// The layer does not apply; the next layer decides.
	Continue,
}

impl Decision {
	pub fn settle(self) -> Option<Access> {
		match self {
			Decision::Allow => Some(Access::Allow),
			Decision::Deny => Some(Access::Deny),
			Decision::Continue => None,
		}
	}
}

/// Which actions are restricted to a filter's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerOnlyPolicy {
	pub view: bool,
	pub change: bool,
	pub delete: bool,
}

impl Default for OwnerOnlyPolicy {
	fn default() -> Self {
		Self {
			view: true,
			change: true,
			delete: true,
		}
	}
}

impl OwnerOnlyPolicy {
	/// No action is owner-only.
	pub fn shared() -> Self {
		Self {
			view: false,
			change: false,
			delete: false,
		}
	}

	pub fn applies_to(&self, action: FilterAction) -> bool {
		match action {
			FilterAction::View => self.view,
			FilterAction::Change => self.change,
			FilterAction::Delete => self.delete,
		}
	}
}
