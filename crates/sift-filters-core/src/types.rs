// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identifier and vocabulary types shared by every Sift crate.
//!
//! - **ID newtypes**: [`FilterId`], [`UserId`], [`GroupId`] wrap UUIDs so they
//!   cannot be mixed up
//! - [`ModelId`]: names the data model a filter targets (`app.model`)
//! - [`FilterAction`]: the operations an actor can attempt on a saved filter
//! - [`Principal`]: the subject of an object-level grant

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ParseActionError;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(FilterId, "Unique identifier for a saved filter.");
define_id_type!(UserId, "Unique identifier for a user.");
define_id_type!(GroupId, "Unique identifier for a group of users.");

// =============================================================================
// Model identifiers
// =============================================================================

/// Identifies the data model a filter applies to, e.g. `core.product`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ModelId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ModelId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

// =============================================================================
// Actions
// =============================================================================

/// Operations that can be performed on a saved filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterAction {
	View,
	Change,
	Delete,
}

impl FilterAction {
	/// Returns all actions.
	pub fn all() -> &'static [FilterAction] {
		&[FilterAction::View, FilterAction::Change, FilterAction::Delete]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			FilterAction::View => "view",
			FilterAction::Change => "change",
			FilterAction::Delete => "delete",
		}
	}
}

impl fmt::Display for FilterAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for FilterAction {
	type Err = ParseActionError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"view" => Ok(FilterAction::View),
			"change" => Ok(FilterAction::Change),
			"delete" => Ok(FilterAction::Delete),
			other => Err(ParseActionError(other.to_string())),
		}
	}
}

// =============================================================================
// Principals
// =============================================================================

/// The subject of an object-level grant: exactly one user or one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Principal {
	User(UserId),
	Group(GroupId),
}

impl Principal {
	/// Storage discriminator for the principal kind.
	pub fn kind(&self) -> &'static str {
		match self {
			Principal::User(_) => "user",
			Principal::Group(_) => "group",
		}
	}

	pub fn id(&self) -> Uuid {
		match self {
			Principal::User(id) => id.into_inner(),
			Principal::Group(id) => id.into_inner(),
		}
	}
}

impl fmt::Display for Principal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.kind(), self.id())
	}
}
