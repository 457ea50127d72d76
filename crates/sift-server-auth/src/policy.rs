// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The policy layers, in evaluation order.
//!
//! Each layer is a pure function returning a [`Decision`]. The first layer
//! that does not return [`Decision::Continue`] decides.

use sift_filters_core::{FilterAction, UserId};

use crate::types::{Actor, Decision, OwnerOnlyPolicy};

/// Names a policy layer in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
	Superuser,
	Owner,
	OwnerOnly,
	Role,
	Grant,
}

impl Layer {
	pub fn as_str(&self) -> &'static str {
		match self {
			Layer::Superuser => "superuser",
			Layer::Owner => "owner",
			Layer::OwnerOnly => "owner_only",
			Layer::Role => "role",
			Layer::Grant => "grant",
		}
	}
}

pub fn check_superuser(actor: &Actor) -> Decision {
	if actor.is_superuser {
		Decision::Allow
	} else {
		Decision::Continue
	}
}

/// Owners may perform every action regardless of policy flags.
pub fn check_ownership(actor: &Actor, owner: UserId) -> Decision {
	if actor.user_id == owner {
		Decision::Allow
	} else {
		Decision::Continue
	}
}

pub fn check_owner_only(policy: &OwnerOnlyPolicy, action: FilterAction) -> Decision {
	if policy.applies_to(action) {
		Decision::Deny
	} else {
		Decision::Continue
	}
}

pub fn check_role(has_permission: bool) -> Decision {
	if has_permission {
		Decision::Continue
	} else {
		Decision::Deny
	}
}

/// Last layer: always decides.
pub fn check_grant(granted: bool) -> Decision {
	if granted {
		Decision::Allow
	} else {
		Decision::Deny
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn superuser_allows() {
		let actor = Actor::superuser(UserId::generate());
		assert_eq!(check_superuser(&actor), Decision::Allow);
		assert_eq!(
			check_superuser(&Actor::new(UserId::generate())),
			Decision::Continue
		);
	}

	#[test]
	fn ownership_allows_only_the_owner() {
		let owner = UserId::generate();
		assert_eq!(check_ownership(&Actor::new(owner), owner), Decision::Allow);
		assert_eq!(
			check_ownership(&Actor::new(UserId::generate()), owner),
			Decision::Continue
		);
	}

	#[test]
	fn owner_only_flag_denies() {
		let policy = OwnerOnlyPolicy {
			view: false,
			change: true,
			delete: true,
		};
		assert_eq!(check_owner_only(&policy, FilterAction::View), Decision::Continue);
		assert_eq!(check_owner_only(&policy, FilterAction::Change), Decision::Deny);
	}

	#[test]
	fn role_never_allows_on_its_own() {
		assert_eq!(check_role(true), Decision::Continue);
		assert_eq!(check_role(false), Decision::Deny);
	}

	#[test]
	fn grant_always_decides() {
		assert_eq!(check_grant(true), Decision::Allow);
		assert_eq!(check_grant(false), Decision::Deny);
	}
}
