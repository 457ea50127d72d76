// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Saved model filters for Sift.
//!
//! A [`Filter`] is an ordered list of [`Rule`]s over one data model. The
//! [`RuleEngine`] validates those rules against a [`FieldCatalog`] and the
//! shared [`OperatorCatalog`], then compiles them into a [`Predicate`]: an OR
//! of AND-groups, split wherever an OR marker appears.
//!
//! ```
//! use sift_filters_core::{
//!     compile, FieldDef, MemoryStore, ModelId, ModelSchema, Operator, Record, Rule,
//!     StaticFieldCatalog,
//! };
//!
//! let catalog = StaticFieldCatalog::new().with_model(
//!     ModelSchema::new("core.ticket")
//!         .field(FieldDef::choice("status", [("open", "Open"), ("closed", "Closed")]))
//!         .field(FieldDef::number("priority")),
//! );
//! let model = ModelId::from("core.ticket");
//! let rules = vec![
//!     Rule::condition("status", Operator::Exact, "open"),
//!     Rule::OrGroup,
//!     Rule::condition("priority", Operator::Gt, "5"),
//! ];
//! let predicate = compile(&model, &rules, &catalog).unwrap();
//!
//! let store = MemoryStore::new()
//!     .with_record("core.ticket", Record::new("1").with("status", "closed").with("priority", 9i64))
//!     .with_record("core.ticket", Record::new("2").with("status", "closed").with("priority", 1i64));
//! assert_eq!(store.query(&model, &predicate).len(), 1);
//! ```

pub mod catalog;
pub mod editor;
pub mod engine;
pub mod error;
pub mod filter;
pub mod operator;
pub mod predicate;
pub mod record;
pub mod types;
pub mod value;

pub use catalog::{
	ChoiceOption, FieldCatalog, FieldCategory, FieldDef, FieldDescriptor, ModelSchema, PathStep,
	ResolvedField, StaticFieldCatalog, PATH_SEPARATOR,
};
pub use editor::{field_data, Choice, FieldData, RuleInputs, OR_MARKER_LABEL};
pub use engine::{compile, RuleEngine};
pub use error::{CatalogError, CompileErrors, ParseActionError, Result, RuleError, RuleViolation};
pub use filter::{Condition, Filter, Grant, Rule, StoredRule, OR_MARKER};
pub use operator::{Operator, OperatorCatalog, OperatorDef};
pub use predicate::{Atom, ConditionGroup, Lookup, Pattern, Predicate};
pub use record::{FieldValue, MemoryStore, Record};
pub use types::{FilterAction, FilterId, GroupId, ModelId, Principal, UserId};
pub use value::Value;
