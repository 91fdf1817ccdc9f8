// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Cascade: per-node style resolution with custom variables.
//!
//! This crate keeps the style state of each node in a tree and turns it into
//! computed values, redoing only the work an edit invalidated. Values and
//! their text codec come from `understory_value`; dependency graphs and
//! dirty sets come from `understory_dirty`.
//!
//! ## Core Concepts
//!
//! ### Declarations
//!
//! A node has two origins of declarations, each a [`PropertyDictionary`]:
//!
//! - **Inline** - overrides set directly on the node; they always win.
//! - **Rules** - the [`RuleSnapshot`] a [`RuleMatcher`] (such as
//!   [`StyleSheet`]) returns for the node's tag, classes and pseudo-classes.
//!
//! A declaration is a longhand value, a `--name` custom variable holding an
//! unresolved [`VariableTerm`](understory_value::VariableTerm), or a
//! shorthand. Shorthands with literal text expand immediately; shorthands
//! whose text contains `var()` are kept as dependent shorthands and expanded
//! after substitution.
//!
//! ### Resolution
//!
//! [`ElementStyle::compute_values`] runs one pass over dirty keys:
//!
//! 1. match rules again if classes, pseudo-classes or the style version
//!    changed,
//! 2. substitute dirty variables, looking in the node and then its
//!    ancestors,
//! 3. expand dirty dependent shorthands,
//! 4. resolve dirty properties and compute them, `font-size` first.
//!
//! Every resolution records which keys it consulted, so the next edit marks
//! exactly the keys that depended on it. Cycles between variables and
//! missing variables become [`StyleDiagnostic`]s; the affected property keeps
//! its previous computed value.
//!
//! ### Documents
//!
//! [`StyleDocument`] owns a node arena, a registry, a style sheet and the
//! viewport, and updates the whole tree top-down, pushing inherited changes
//! to children.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_cascade::{ComputedValue, PropertyRegistry, StyleDocument, StyleSheet, props};
//!
//! let registry = PropertyRegistry::standard();
//! let sheet = StyleSheet::parse(
//!     &registry,
//!     "body { --space: 4px; font-size: 10px }
//!      .card { padding: var(--space) 2em; flex: 2 }",
//! )
//! .unwrap();
//! let mut doc = StyleDocument::new(registry, sheet);
//! let card = doc.append_child(doc.root(), "div");
//! doc.set_class(card, "card", true);
//! doc.update();
//!
//! assert_eq!(doc.computed(card, props::PADDING_TOP), Some(&ComputedValue::Length(4.0)));
//! assert_eq!(doc.computed(card, props::PADDING_LEFT), Some(&ComputedValue::Length(20.0)));
//! assert_eq!(doc.computed(card, props::FLEX_GROW), Some(&ComputedValue::Number(2.0)));
//!
//! // Only what depended on `--space` changes.
//! doc.set_property(doc.root(), "--space", "6px").unwrap();
//! let report = doc.update();
//! let changed = &report.node(card).unwrap().changed_properties;
//! assert!(changed.contains(props::PADDING_TOP));
//! assert!(!changed.contains(props::PADDING_LEFT));
//! ```
//!
//! ## Logging
//!
//! Diagnostics are returned from every compute pass and also logged through
//! the `log` facade at `warn` level. Pass summaries are logged at `debug`
//! and `trace`. No logger is installed by this crate.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. Enable the `libm` feature (and
//! disable `std`) to build Kurbo without `std`.

#![no_std]

extern crate alloc;

mod classes;
mod computed;
mod dictionary;
mod document;
mod element;
mod error;
mod id;
mod length;
mod registry;
mod resolve;
mod sheet;
mod shorthand;
mod snapshot;

pub use classes::{ClassList, PseudoClassMap, PseudoClassState};
pub use computed::{ComputedValue, ComputedValues};
pub use dictionary::{PropertyDictionary, PropertySlot, TouchedKeys};
pub use document::{NodeId, StyleDocument, UpdateReport};
pub use element::{ComputeContext, ComputeOutput, ElementStyle, NodeLookup, ancestors};
pub use error::{StyleDiagnostic, StyleError};
pub use id::{PropertyId, PropertyIdSet, ShorthandId, StyleKey};
pub use length::LengthContext;
pub use registry::{
    ChangeChannels, NameRef, PropertyDefinition, PropertyDefinitionBuilder, PropertyRegistry,
    RelativeTarget, ShorthandDefinition, ShorthandKind, props, shorthands,
};
pub use sheet::{RuleMatcher, Selector, Specificity, StyleSheet};
pub use shorthand::{Expansion, expand_shorthand};
pub use snapshot::RuleSnapshot;
