// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;

use crate::PropertyDictionary;

/// Shared, immutable result of matching rules against a node.
///
/// Snapshots are never mutated. A node whose matching rules change swaps in
/// a new snapshot and diffs it against the old one.
#[derive(Clone, Debug, Default)]
pub struct RuleSnapshot {
    inner: Rc<PropertyDictionary>,
}

impl RuleSnapshot {
    /// Wraps merged declarations.
    #[must_use]
    pub fn new(declarations: PropertyDictionary) -> Self {
        Self {
            inner: Rc::new(declarations),
        }
    }

    /// A snapshot with no declarations.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The merged declarations.
    #[must_use]
    pub fn declarations(&self) -> &PropertyDictionary {
        &self.inner
    }

    /// Returns `true` if both snapshots share the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
