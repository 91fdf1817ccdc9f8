// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Class lists and pseudo-class state.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Ordered set of class names.
///
/// Insertion order is preserved and duplicates are rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassList {
    names: Vec<String>,
}

impl ClassList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or removes `name`; returns `true` if membership changed.
    pub fn set_class(&mut self, name: &str, activate: bool) -> bool {
        let pos = self.names.iter().position(|n| n == name);
        match (pos, activate) {
            (None, true) => {
                self.names.push(name.to_string());
                true
            }
            (Some(idx), false) => {
                self.names.remove(idx);
                true
            }
            _ => false,
        }
    }

    /// Replaces the list with the space separated names in `text`.
    ///
    /// Returns `false` when the resulting list is identical.
    pub fn set_class_names(&mut self, text: &str) -> bool {
        let mut names: Vec<String> = Vec::new();
        for name in text.split_whitespace() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        if names == self.names {
            return false;
        }
        self.names = names;
        true
    }

    /// Returns `true` if `name` is in the list.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// The names joined with single spaces.
    #[must_use]
    pub fn class_names(&self) -> String {
        self.names.join(" ")
    }

    /// Iterates over names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// State of one pseudo-class.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PseudoClassState {
    /// Not active.
    #[default]
    Clear,
    /// Active through normal interaction.
    Set,
    /// Forced active; only cleared by another override.
    Override,
}

/// Pseudo-class name to [`PseudoClassState`].
///
/// ```rust
/// use understory_cascade::PseudoClassMap;
///
/// let mut map = PseudoClassMap::new();
/// assert!(map.set_pseudo_class("hover", true, true));
/// // A normal clear does not touch an override.
/// assert!(!map.set_pseudo_class("hover", false, false));
/// assert!(map.is_pseudo_class_set("hover"));
/// assert!(map.set_pseudo_class("hover", false, true));
/// assert!(!map.is_pseudo_class_set("hover"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PseudoClassMap {
    states: BTreeMap<String, PseudoClassState>,
}

impl PseudoClassMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates or clears `name`.
    ///
    /// With `override_state`, the state becomes [`PseudoClassState::Override`]
    /// or returns to [`PseudoClassState::Clear`]. Without it, the state toggles
    /// between `Set` and `Clear` but an existing override is left alone.
    /// Returns `true` if the effective active state changed.
    pub fn set_pseudo_class(&mut self, name: &str, activate: bool, override_state: bool) -> bool {
        let old = self.state(name);
        let new = match (override_state, activate) {
            (true, true) => PseudoClassState::Override,
            (true, false) => PseudoClassState::Clear,
            (false, _) if old == PseudoClassState::Override => return false,
            (false, true) => PseudoClassState::Set,
            (false, false) => PseudoClassState::Clear,
        };
        if new == PseudoClassState::Clear {
            self.states.remove(name);
        } else {
            self.states.insert(name.to_string(), new);
        }
        (old != PseudoClassState::Clear) != (new != PseudoClassState::Clear)
    }

    /// Stored state of `name`.
    #[must_use]
    pub fn state(&self, name: &str) -> PseudoClassState {
        self.states.get(name).copied().unwrap_or_default()
    }

    /// Returns `true` if `name` is effectively active.
    #[must_use]
    pub fn is_pseudo_class_set(&self, name: &str) -> bool {
        self.state(name) != PseudoClassState::Clear
    }

    /// Iterates over active pseudo-classes in name order.
    pub fn active(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_list_keeps_order_and_rejects_duplicates() {
        let mut list = ClassList::new();
        assert!(list.set_class("b", true));
        assert!(list.set_class("a", true));
        assert!(!list.set_class("b", true));
        assert_eq!(list.class_names(), "b a");
        assert!(list.set_class("b", false));
        assert!(!list.set_class("b", false));
        assert_eq!(list.class_names(), "a");
    }

    #[test]
    fn set_class_names_is_noop_for_identical_content() {
        let mut list = ClassList::new();
        assert!(list.set_class_names("x  y x"));
        assert_eq!(list.class_names(), "x y");
        assert!(!list.set_class_names(" x y "));
        assert!(list.set_class_names("y x"));
        assert!(list.set_class_names(""));
        assert!(list.is_empty());
    }

    #[test]
    fn pseudo_class_states() {
        let mut map = PseudoClassMap::new();
        assert!(map.set_pseudo_class("active", true, false));
        assert_eq!(map.state("active"), PseudoClassState::Set);
        // Upgrading to an override does not change the effective state.
        assert!(!map.set_pseudo_class("active", true, true));
        assert_eq!(map.state("active"), PseudoClassState::Override);
        assert!(!map.set_pseudo_class("active", false, false));
        assert!(map.set_pseudo_class("active", false, true));
        assert_eq!(map.state("active"), PseudoClassState::Clear);
        assert_eq!(map.active().count(), 0);
    }
}
