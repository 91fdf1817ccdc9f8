// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node declaration storage.
//!
//! [`PropertyDictionary`] holds the raw declarations of one origin: the
//! inline overrides of a node, or the merged rules of a [`RuleSnapshot`].
//!
//! # Implementation
//!
//! Longhands are kept in a sorted `SmallVec` with binary search lookup, which
//! stays inline for the handful of properties a typical node declares.
//! Variables and dependent shorthands are ordered maps so iteration is
//! deterministic.
//!
//! [`RuleSnapshot`]: crate::RuleSnapshot

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use smallvec::{SmallVec, smallvec};
use understory_value::{PropertyValue, VariableTerm};

use crate::{
    NameRef, PropertyId, PropertyRegistry, ShorthandId, Specificity, StyleError, StyleKey,
    expand_shorthand,
};

const INLINE_CAPACITY: usize = 8;

/// Content of a longhand slot.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertySlot {
    /// A value, possibly a variable term.
    Value(PropertyValue),
    /// The longhand is filled by a dependent shorthand once it resolves.
    Shorthand(ShorthandId),
}

impl PropertySlot {
    /// The stored value, if the slot is not a shorthand marker.
    #[must_use]
    pub fn value(&self) -> Option<&PropertyValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Shorthand(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Declared<T> {
    value: T,
    specificity: Specificity,
}

/// Keys touched by a declaration.
pub type TouchedKeys = SmallVec<[StyleKey; 5]>;

/// Ordered declarations of one origin.
///
/// Within one dictionary a later declaration replaces an earlier one;
/// [`merge`](Self::merge) additionally honors [`Specificity`].
///
/// ```rust
/// use understory_cascade::{PropertyDictionary, PropertyRegistry, Specificity, props};
///
/// let registry = PropertyRegistry::standard();
/// let mut dict = PropertyDictionary::new();
/// dict.apply_declaration(&registry, "padding", "20px 5px", Specificity::default())
///     .unwrap();
/// dict.apply_declaration(&registry, "--accent", "#ff0000", Specificity::default())
///     .unwrap();
///
/// let right = dict.property(props::PADDING_RIGHT).unwrap();
/// assert_eq!(right.value().unwrap().to_string(), "5px");
/// assert_eq!(dict.variable("--accent").unwrap().to_string(), "#ff0000");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyDictionary {
    properties: SmallVec<[(PropertyId, Declared<PropertySlot>); INLINE_CAPACITY]>,
    variables: BTreeMap<String, Declared<VariableTerm>>,
    shorthands: BTreeMap<ShorthandId, Declared<VariableTerm>>,
}

impl PropertyDictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.variables.is_empty() && self.shorthands.is_empty()
    }

    fn find(&self, id: PropertyId) -> Result<usize, usize> {
        self.properties.binary_search_by_key(&id, |(k, _)| *k)
    }

    /// The slot declared for `id`.
    #[must_use]
    pub fn property(&self, id: PropertyId) -> Option<&PropertySlot> {
        let idx = self.find(id).ok()?;
        Some(&self.properties[idx].1.value)
    }

    /// Specificity of the declaration for `id`.
    #[must_use]
    pub fn property_specificity(&self, id: PropertyId) -> Option<Specificity> {
        let idx = self.find(id).ok()?;
        Some(self.properties[idx].1.specificity)
    }

    /// Declares a longhand value; returns `true` if the slot changed.
    pub fn set_property(&mut self, id: PropertyId, value: PropertyValue) -> bool {
        self.set_slot(id, PropertySlot::Value(value), Specificity::default())
    }

    fn set_slot(&mut self, id: PropertyId, slot: PropertySlot, specificity: Specificity) -> bool {
        let declared = Declared {
            value: slot,
            specificity,
        };
        match self.find(id) {
            Ok(idx) => {
                let changed = self.properties[idx].1.value != declared.value;
                self.properties[idx].1 = declared;
                changed
            }
            Err(idx) => {
                self.properties.insert(idx, (id, declared));
                true
            }
        }
    }

    /// Removes the declaration for `id`, returning the old slot.
    pub fn remove_property(&mut self, id: PropertyId) -> Option<PropertySlot> {
        let idx = self.find(id).ok()?;
        Some(self.properties.remove(idx).1.value)
    }

    /// Iterates over declared longhands in id order.
    pub fn properties(&self) -> impl Iterator<Item = (PropertyId, &PropertySlot)> + '_ {
        self.properties.iter().map(|(id, d)| (*id, &d.value))
    }

    /// The raw term of a variable.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&VariableTerm> {
        self.variables.get(name).map(|d| &d.value)
    }

    /// Declares a variable; returns `true` if the term changed.
    pub fn set_variable(&mut self, name: &str, term: VariableTerm) -> bool {
        self.set_variable_with(name, term, Specificity::default())
    }

    fn set_variable_with(&mut self, name: &str, term: VariableTerm, specificity: Specificity) -> bool {
        let declared = Declared {
            value: term,
            specificity,
        };
        match self.variables.get_mut(name) {
            Some(existing) => {
                let changed = existing.value != declared.value;
                *existing = declared;
                changed
            }
            None => {
                self.variables.insert(name.to_string(), declared);
                true
            }
        }
    }

    /// Removes a variable; returns `true` if it was declared.
    pub fn remove_variable(&mut self, name: &str) -> bool {
        self.variables.remove(name).is_some()
    }

    /// Iterates over declared variables in name order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &VariableTerm)> + '_ {
        self.variables.iter().map(|(k, d)| (k.as_str(), &d.value))
    }

    /// The raw term of a dependent shorthand.
    #[must_use]
    pub fn shorthand(&self, id: ShorthandId) -> Option<&VariableTerm> {
        self.shorthands.get(&id).map(|d| &d.value)
    }

    /// Iterates over dependent shorthands in id order.
    pub fn shorthands(&self) -> impl Iterator<Item = (ShorthandId, &VariableTerm)> + '_ {
        self.shorthands.iter().map(|(k, d)| (*k, &d.value))
    }

    /// Declares a shorthand whose expansion waits for variable substitution.
    ///
    /// Every longhand of the shorthand is occupied by a marker, replacing
    /// earlier declarations of those longhands.
    pub fn set_dependent_shorthand(
        &mut self,
        registry: &PropertyRegistry,
        id: ShorthandId,
        term: VariableTerm,
    ) -> Result<TouchedKeys, StyleError> {
        self.set_dependent_shorthand_with(registry, id, term, Specificity::default())
    }

    fn set_dependent_shorthand_with(
        &mut self,
        registry: &PropertyRegistry,
        id: ShorthandId,
        term: VariableTerm,
        specificity: Specificity,
    ) -> Result<TouchedKeys, StyleError> {
        let def = registry
            .shorthand(id)
            .ok_or_else(|| StyleError::UnknownProperty(alloc::format!("{id:?}")))?;
        let mut touched: TouchedKeys = smallvec![StyleKey::Shorthand(id)];
        for &longhand in def.longhands() {
            self.set_slot(longhand, PropertySlot::Shorthand(id), specificity);
            touched.push(StyleKey::Property(longhand));
        }
        self.shorthands.insert(
            id,
            Declared {
                value: term,
                specificity,
            },
        );
        Ok(touched)
    }

    /// Removes a dependent shorthand and the slots it still occupies.
    pub fn remove_shorthand(&mut self, id: ShorthandId) -> TouchedKeys {
        let mut touched = TouchedKeys::new();
        if self.shorthands.remove(&id).is_none() {
            return touched;
        }
        touched.push(StyleKey::Shorthand(id));
        self.properties.retain(|(prop, d)| {
            let occupied = d.value == PropertySlot::Shorthand(id);
            if occupied {
                touched.push(StyleKey::Property(*prop));
            }
            !occupied
        });
        touched
    }

    /// Parses and records one `name: text` declaration.
    ///
    /// - `--name` declares a variable.
    /// - A longhand is parsed with its grammar; text with `var(` is kept as
    ///   a term.
    /// - A shorthand with literal text is expanded into its longhands at
    ///   once; with `var(` it becomes a dependent shorthand.
    ///
    /// Returns the keys whose declaration changed. On error nothing is
    /// modified.
    pub fn apply_declaration(
        &mut self,
        registry: &PropertyRegistry,
        name: &str,
        text: &str,
        specificity: Specificity,
    ) -> Result<TouchedKeys, StyleError> {
        let name = name.trim();
        if name.starts_with("--") && name.len() > 2 {
            let term = VariableTerm::parse(text.trim())?;
            self.set_variable_with(name, term, specificity);
            return Ok(smallvec![StyleKey::Variable(name.to_string())]);
        }
        match registry.lookup(name) {
            Some(NameRef::Property(id)) => {
                let def = registry
                    .get(id)
                    .ok_or_else(|| StyleError::UnknownProperty(name.to_string()))?;
                let value = def.grammar().parse(text)?;
                self.set_slot(id, PropertySlot::Value(value), specificity);
                Ok(smallvec![StyleKey::Property(id)])
            }
            Some(NameRef::Shorthand(id)) => {
                if VariableTerm::contains_reference(text) {
                    let term = VariableTerm::parse(text.trim())?;
                    return self.set_dependent_shorthand_with(registry, id, term, specificity);
                }
                let def = registry
                    .shorthand(id)
                    .ok_or_else(|| StyleError::UnknownProperty(name.to_string()))?;
                let expansion = expand_shorthand(def, text, registry)?;
                let mut touched = TouchedKeys::new();
                if self.shorthands.remove(&id).is_some() {
                    touched.push(StyleKey::Shorthand(id));
                }
                for (longhand, value) in expansion {
                    self.set_slot(longhand, PropertySlot::Value(value), specificity);
                    touched.push(StyleKey::Property(longhand));
                }
                Ok(touched)
            }
            None => Err(StyleError::UnknownProperty(name.to_string())),
        }
    }

    /// Merges `other` into `self`.
    ///
    /// An incoming declaration replaces an existing one unless the existing
    /// declaration has strictly higher specificity.
    pub fn merge(&mut self, other: &Self) {
        for (id, incoming) in &other.properties {
            let wins = self
                .property_specificity(*id)
                .is_none_or(|existing| incoming.specificity >= existing);
            if wins {
                self.set_slot(*id, incoming.value.clone(), incoming.specificity);
            }
        }
        for (name, incoming) in &other.variables {
            let wins = self
                .variables
                .get(name)
                .is_none_or(|existing| incoming.specificity >= existing.specificity);
            if wins {
                self.variables.insert(name.clone(), incoming.clone());
            }
        }
        for (id, incoming) in &other.shorthands {
            let wins = self
                .shorthands
                .get(id)
                .is_none_or(|existing| incoming.specificity >= existing.specificity);
            if wins {
                self.shorthands.insert(*id, incoming.clone());
            }
        }
        // A shorthand term is only reachable through its markers.
        let live: Vec<ShorthandId> = self
            .properties
            .iter()
            .filter_map(|(_, d)| match d.value {
                PropertySlot::Shorthand(id) => Some(id),
                PropertySlot::Value(_) => None,
            })
            .collect();
        self.shorthands.retain(|id, _| live.contains(id));
    }

    /// Appends every key whose declaration differs between `self` and
    /// `other`. Specificity is ignored.
    pub fn diff_keys(&self, other: &Self, out: &mut Vec<StyleKey>) {
        let ids = self.properties.iter().chain(&other.properties).map(|(id, _)| *id);
        for id in ids {
            let key = StyleKey::Property(id);
            if self.property(id) != other.property(id) && !out.contains(&key) {
                out.push(key);
            }
        }
        let names = self.variables.keys().chain(other.variables.keys());
        for name in names {
            if self.variable(name) != other.variable(name) {
                let key = StyleKey::Variable(name.clone());
                if !out.contains(&key) {
                    out.push(key);
                }
            }
        }
        let shorthands = self.shorthands.keys().chain(other.shorthands.keys());
        for id in shorthands {
            let key = StyleKey::Shorthand(*id);
            if self.shorthand(*id) != other.shorthand(*id) && !out.contains(&key) {
                out.push(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{props, shorthands};
    use understory_value::{Color, Unit};

    fn spec(classes: u16) -> Specificity {
        Specificity::new(classes, 1)
    }

    #[test]
    fn sorted_longhand_storage() {
        let mut dict = PropertyDictionary::new();
        assert!(dict.set_property(props::WIDTH, PropertyValue::px(10.0)));
        assert!(dict.set_property(props::COLOR, Color::WHITE.into()));
        assert!(!dict.set_property(props::COLOR, Color::WHITE.into()));
        let ids: Vec<_> = dict.properties().map(|(id, _)| id).collect();
        assert_eq!(ids, [props::COLOR, props::WIDTH]);
        assert!(dict.remove_property(props::COLOR).is_some());
        assert!(dict.remove_property(props::COLOR).is_none());
    }

    #[test]
    fn literal_shorthand_expands_immediately() {
        let registry = PropertyRegistry::standard();
        let mut dict = PropertyDictionary::new();
        let touched = dict
            .apply_declaration(&registry, "flex", "2 auto", Specificity::default())
            .unwrap();
        assert_eq!(touched.len(), 3);
        assert_eq!(
            dict.property(props::FLEX_GROW),
            Some(&PropertySlot::Value(PropertyValue::numeric(2.0, Unit::NUMBER)))
        );
        assert!(dict.shorthand(shorthands::FLEX).is_none());
    }

    #[test]
    fn dependent_shorthand_occupies_longhands() {
        let registry = PropertyRegistry::standard();
        let mut dict = PropertyDictionary::new();
        let touched = dict
            .apply_declaration(&registry, "padding", "var(--p)", Specificity::default())
            .unwrap();
        assert_eq!(touched.len(), 5);
        assert_eq!(
            dict.property(props::PADDING_LEFT),
            Some(&PropertySlot::Shorthand(shorthands::PADDING))
        );

        // A later longhand replaces one marker only.
        dict.apply_declaration(&registry, "padding-top", "6px", Specificity::default())
            .unwrap();
        assert_eq!(
            dict.property(props::PADDING_TOP).and_then(PropertySlot::value),
            Some(&PropertyValue::px(6.0))
        );

        let removed = dict.remove_shorthand(shorthands::PADDING);
        assert_eq!(removed.len(), 4);
        assert!(dict.property(props::PADDING_LEFT).is_none());
        assert!(dict.property(props::PADDING_TOP).is_some());
    }

    #[test]
    fn literal_shorthand_replaces_dependent_one() {
        let registry = PropertyRegistry::standard();
        let mut dict = PropertyDictionary::new();
        dict.apply_declaration(&registry, "padding", "var(--p)", Specificity::default())
            .unwrap();
        dict.apply_declaration(&registry, "padding", "1px", Specificity::default())
            .unwrap();
        assert!(dict.shorthand(shorthands::PADDING).is_none());
        assert_eq!(
            dict.property(props::PADDING_BOTTOM).and_then(PropertySlot::value),
            Some(&PropertyValue::px(1.0))
        );
    }

    #[test]
    fn errors_leave_dictionary_untouched() {
        let registry = PropertyRegistry::standard();
        let mut dict = PropertyDictionary::new();
        assert!(matches!(
            dict.apply_declaration(&registry, "colour", "red", Specificity::default()),
            Err(StyleError::UnknownProperty(_))
        ));
        assert!(matches!(
            dict.apply_declaration(&registry, "width", "red", Specificity::default()),
            Err(StyleError::Parse(_))
        ));
        assert!(matches!(
            dict.apply_declaration(&registry, "flex", "a b c d", Specificity::default()),
            Err(StyleError::MalformedShorthand { .. })
        ));
        assert!(dict.is_empty());
    }

    #[test]
    fn merge_honors_specificity() {
        let registry = PropertyRegistry::standard();
        let mut strong = PropertyDictionary::new();
        strong
            .apply_declaration(&registry, "padding-top", "9px", spec(2))
            .unwrap();
        strong
            .apply_declaration(&registry, "--x", "1", spec(2))
            .unwrap();

        let mut weak = PropertyDictionary::new();
        weak.apply_declaration(&registry, "padding", "var(--p)", spec(1))
            .unwrap();
        weak.apply_declaration(&registry, "--x", "2", spec(1))
            .unwrap();

        let mut merged = strong.clone();
        merged.merge(&weak);
        assert_eq!(
            merged.property(props::PADDING_TOP).and_then(PropertySlot::value),
            Some(&PropertyValue::px(9.0))
        );
        assert_eq!(
            merged.property(props::PADDING_LEFT),
            Some(&PropertySlot::Shorthand(shorthands::PADDING))
        );
        assert_eq!(merged.variable("--x").unwrap().to_string(), "1");

        // Equal specificity: the incoming declaration wins.
        let mut later = PropertyDictionary::new();
        later
            .apply_declaration(&registry, "--x", "3", spec(2))
            .unwrap();
        merged.merge(&later);
        assert_eq!(merged.variable("--x").unwrap().to_string(), "3");
    }

    #[test]
    fn diff_reports_changed_keys_only() {
        let registry = PropertyRegistry::standard();
        let mut a = PropertyDictionary::new();
        a.apply_declaration(&registry, "color", "red", Specificity::default())
            .unwrap();
        a.apply_declaration(&registry, "--same", "1px", Specificity::default())
            .unwrap();
        let mut b = a.clone();
        b.apply_declaration(&registry, "color", "blue", Specificity::default())
            .unwrap();
        b.apply_declaration(&registry, "--new", "1px", Specificity::default())
            .unwrap();

        let mut keys = Vec::new();
        a.diff_keys(&b, &mut keys);
        keys.sort();
        assert_eq!(
            keys,
            [
                StyleKey::Property(props::COLOR),
                StyleKey::Variable("--new".into())
            ]
        );
    }
}
