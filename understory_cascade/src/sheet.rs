// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A minimal style sheet and rule matcher.
//!
//! Selectors are compound: an optional tag (or `*`), any number of `.class`
//! and `:pseudo` parts. Comma separated lists declare one rule per selector.
//! There are no combinators.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use hashbrown::HashMap;
use understory_value::ParseError;

use crate::{ClassList, PropertyDictionary, PropertyRegistry, PseudoClassMap, RuleSnapshot, StyleError};

/// Weight of a selector. Compared class count first, then tag count.
///
/// Pseudo-classes count as classes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Specificity {
    classes: u16,
    tags: u16,
}

impl Specificity {
    /// Creates a specificity from its counts.
    #[inline]
    #[must_use]
    pub const fn new(classes: u16, tags: u16) -> Self {
        Self { classes, tags }
    }
}

/// Produces the merged declarations matching a node.
pub trait RuleMatcher {
    /// Merges every rule that matches a node with the given tag, classes
    /// and active pseudo-classes.
    fn match_rules(&self, tag: &str, classes: &ClassList, pseudos: &PseudoClassMap) -> RuleSnapshot;
}

/// A compound selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    classes: Vec<String>,
    pseudos: Vec<String>,
}

impl Selector {
    /// Parses one compound selector such as `div.active:hover` or `*`.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.trim();
        if text.is_empty() || text.contains(char::is_whitespace) {
            return Err(ParseError::new("unsupported selector", text));
        }
        let split = text.find(['.', ':']).unwrap_or(text.len());
        let tag = match &text[..split] {
            "" | "*" => None,
            tag => Some(tag.to_ascii_lowercase()),
        };
        let mut selector = Self {
            tag,
            classes: Vec::new(),
            pseudos: Vec::new(),
        };
        let mut rest = &text[split..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['.', ':']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return Err(ParseError::new("empty selector part", text));
            }
            if marker == '.' {
                selector.classes.push(name.to_string());
            } else {
                selector.pseudos.push(name.to_string());
            }
            rest = &body[end..];
        }
        Ok(selector)
    }

    /// Weight of this selector.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        let classes = self.classes.len() + self.pseudos.len();
        Specificity::new(
            u16::try_from(classes).unwrap_or(u16::MAX),
            u16::from(self.tag.is_some()),
        )
    }

    /// Returns `true` if a node with the given state matches.
    #[must_use]
    pub fn matches(&self, tag: &str, classes: &ClassList, pseudos: &PseudoClassMap) -> bool {
        self.tag.as_deref().is_none_or(|t| t.eq_ignore_ascii_case(tag))
            && self.classes.iter().all(|c| classes.contains(c))
            && self.pseudos.iter().all(|p| pseudos.is_pseudo_class_set(p))
    }
}

#[derive(Clone, Debug)]
struct StyleRule {
    selector: Selector,
    specificity: Specificity,
    declarations: PropertyDictionary,
}

/// Rules in source order with a cache of merged snapshots.
///
/// ```rust
/// use understory_cascade::{ClassList, PropertyRegistry, PseudoClassMap, RuleMatcher, StyleSheet, props};
///
/// let registry = PropertyRegistry::standard();
/// let sheet = StyleSheet::parse(
///     &registry,
///     "div { color: red } div.on { color: blue } * { --x: 1px }",
/// )
/// .unwrap();
///
/// let mut classes = ClassList::new();
/// classes.set_class("on", true);
/// let snapshot = sheet.match_rules("div", &classes, &PseudoClassMap::new());
/// let color = snapshot.declarations().property(props::COLOR).unwrap();
/// assert_eq!(color.value().unwrap().to_string(), "#0000ff");
/// assert!(snapshot.declarations().variable("--x").is_some());
/// ```
#[derive(Debug, Default)]
pub struct StyleSheet {
    rules: Vec<StyleRule>,
    cache: RefCell<HashMap<String, RuleSnapshot>>,
}

impl StyleSheet {
    /// Creates an empty sheet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `selector-list { declarations }` blocks.
    ///
    /// The last declaration of a block may omit its `;`.
    pub fn parse(registry: &PropertyRegistry, text: &str) -> Result<Self, StyleError> {
        let mut sheet = Self::new();
        let mut rest = text;
        loop {
            let trimmed = rest.trim_start();
            if trimmed.is_empty() {
                break;
            }
            let open = trimmed
                .find('{')
                .ok_or_else(|| ParseError::new("expected `{`", trimmed))?;
            let close = trimmed[open..]
                .find('}')
                .map(|i| open + i)
                .ok_or_else(|| ParseError::new("expected `}`", trimmed))?;
            sheet.add_rule(registry, &trimmed[..open], &trimmed[open + 1..close])?;
            rest = &trimmed[close + 1..];
        }
        Ok(sheet)
    }

    /// Appends a rule for each selector in a comma separated list.
    ///
    /// On error the sheet is unchanged.
    pub fn add_rule(
        &mut self,
        registry: &PropertyRegistry,
        selectors: &str,
        declarations: &str,
    ) -> Result<(), StyleError> {
        let mut added = Vec::new();
        for selector in selectors.split(',') {
            let selector = Selector::parse(selector)?;
            let specificity = selector.specificity();
            let mut dict = PropertyDictionary::new();
            for declaration in split_declarations(declarations) {
                let (name, value) = declaration
                    .split_once(':')
                    .ok_or_else(|| ParseError::new("expected `name: value`", declaration))?;
                dict.apply_declaration(registry, name, value, specificity)?;
            }
            added.push(StyleRule {
                selector,
                specificity,
                declarations: dict,
            });
        }
        self.rules.extend(added);
        self.cache.get_mut().clear();
        Ok(())
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the sheet has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleMatcher for StyleSheet {
    fn match_rules(&self, tag: &str, classes: &ClassList, pseudos: &PseudoClassMap) -> RuleSnapshot {
        let mut key = tag.to_ascii_lowercase();
        let mut sorted: Vec<&str> = classes.iter().collect();
        sorted.sort_unstable();
        for class in sorted {
            key.push('.');
            key.push_str(class);
        }
        for pseudo in pseudos.active() {
            key.push(':');
            key.push_str(pseudo);
        }
        if let Some(hit) = self.cache.borrow().get(&key) {
            return hit.clone();
        }

        let mut matched: Vec<(Specificity, usize)> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.selector.matches(tag, classes, pseudos))
            .map(|(order, rule)| (rule.specificity, order))
            .collect();
        matched.sort_unstable();
        let mut merged = PropertyDictionary::new();
        for (_, order) in matched {
            merged.merge(&self.rules[order].declarations);
        }
        let snapshot = RuleSnapshot::new(merged);
        self.cache.borrow_mut().insert(key, snapshot.clone());
        snapshot
    }
}

/// Splits a declaration block on `;` outside quotes and parentheses.
fn split_declarations(block: &str) -> impl Iterator<Item = &str> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut quote = None;
    let mut start = 0;
    for (i, c) in block.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&block[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&block[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PropertySlot, props};

    #[test]
    fn selector_parts_and_specificity() {
        let sel = Selector::parse("div.a.b:hover").unwrap();
        assert_eq!(sel.specificity(), Specificity::new(3, 1));
        assert_eq!(Selector::parse("*").unwrap().specificity(), Specificity::default());
        assert_eq!(Selector::parse(".x").unwrap().specificity(), Specificity::new(1, 0));
        assert!(Selector::parse("div p").is_err());
        assert!(Selector::parse("div.").is_err());
        assert!(Specificity::new(1, 0) > Specificity::new(0, 5));
    }

    #[test]
    fn selector_matching() {
        let sel = Selector::parse("p.note:active").unwrap();
        let mut classes = ClassList::new();
        let mut pseudos = PseudoClassMap::new();
        classes.set_class("note", true);
        assert!(!sel.matches("p", &classes, &pseudos));
        pseudos.set_pseudo_class("active", true, false);
        assert!(sel.matches("P", &classes, &pseudos));
        assert!(!sel.matches("div", &classes, &pseudos));
    }

    #[test]
    fn later_rule_wins_at_equal_specificity() {
        let registry = PropertyRegistry::standard();
        let sheet = StyleSheet::parse(
            &registry,
            "p { padding-top: 1px; } .a { padding-top: 2px } p { padding-top: 3px }",
        )
        .unwrap();
        assert_eq!(sheet.len(), 3);

        let mut classes = ClassList::new();
        let pseudos = PseudoClassMap::new();
        let plain = sheet.match_rules("p", &classes, &pseudos);
        let top = |s: &RuleSnapshot| {
            s.declarations()
                .property(props::PADDING_TOP)
                .and_then(PropertySlot::value)
                .map(ToString::to_string)
        };
        assert_eq!(top(&plain).as_deref(), Some("3px"));

        classes.set_class("a", true);
        let classed = sheet.match_rules("p", &classes, &pseudos);
        assert_eq!(top(&classed).as_deref(), Some("2px"));
    }

    #[test]
    fn snapshots_are_cached_per_state() {
        let registry = PropertyRegistry::standard();
        let sheet = StyleSheet::parse(&registry, "div { color: red }").unwrap();
        let classes = ClassList::new();
        let pseudos = PseudoClassMap::new();
        let a = sheet.match_rules("div", &classes, &pseudos);
        let b = sheet.match_rules("div", &classes, &pseudos);
        assert!(a.ptr_eq(&b));
        assert!(sheet.match_rules("span", &classes, &pseudos).declarations().is_empty());
    }

    #[test]
    fn parse_errors() {
        let registry = PropertyRegistry::standard();
        assert!(StyleSheet::parse(&registry, "div { color: red").is_err());
        assert!(StyleSheet::parse(&registry, "div { colour: red }").is_err());
        assert!(StyleSheet::parse(&registry, "div { color }").is_err());
        let sheet = StyleSheet::parse(&registry, "a, b { --v: rgba(1, 2, 3; 4) }");
        assert!(sheet.is_ok_and(|s| s.len() == 2));
    }
}
