// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-node style record and its compute pass.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use kurbo::Size;
use log::{debug, trace};
use understory_dirty::{DependencyGraph, DirtyFlags, DirtySet};
use understory_value::{PropertyValue, Unit, VariableTerm};

use crate::resolve::VariableResolver;
use crate::{
    ChangeChannels, ClassList, ComputedValue, ComputedValues, Expansion, LengthContext, PropertyDictionary,
    PropertyId, PropertyIdSet, PropertyRegistry, PropertySlot, PseudoClassMap, RelativeTarget,
    RuleMatcher, RuleSnapshot, ShorthandId, Specificity, StyleDiagnostic, StyleError, StyleKey,
    expand_shorthand,
};

/// Access to ancestor style records.
///
/// Given a node key, returns the node's [`ElementStyle`] and its parent key.
pub trait NodeLookup<'a, K: Copy + 'a> {
    /// Looks up the style record and parent key for `key`.
    fn lookup(&self, key: K) -> Option<(&'a ElementStyle, Option<K>)>;
}

impl<'a, K, F> NodeLookup<'a, K> for F
where
    K: Copy + 'a,
    F: Fn(K) -> Option<(&'a ElementStyle, Option<K>)>,
{
    #[inline]
    fn lookup(&self, key: K) -> Option<(&'a ElementStyle, Option<K>)> {
        self(key)
    }
}

/// Walks the ancestor chain starting at `parent`, nearest first.
pub fn ancestors<'a, K, L>(lookup: &L, parent: Option<K>) -> impl Iterator<Item = &'a ElementStyle>
where
    K: Copy + 'a,
    L: NodeLookup<'a, K> + ?Sized,
{
    let mut next = parent;
    core::iter::from_fn(move || {
        let (style, parent) = lookup.lookup(next?)?;
        next = parent;
        Some(style)
    })
}

/// Everything a compute pass needs besides the node and its ancestors.
#[derive(Copy, Clone)]
pub struct ComputeContext<'a> {
    registry: &'a PropertyRegistry,
    matcher: &'a dyn RuleMatcher,
    viewport: Size,
    dp_ratio: f32,
    style_version: u64,
}

impl<'a> ComputeContext<'a> {
    /// Creates a context with an empty viewport, a `dp` ratio of 1 and style
    /// version 0.
    #[must_use]
    pub fn new(registry: &'a PropertyRegistry, matcher: &'a dyn RuleMatcher) -> Self {
        Self {
            registry,
            matcher,
            viewport: Size::ZERO,
            dp_ratio: 1.0,
            style_version: 0,
        }
    }

    /// Sets the viewport used for `vw` and `vh`.
    #[inline]
    #[must_use]
    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = viewport;
        self
    }

    /// Sets the device pixel ratio used for `dp`.
    #[inline]
    #[must_use]
    pub fn with_dp_ratio(mut self, dp_ratio: f32) -> Self {
        self.dp_ratio = dp_ratio;
        self
    }

    /// Sets the style version; nodes that matched rules under another
    /// version match again.
    #[inline]
    #[must_use]
    pub fn with_style_version(mut self, version: u64) -> Self {
        self.style_version = version;
        self
    }

    /// The property registry.
    #[must_use]
    pub fn registry(&self) -> &'a PropertyRegistry {
        self.registry
    }
}

impl fmt::Debug for ComputeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeContext")
            .field("properties", &self.registry.len())
            .field("viewport", &self.viewport)
            .field("dp_ratio", &self.dp_ratio)
            .field("style_version", &self.style_version)
            .finish_non_exhaustive()
    }
}

/// What a compute pass changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComputeOutput {
    /// Properties whose computed value changed.
    pub changed_properties: PropertyIdSet,
    /// Variables whose effective value on this node may have changed.
    ///
    /// Children must dirty these names.
    pub changed_variables: Vec<String>,
    /// Problems found while resolving.
    pub diagnostics: Vec<StyleDiagnostic>,
}

impl ComputeOutput {
    /// Returns `true` if nothing changed and nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed_properties.is_empty()
            && self.changed_variables.is_empty()
            && self.diagnostics.is_empty()
    }

    /// Pipeline stages touched by [`changed_properties`](Self::changed_properties).
    #[must_use]
    pub fn channels(&self, registry: &PropertyRegistry) -> ChangeChannels {
        registry.channels_of(&self.changed_properties)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Origin {
    Inline,
    Sheet,
}

/// Style state of one node.
///
/// Holds the node's classes and pseudo-classes, its inline declarations, the
/// rule snapshot matched for it, the values resolved from both, and the
/// dependency and dirty bookkeeping that lets [`compute_values`] redo only
/// what changed.
///
/// Values are computed lazily: mutations only mark keys dirty.
///
/// ```rust
/// use understory_cascade::{
///     ComputeContext, ComputedValue, ElementStyle, PropertyRegistry, StyleSheet, props,
/// };
/// use understory_value::VariableTerm;
///
/// let registry = PropertyRegistry::standard();
/// let sheet = StyleSheet::new();
/// let cx = ComputeContext::new(&registry, &sheet);
/// let no_parents = |_: u32| -> Option<(&ElementStyle, Option<u32>)> { None };
///
/// let mut style = ElementStyle::new("div");
/// style.set_property_variable("--gap", VariableTerm::literal("4px"));
/// style.set_property_text(&registry, "padding", "var(--gap) 1px").unwrap();
///
/// let out = style.compute_values(&cx, None, &no_parents);
/// assert!(out.diagnostics.is_empty());
/// assert_eq!(
///     style.computed().get(props::PADDING_LEFT),
///     Some(&ComputedValue::Length(1.0))
/// );
///
/// style.set_property_variable("--gap", VariableTerm::literal("9px"));
/// let out = style.compute_values(&cx, None, &no_parents);
/// assert!(out.changed_properties.contains(props::PADDING_TOP));
/// assert!(!out.changed_properties.contains(props::PADDING_LEFT));
/// ```
///
/// [`compute_values`]: Self::compute_values
#[derive(Clone, Debug, Default)]
pub struct ElementStyle {
    tag: String,
    classes: ClassList,
    pseudo_classes: PseudoClassMap,
    inline: PropertyDictionary,
    snapshot: RuleSnapshot,
    snapshot_version: Option<u64>,
    resolved_variables: HashMap<String, Option<String>>,
    resolved_properties: HashMap<PropertyId, Option<PropertyValue>>,
    resolved_shorthands: HashMap<(Origin, ShorthandId), Option<Expansion>>,
    graph: DependencyGraph<StyleKey>,
    dirty: DirtySet<StyleKey>,
    computed: ComputedValues,
}

fn mark(dirty: &mut DirtySet<StyleKey>, graph: &DependencyGraph<StyleKey>, key: StyleKey) {
    let mut variables = matches!(key, StyleKey::Variable(_));
    graph.for_each_transitive_dependent(&key, |k| {
        variables |= matches!(k, StyleKey::Variable(_));
        dirty.mark(k.clone());
    });
    if variables {
        dirty.set_flags(DirtyFlags::VARIABLES);
    }
    dirty.mark(key);
}

impl ElementStyle {
    /// Creates the style record of a node with the given tag.
    ///
    /// Everything is dirty until the first [`compute_values`](Self::compute_values).
    #[must_use]
    pub fn new(tag: &str) -> Self {
        let mut style = Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        };
        style
            .dirty
            .set_flags(DirtyFlags::DEFINITION | DirtyFlags::INHERITED);
        style
    }

    /// The node's tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Inline declarations.
    #[must_use]
    pub fn inline(&self) -> &PropertyDictionary {
        &self.inline
    }

    /// The rule snapshot from the last definition refresh.
    #[must_use]
    pub fn snapshot(&self) -> &RuleSnapshot {
        &self.snapshot
    }

    /// Computed values as of the last compute pass.
    #[must_use]
    pub fn computed(&self) -> &ComputedValues {
        &self.computed
    }

    fn mark(&mut self, key: StyleKey) {
        mark(&mut self.dirty, &self.graph, key);
    }

    // --- Classes ---

    /// Adds or removes a class; returns `true` if membership changed.
    pub fn set_class(&mut self, name: &str, activate: bool) -> bool {
        let changed = self.classes.set_class(name, activate);
        if changed {
            self.dirty.set_flags(DirtyFlags::DEFINITION);
        }
        changed
    }

    /// Replaces all classes with the space separated names in `text`.
    pub fn set_class_names(&mut self, text: &str) -> bool {
        let changed = self.classes.set_class_names(text);
        if changed {
            self.dirty.set_flags(DirtyFlags::DEFINITION);
        }
        changed
    }

    /// Returns `true` if the node has class `name`.
    #[must_use]
    pub fn is_class_set(&self, name: &str) -> bool {
        self.classes.contains(name)
    }

    /// Classes joined with spaces.
    #[must_use]
    pub fn class_names(&self) -> String {
        self.classes.class_names()
    }

    /// Sets a pseudo-class; see [`PseudoClassMap::set_pseudo_class`].
    pub fn set_pseudo_class(&mut self, name: &str, activate: bool, override_state: bool) -> bool {
        let changed = self
            .pseudo_classes
            .set_pseudo_class(name, activate, override_state);
        if changed {
            self.dirty.set_flags(DirtyFlags::DEFINITION);
        }
        changed
    }

    /// Returns `true` if pseudo-class `name` is effectively active.
    #[must_use]
    pub fn is_pseudo_class_set(&self, name: &str) -> bool {
        self.pseudo_classes.is_pseudo_class_set(name)
    }

    /// Forces rules to be matched again on the next compute pass.
    pub fn dirty_definition(&mut self) {
        self.dirty.set_flags(DirtyFlags::DEFINITION);
    }

    // --- Inline declarations ---

    /// Sets an inline longhand value.
    ///
    /// Values whose unit the property does not accept are rejected. Variable
    /// terms are always accepted and checked once substituted.
    pub fn set_property(
        &mut self,
        registry: &PropertyRegistry,
        id: PropertyId,
        value: PropertyValue,
    ) -> Result<(), StyleError> {
        let def = registry
            .get(id)
            .ok_or_else(|| StyleError::UnknownProperty(format!("{id:?}")))?;
        if !def.grammar().accepts(&value) {
            return Err(StyleError::UnitMismatch {
                property: def.name(),
                unit: value.unit(),
            });
        }
        if self.inline.set_property(id, value) {
            self.mark(StyleKey::Property(id));
        }
        Ok(())
    }

    /// Parses and sets an inline declaration by name.
    ///
    /// Handles longhands, shorthands and `--` variables; see
    /// [`PropertyDictionary::apply_declaration`].
    pub fn set_property_text(
        &mut self,
        registry: &PropertyRegistry,
        name: &str,
        text: &str,
    ) -> Result<(), StyleError> {
        let touched = self
            .inline
            .apply_declaration(registry, name, text, Specificity::default())?;
        for key in touched {
            self.mark(key);
        }
        Ok(())
    }

    /// Sets an inline shorthand whose expansion waits for substitution.
    pub fn set_dependent_shorthand(
        &mut self,
        registry: &PropertyRegistry,
        id: ShorthandId,
        term: VariableTerm,
    ) -> Result<(), StyleError> {
        let touched = self.inline.set_dependent_shorthand(registry, id, term)?;
        for key in touched {
            self.mark(key);
        }
        Ok(())
    }

    /// Removes an inline longhand; returns `true` if one was set.
    pub fn remove_property(&mut self, id: PropertyId) -> bool {
        let removed = self.inline.remove_property(id).is_some();
        if removed {
            self.mark(StyleKey::Property(id));
        }
        removed
    }

    /// Removes an inline dependent shorthand and the longhands it occupies.
    pub fn remove_shorthand(&mut self, id: ShorthandId) -> bool {
        let touched = self.inline.remove_shorthand(id);
        let removed = !touched.is_empty();
        for key in touched {
            self.mark(key);
        }
        removed
    }

    /// Sets an inline variable.
    pub fn set_property_variable(&mut self, name: &str, term: VariableTerm) {
        if self.inline.set_variable(name, term) {
            self.mark(StyleKey::Variable(name.to_string()));
        }
    }

    /// Removes an inline variable; returns `true` if one was set.
    pub fn remove_property_variable(&mut self, name: &str) -> bool {
        let removed = self.inline.remove_variable(name);
        if removed {
            self.mark(StyleKey::Variable(name.to_string()));
        }
        removed
    }

    // --- Lookup ---

    fn declared(&self, id: PropertyId) -> Option<(Origin, &PropertySlot)> {
        if let Some(slot) = self.inline.property(id) {
            return Some((Origin::Inline, slot));
        }
        let slot = self.snapshot.declarations().property(id)?;
        Some((Origin::Sheet, slot))
    }

    /// The node's own value for `id`.
    ///
    /// `None` if the node declares nothing; `Some(None)` if the declaration
    /// depends on variables and did not resolve (or has not been resolved
    /// yet).
    fn local_value(&self, id: PropertyId) -> Option<Option<&PropertyValue>> {
        let (_, slot) = self.declared(id)?;
        if let Some(resolved) = self.resolved_properties.get(&id) {
            return Some(resolved.as_ref());
        }
        match slot {
            PropertySlot::Value(PropertyValue::Term(_)) | PropertySlot::Shorthand(_) => Some(None),
            PropertySlot::Value(value) => Some(Some(value)),
        }
    }

    /// Returns `true` if the node declares `name` inline or through its rules.
    #[must_use]
    pub fn declares_variable(&self, name: &str) -> bool {
        self.inline.variable(name).is_some()
            || self.snapshot.declarations().variable(name).is_some()
    }

    /// Resolved value of a variable declared on this node.
    ///
    /// `Some(None)` if it is declared but failed to resolve.
    fn inherited_variable(&self, name: &str) -> Option<Option<String>> {
        if !self.declares_variable(name) {
            return None;
        }
        Some(self.resolved_variables.get(name).cloned().flatten())
    }

    /// The specified value of `id` after substitution.
    ///
    /// Looks at the node's inline and rule declarations, then the nearest
    /// ancestor declaring the property if it inherits, then the default. A
    /// declaration that failed to resolve is skipped. Returns `None` only
    /// for an unregistered id.
    pub fn get_property<'a, K, L>(
        &'a self,
        registry: &'a PropertyRegistry,
        id: PropertyId,
        parent: Option<K>,
        lookup: &L,
    ) -> Option<&'a PropertyValue>
    where
        K: Copy + 'a,
        L: NodeLookup<'a, K> + ?Sized,
    {
        let def = registry.get(id)?;
        if let Some(Some(value)) = self.local_value(id) {
            return Some(value);
        }
        if def.inherits() {
            let inherited = ancestors(lookup, parent).find_map(|a| a.local_value(id).flatten());
            if let Some(value) = inherited {
                return Some(value);
            }
        }
        Some(def.default_value())
    }

    /// The raw inline value of `id`.
    ///
    /// Returns `None` if `id` is not set inline or is occupied by a
    /// dependent shorthand.
    #[must_use]
    pub fn get_local_property(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.inline.property(id).and_then(PropertySlot::value)
    }

    /// The raw term of a variable from the node's inline declarations, its
    /// rules, or the nearest ancestor declaring it.
    pub fn get_property_variable<'a, K, L>(
        &'a self,
        name: &str,
        parent: Option<K>,
        lookup: &L,
    ) -> Option<&'a VariableTerm>
    where
        K: Copy + 'a,
        L: NodeLookup<'a, K> + ?Sized,
    {
        let own = |style: &'a Self| {
            style
                .inline
                .variable(name)
                .or_else(|| style.snapshot.declarations().variable(name))
        };
        own(self).or_else(|| ancestors(lookup, parent).find_map(own))
    }

    /// The raw term of an inline variable.
    #[must_use]
    pub fn get_local_property_variable(&self, name: &str) -> Option<&VariableTerm> {
        self.inline.variable(name)
    }

    /// Iterates over inline longhand declarations in id order.
    pub fn iter_local(&self) -> impl Iterator<Item = (PropertyId, &PropertySlot)> + '_ {
        self.inline.properties()
    }

    // --- Invalidation ---

    /// Marks `id` dirty.
    pub fn dirty_property(&mut self, id: PropertyId) {
        self.mark(StyleKey::Property(id));
    }

    /// Marks a variable and everything resolved through it dirty.
    pub fn dirty_property_variable(&mut self, name: &str) {
        self.mark(StyleKey::Variable(name.to_string()));
    }

    /// Marks every inherited property dirty.
    pub fn dirty_inherited_properties(&mut self) {
        self.dirty.set_flags(DirtyFlags::INHERITED);
    }

    /// Marks every property whose current value has a unit in `units`.
    ///
    /// Undeclared properties are checked by their default unless they
    /// inherit, in which case the parent's own check covers them.
    pub fn dirty_properties_with_units(&mut self, registry: &PropertyRegistry, units: Unit) {
        let mut hits = Vec::new();
        for (id, def) in registry.iter() {
            let unit = match self.local_value(id) {
                Some(Some(value)) => value.unit(),
                Some(None) => continue,
                None if def.inherits() => continue,
                None => def.default_value().unit(),
            };
            if unit.intersects(units) {
                hits.push(id);
            }
        }
        for id in hits {
            self.mark(StyleKey::Property(id));
        }
    }

    /// Returns `true` if anything awaits a compute pass.
    #[must_use]
    pub fn any_properties_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Names of variables currently marked dirty, in name order.
    #[must_use]
    pub fn dirty_property_variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .dirty
            .iter()
            .filter_map(|key| match key {
                StyleKey::Variable(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        names.sort_unstable();
        names
    }

    // --- Compute ---

    fn refresh_definition(&mut self, cx: &ComputeContext<'_>) {
        let flagged = !self.dirty.take_flags(DirtyFlags::DEFINITION).is_empty();
        if !flagged && self.snapshot_version == Some(cx.style_version) {
            return;
        }
        self.snapshot_version = Some(cx.style_version);
        let next = cx
            .matcher
            .match_rules(&self.tag, &self.classes, &self.pseudo_classes);
        if next.ptr_eq(&self.snapshot) {
            return;
        }
        let mut keys = Vec::new();
        self.snapshot
            .declarations()
            .diff_keys(next.declarations(), &mut keys);
        trace!("`{}` matched new rules; {} keys differ", self.tag, keys.len());
        self.snapshot = next;
        for key in keys {
            self.mark(key);
        }
    }

    /// Brings computed values up to date.
    ///
    /// The parent (reached through `lookup`) must have been computed first.
    /// Steps, in order: match rules again if the definition is stale, resolve
    /// dirty variables, dependent shorthands and properties, then compute
    /// values with `font-size` first.
    ///
    /// Problems are returned as diagnostics and also logged. A property
    /// whose value fails to resolve keeps its previous computed value.
    pub fn compute_values<'a, K, L>(
        &mut self,
        cx: &ComputeContext<'_>,
        parent: Option<K>,
        lookup: &L,
    ) -> ComputeOutput
    where
        K: Copy + 'a,
        L: NodeLookup<'a, K> + ?Sized,
    {
        let registry = cx.registry;
        let mut out = ComputeOutput::default();
        let first_pass = self.computed.is_empty();
        if first_pass {
            for (id, _) in registry.iter() {
                self.dirty.mark(StyleKey::Property(id));
            }
        }
        if !self.dirty.take_flags(DirtyFlags::INHERITED).is_empty() {
            for id in registry.inherited() {
                self.dirty.mark(StyleKey::Property(id));
            }
        }
        self.refresh_definition(cx);
        let variables_dirty = !self.dirty.take_flags(DirtyFlags::VARIABLES).is_empty();
        self.dirty.take_flags(DirtyFlags::all());

        let mut variables = Vec::new();
        let mut shorthands = Vec::new();
        let mut properties = Vec::new();
        for key in self.dirty.drain() {
            match key {
                StyleKey::Variable(name) => variables.push(name),
                StyleKey::Shorthand(id) => shorthands.push(id),
                StyleKey::Property(id) => properties.push(id),
            }
        }
        variables.sort_unstable();
        shorthands.sort_unstable();
        properties.sort_unstable();
        debug_assert!(
            variables_dirty || variables.is_empty(),
            "variable keys are only marked through `mark`"
        );

        let previous: Vec<(String, Option<Option<String>>)> = variables
            .into_iter()
            .map(|name| {
                let before = self.resolved_variables.remove(&name);
                (name, before)
            })
            .collect();

        {
            let inherited =
                |name: &str| ancestors(lookup, parent).find_map(|a| a.inherited_variable(name));
            let snapshot = self.snapshot.declarations();
            let mut resolver = VariableResolver::new(
                &self.inline,
                snapshot,
                &mut self.resolved_variables,
                &mut self.graph,
                &mut out.diagnostics,
                inherited,
            );

            if variables_dirty {
                for (name, before) in &previous {
                    if resolver.is_local(name) {
                        let after = resolver.resolve_variable(name);
                        if before.as_ref() != Some(&after) {
                            out.changed_variables.push(name.clone());
                        }
                    } else {
                        resolver.record(StyleKey::Variable(name.clone()), Vec::new());
                        out.changed_variables.push(name.clone());
                    }
                }
                resolver.report_cycles(previous.iter().map(|(name, _)| name.as_str()));
            } else {
                trace!("`{}` has no dirty variables", self.tag);
            }

            for id in shorthands {
                let mut consulted = Vec::new();
                for (origin, dict) in [(Origin::Inline, &self.inline), (Origin::Sheet, snapshot)] {
                    let expansion =
                        resolve_shorthand(&mut resolver, registry, dict, id, &mut consulted);
                    match expansion {
                        Some(expansion) => {
                            self.resolved_shorthands.insert((origin, id), expansion);
                        }
                        None => {
                            self.resolved_shorthands.remove(&(origin, id));
                        }
                    }
                }
                resolver.record(StyleKey::Shorthand(id), consulted);
            }

            for &id in &properties {
                let Some(def) = registry.get(id) else {
                    continue;
                };
                let declared = self
                    .inline
                    .property(id)
                    .map(|slot| (Origin::Inline, slot))
                    .or_else(|| snapshot.property(id).map(|slot| (Origin::Sheet, slot)));
                let mut consulted = Vec::new();
                let resolved = match declared {
                    None => {
                        resolver.record(StyleKey::Property(id), consulted);
                        self.resolved_properties.remove(&id);
                        continue;
                    }
                    Some((_, PropertySlot::Value(PropertyValue::Term(term)))) => resolver
                        .substitute(term, def.name(), &mut consulted)
                        .ok()
                        .and_then(|text| match def.grammar().parse(&text) {
                            Ok(value) => Some(value),
                            Err(_) => {
                                resolver.report(StyleDiagnostic::InvalidValue {
                                    property: def.name(),
                                    text,
                                });
                                None
                            }
                        }),
                    Some((_, PropertySlot::Value(value))) => Some(value.clone()),
                    Some((origin, PropertySlot::Shorthand(sid))) => {
                        let sid = *sid;
                        consulted.push(StyleKey::Shorthand(sid));
                        if !self.resolved_shorthands.contains_key(&(origin, sid)) {
                            let dict = match origin {
                                Origin::Inline => &self.inline,
                                Origin::Sheet => snapshot,
                            };
                            let mut ignored = Vec::new();
                            let expansion = resolve_shorthand(
                                &mut resolver,
                                registry,
                                dict,
                                sid,
                                &mut ignored,
                            );
                            self.resolved_shorthands
                                .insert((origin, sid), expansion.flatten());
                        }
                        self.resolved_shorthands
                            .get(&(origin, sid))
                            .and_then(Option::as_ref)
                            .and_then(|e| e.iter().find(|(p, _)| *p == id))
                            .map(|(_, value)| value.clone())
                    }
                };
                resolver.record(StyleKey::Property(id), consulted);
                self.resolved_properties.insert(id, resolved);
            }
        }

        self.compute_dirty(cx, parent, lookup, &properties, first_pass, &mut out);
        if !out.is_empty() {
            debug!(
                "`{}` computed: {} properties and {} variables changed, {} diagnostics",
                self.tag,
                out.changed_properties.len(),
                out.changed_variables.len(),
                out.diagnostics.len()
            );
        }
        out
    }

    fn compute_dirty<'a, K, L>(
        &mut self,
        cx: &ComputeContext<'_>,
        parent: Option<K>,
        lookup: &L,
        dirty: &[PropertyId],
        first_pass: bool,
        out: &mut ComputeOutput,
    ) where
        K: Copy + 'a,
        L: NodeLookup<'a, K> + ?Sized,
    {
        let registry = cx.registry;
        let parent_style = parent.and_then(|k| lookup.lookup(k)).map(|(style, _)| style);
        let font_size_id = registry
            .iter()
            .find(|(_, def)| def.relative_target() == RelativeTarget::ParentFontSize)
            .map(|(id, _)| id);
        let font_size_of = |style: &ElementStyle| {
            font_size_id
                .and_then(|id| style.computed.get(id))
                .and_then(ComputedValue::as_length)
        };

        let defaults = LengthContext::default();
        let parent_font_size = parent_style
            .and_then(font_size_of)
            .unwrap_or(defaults.parent_font_size);
        let mut lengths = LengthContext {
            font_size: font_size_of(self).unwrap_or(parent_font_size),
            parent_font_size,
            root_font_size: ancestors(lookup, parent)
                .last()
                .and_then(font_size_of)
                .unwrap_or(defaults.root_font_size),
            viewport: cx.viewport,
            dp_ratio: cx.dp_ratio,
            containing_block: None,
        };

        let mut pending: Vec<PropertyId> = dirty.to_vec();
        if let Some(fs) = font_size_id.filter(|id| dirty.contains(id)) {
            pending.retain(|id| *id != fs);
            if self.compute_one(registry, fs, parent_style, &lengths, first_pass) {
                out.changed_properties.insert(fs);
                let own = font_size_of(self).unwrap_or(parent_font_size);
                lengths.font_size = own;
                let mut relative = Unit::EM;
                if parent.is_none() {
                    lengths.root_font_size = own;
                    relative |= Unit::REM;
                }
                for (id, def) in registry.iter() {
                    let Some(Some(value)) = self.local_value(id) else {
                        continue;
                    };
                    let unit = value.unit();
                    let follows_font = unit.intersects(relative)
                        || (unit == Unit::PERCENT
                            && def.relative_target() == RelativeTarget::FontSize);
                    if id != fs && follows_font && !pending.contains(&id) {
                        pending.push(id);
                    }
                }
            }
        }
        if parent.is_none() {
            lengths.root_font_size = lengths.font_size;
        }

        for id in pending {
            if self.compute_one(registry, id, parent_style, &lengths, first_pass) {
                out.changed_properties.insert(id);
            }
        }
    }

    fn compute_one(
        &mut self,
        registry: &PropertyRegistry,
        id: PropertyId,
        parent: Option<&Self>,
        lengths: &LengthContext,
        first_pass: bool,
    ) -> bool {
        let Some(def) = registry.get(id) else {
            return false;
        };
        let target = def.relative_target();
        let value = match self.local_value(id) {
            Some(Some(value)) => ComputedValue::compute(value, target, lengths),
            Some(None) if !first_pass => return false,
            _ => {
                let inherited = parent
                    .filter(|_| def.inherits())
                    .and_then(|p| p.computed.get(id))
                    .cloned();
                inherited.unwrap_or_else(|| {
                    ComputedValue::compute(def.default_value(), target, lengths)
                })
            }
        };
        self.computed.set(id, value)
    }
}

/// Substitutes and expands the dependent shorthand `id` declared in `dict`.
///
/// Returns `None` if `dict` does not declare it.
fn resolve_shorthand<A>(
    resolver: &mut VariableResolver<'_, A>,
    registry: &PropertyRegistry,
    dict: &PropertyDictionary,
    id: ShorthandId,
    consulted: &mut Vec<StyleKey>,
) -> Option<Option<Expansion>>
where
    A: Fn(&str) -> Option<Option<String>>,
{
    let term = dict.shorthand(id)?;
    let def = registry.shorthand(id)?;
    let text = resolver.substitute(term, def.name(), consulted).ok();
    Some(text.and_then(|text| match expand_shorthand(def, &text, registry) {
        Ok(expansion) => Some(expansion),
        Err(_) => {
            resolver.report(StyleDiagnostic::MalformedShorthand {
                shorthand: def.name(),
                text,
            });
            None
        }
    }))
}
