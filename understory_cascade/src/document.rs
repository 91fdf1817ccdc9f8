// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A tree of style records updated top-down.

use alloc::vec;
use alloc::vec::Vec;
use core::mem;

use kurbo::Size;
use log::debug;
use understory_value::{PropertyValue, Unit, VariableTerm};

use crate::{
    ComputeContext, ComputeOutput, ComputedValue, ElementStyle, NameRef, PropertyId,
    PropertyRegistry, RelativeTarget, StyleDiagnostic, StyleError, StyleSheet,
};

/// Handle of a node in a [`StyleDocument`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "documents hold far fewer than u32::MAX nodes"
    )]
    fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Index into the node arena.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Node {
    style: ElementStyle,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Per-node results of [`StyleDocument::update`], in visit order.
///
/// Nodes where nothing changed are left out.
#[derive(Clone, Debug, Default)]
pub struct UpdateReport {
    /// Compute output of each node that changed.
    pub nodes: Vec<(NodeId, ComputeOutput)>,
}

impl UpdateReport {
    /// Output for `node`, if anything changed there.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<&ComputeOutput> {
        self.nodes.iter().find(|(id, _)| *id == node).map(|(_, out)| out)
    }

    /// Every diagnostic raised during the update.
    pub fn diagnostics(&self) -> impl Iterator<Item = &StyleDiagnostic> + '_ {
        self.nodes.iter().flat_map(|(_, out)| &out.diagnostics)
    }
}

/// A node tree sharing one registry, style sheet, viewport and `dp` ratio.
///
/// ```rust
/// use understory_cascade::{ComputedValue, PropertyRegistry, StyleDocument, StyleSheet, props};
/// use understory_value::Color;
///
/// let registry = PropertyRegistry::standard();
/// let sheet = StyleSheet::parse(
///     &registry,
///     "body { --accent: #00ff00 } p { color: var(--accent) }",
/// )
/// .unwrap();
/// let mut doc = StyleDocument::new(registry, sheet);
/// let p = doc.append_child(doc.root(), "p");
/// doc.update();
/// assert_eq!(
///     doc.computed(p, props::COLOR),
///     Some(&ComputedValue::Color(Color::rgb(0, 255, 0)))
/// );
///
/// doc.set_property(doc.root(), "--accent", "#0000ff").unwrap();
/// let report = doc.update();
/// assert!(report.node(p).unwrap().changed_properties.contains(props::COLOR));
/// ```
#[derive(Debug)]
pub struct StyleDocument {
    registry: PropertyRegistry,
    sheet: StyleSheet,
    nodes: Vec<Node>,
    viewport: Size,
    dp_ratio: f32,
    style_version: u64,
}

impl StyleDocument {
    /// Creates a document whose root is a `body` node.
    #[must_use]
    pub fn new(registry: PropertyRegistry, sheet: StyleSheet) -> Self {
        Self {
            registry,
            sheet,
            nodes: vec![Node {
                style: ElementStyle::new("body"),
                parent: None,
                children: Vec::new(),
            }],
            viewport: Size::ZERO,
            dp_ratio: 1.0,
            style_version: 0,
        }
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The property registry.
    #[must_use]
    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    /// The style sheet.
    #[must_use]
    pub fn sheet(&self) -> &StyleSheet {
        &self.sheet
    }

    /// Appends a new node with `tag` under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a node of this document.
    pub fn append_child(&mut self, parent: NodeId, tag: &str) -> NodeId {
        assert!(
            parent.index() < self.nodes.len(),
            "parent must belong to this document"
        );
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            style: ElementStyle::new(tag),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Parent of `node`.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.index()).and_then(|n| n.parent)
    }

    /// Children of `node` in insertion order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.index())
            .map_or(&[], |n| n.children.as_slice())
    }

    /// Style record of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a node of this document.
    #[must_use]
    pub fn style(&self, node: NodeId) -> &ElementStyle {
        &self.nodes[node.index()].style
    }

    /// Mutable style record of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a node of this document.
    pub fn style_mut(&mut self, node: NodeId) -> &mut ElementStyle {
        &mut self.nodes[node.index()].style
    }

    /// Replaces the style sheet; every node matches rules again on the next
    /// update.
    pub fn set_style_sheet(&mut self, sheet: StyleSheet) {
        self.sheet = sheet;
        self.style_version += 1;
    }

    /// Sets the viewport, dirtying viewport-relative values everywhere.
    pub fn set_viewport(&mut self, viewport: Size) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.dirty_properties_with_units_recursive(self.root(), Unit::VIEWPORT);
        }
    }

    /// Sets the device pixel ratio, dirtying `dp` values everywhere.
    pub fn set_dp_ratio(&mut self, dp_ratio: f32) {
        if self.dp_ratio != dp_ratio {
            self.dp_ratio = dp_ratio;
            self.dirty_properties_with_units_recursive(self.root(), Unit::DP);
        }
    }

    /// Marks properties with a unit in `units` dirty on `node` and every
    /// descendant.
    ///
    /// Use this when a collaborator changes the context those units resolve
    /// against for a subtree.
    pub fn dirty_properties_with_units_recursive(&mut self, node: NodeId, units: Unit) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(n) = self.nodes.get_mut(id.index()) else {
                continue;
            };
            n.style.dirty_properties_with_units(&self.registry, units);
            stack.extend(n.children.iter().copied());
        }
    }

    // --- Convenience accessors ---

    /// Parses and sets an inline declaration on `node`.
    pub fn set_property(&mut self, node: NodeId, name: &str, text: &str) -> Result<(), StyleError> {
        let registry = &self.registry;
        self.nodes[node.index()]
            .style
            .set_property_text(registry, name, text)
    }

    /// Removes an inline declaration by name; returns `true` if one was set.
    ///
    /// Removing a shorthand removes its dependent term and every longhand
    /// it covers.
    pub fn remove_property(&mut self, node: NodeId, name: &str) -> Result<bool, StyleError> {
        let style = &mut self.nodes[node.index()].style;
        if name.starts_with("--") {
            return Ok(style.remove_property_variable(name));
        }
        match self.registry.lookup(name) {
            Some(NameRef::Property(id)) => Ok(style.remove_property(id)),
            Some(NameRef::Shorthand(id)) => {
                let mut removed = style.remove_shorthand(id);
                if let Some(def) = self.registry.shorthand(id) {
                    for &longhand in def.longhands() {
                        removed |= style.remove_property(longhand);
                    }
                }
                Ok(removed)
            }
            None => Err(StyleError::UnknownProperty(name.into())),
        }
    }

    /// Adds or removes a class on `node`.
    pub fn set_class(&mut self, node: NodeId, name: &str, activate: bool) -> bool {
        self.nodes[node.index()].style.set_class(name, activate)
    }

    /// Sets a pseudo-class on `node`.
    pub fn set_pseudo_class(&mut self, node: NodeId, name: &str, activate: bool) -> bool {
        self.nodes[node.index()]
            .style
            .set_pseudo_class(name, activate, false)
    }

    fn lookup<'s>(&'s self) -> impl Fn(NodeId) -> Option<(&'s ElementStyle, Option<NodeId>)> + 's {
        move |key: NodeId| self.nodes.get(key.index()).map(|n| (&n.style, n.parent))
    }

    /// Specified value of `property` on `node`; see
    /// [`ElementStyle::get_property`].
    #[must_use]
    pub fn get_property(&self, node: NodeId, property: PropertyId) -> Option<&PropertyValue> {
        let parent = self.parent(node);
        self.style(node)
            .get_property(&self.registry, property, parent, &self.lookup())
    }

    /// Raw term of variable `name` as seen from `node`.
    #[must_use]
    pub fn get_property_variable(&self, node: NodeId, name: &str) -> Option<&VariableTerm> {
        let parent = self.parent(node);
        self.style(node)
            .get_property_variable(name, parent, &self.lookup())
    }

    /// Computed value of `property` on `node`.
    #[must_use]
    pub fn computed(&self, node: NodeId, property: PropertyId) -> Option<&ComputedValue> {
        self.nodes.get(node.index())?.style.computed().get(property)
    }

    /// Computes every node, parents before children, and propagates
    /// inherited changes downward.
    pub fn update(&mut self) -> UpdateReport {
        let mut report = UpdateReport::default();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let idx = id.index();
            let parent = self.nodes[idx].parent;
            let mut style = mem::take(&mut self.nodes[idx].style);
            let out = {
                let nodes = &self.nodes;
                let lookup =
                    |key: NodeId| nodes.get(key.index()).map(|n| (&n.style, n.parent));
                let cx = ComputeContext::new(&self.registry, &self.sheet)
                    .with_viewport(self.viewport)
                    .with_dp_ratio(self.dp_ratio)
                    .with_style_version(self.style_version);
                style.compute_values(&cx, parent, &lookup)
            };
            self.nodes[idx].style = style;

            let font_size_changed = out.changed_properties.iter().any(|p| {
                self.registry
                    .get(p)
                    .is_some_and(|def| def.relative_target() == RelativeTarget::ParentFontSize)
            });
            let children = self.nodes[idx].children.clone();
            for &child in &children {
                let style = &mut self.nodes[child.index()].style;
                for p in out.changed_properties.iter() {
                    if self.registry.get(p).is_some_and(|def| def.inherits()) {
                        style.dirty_property(p);
                    }
                }
                for name in &out.changed_variables {
                    style.dirty_property_variable(name);
                }
            }
            if parent.is_none() && font_size_changed {
                for &child in &children {
                    self.dirty_properties_with_units_recursive(child, Unit::REM);
                }
            }
            stack.extend(children.iter().rev());
            if !out.is_empty() {
                report.nodes.push((id, out));
            }
        }
        debug!("style update touched {} nodes", report.nodes.len());
        report
    }
}
