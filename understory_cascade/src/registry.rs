// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property and shorthand definitions.
//!
//! [`PropertyRegistry`] assigns [`PropertyId`]s and [`ShorthandId`]s in
//! registration order and stores each definition. The registry is explicit
//! configuration: nothing in the cascade reads global state.

use alloc::vec::Vec;

use bitflags::bitflags;
use hashbrown::HashMap;
use smallvec::SmallVec;
use understory_value::{Color, PropertyValue, Unit, ValueGrammar};

use crate::{PropertyId, PropertyIdSet, ShorthandId};

bitflags! {
    /// Pipeline stages affected when a property's computed value changes.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ChangeChannels: u8 {
        /// Geometry must be recomputed.
        const LAYOUT = 1 << 0;
        /// Only rendering is affected.
        const PAINT = 1 << 1;
    }
}

/// What relative units and percentages of a property resolve against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum RelativeTarget {
    /// Nothing; percentages stay numbers.
    #[default]
    None,
    /// The element's own font size.
    FontSize,
    /// The parent's font size (used by `font-size` itself).
    ParentFontSize,
    /// Containing block width; resolved during layout.
    ContainingBlockWidth,
    /// Containing block height; resolved during layout.
    ContainingBlockHeight,
}

/// Definition of a longhand property.
#[derive(Clone, Debug)]
pub struct PropertyDefinition {
    name: &'static str,
    default: PropertyValue,
    inherits: bool,
    grammar: ValueGrammar,
    relative_target: RelativeTarget,
    channels: ChangeChannels,
}

impl PropertyDefinition {
    /// Property name as written in declarations.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Value used when nothing is declared and nothing is inherited.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &PropertyValue {
        &self.default
    }

    /// Whether children inherit this property.
    #[must_use]
    #[inline]
    pub fn inherits(&self) -> bool {
        self.inherits
    }

    /// Accepted values.
    #[must_use]
    #[inline]
    pub fn grammar(&self) -> &ValueGrammar {
        &self.grammar
    }

    /// Base for relative units.
    #[must_use]
    #[inline]
    pub fn relative_target(&self) -> RelativeTarget {
        self.relative_target
    }

    /// Pipeline stages affected by changes.
    #[must_use]
    #[inline]
    pub fn channels(&self) -> ChangeChannels {
        self.channels
    }
}

/// Builder for [`PropertyDefinition`].
///
/// ```rust
/// use understory_cascade::{ChangeChannels, PropertyDefinitionBuilder, RelativeTarget};
/// use understory_value::{PropertyValue, Unit, ValueGrammar};
///
/// let def = PropertyDefinitionBuilder::new(
///     "line-height",
///     ValueGrammar::new(Unit::NUMBER_LENGTH_PERCENT),
///     PropertyValue::numeric(1.2, Unit::NUMBER),
/// )
/// .inherits(true)
/// .relative_to(RelativeTarget::FontSize)
/// .affects(ChangeChannels::LAYOUT)
/// .build();
///
/// assert!(def.inherits());
/// assert_eq!(def.name(), "line-height");
/// ```
#[derive(Clone, Debug)]
pub struct PropertyDefinitionBuilder {
    def: PropertyDefinition,
}

impl PropertyDefinitionBuilder {
    /// Starts a definition with a name, grammar and default value.
    #[must_use]
    pub fn new(name: &'static str, grammar: ValueGrammar, default: PropertyValue) -> Self {
        Self {
            def: PropertyDefinition {
                name,
                default,
                inherits: false,
                grammar,
                relative_target: RelativeTarget::None,
                channels: ChangeChannels::empty(),
            },
        }
    }

    /// Sets whether the property inherits.
    #[must_use]
    #[inline]
    pub fn inherits(mut self, inherits: bool) -> Self {
        self.def.inherits = inherits;
        self
    }

    /// Sets the base for relative units.
    #[must_use]
    #[inline]
    pub fn relative_to(mut self, target: RelativeTarget) -> Self {
        self.def.relative_target = target;
        self
    }

    /// Sets the affected pipeline stages.
    #[must_use]
    #[inline]
    pub fn affects(mut self, channels: ChangeChannels) -> Self {
        self.def.channels = channels;
        self
    }

    /// Finishes the definition.
    #[must_use]
    pub fn build(self) -> PropertyDefinition {
        self.def
    }
}

/// Expansion grammar of a shorthand.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShorthandKind {
    /// `flex`: grow, shrink and basis.
    Flex,
    /// Box edges: top, right, bottom and left with the 1 to 4 value rule.
    Box,
}

impl ShorthandKind {
    /// Number of longhands the grammar fills.
    #[must_use]
    pub const fn longhand_count(self) -> usize {
        match self {
            Self::Flex => 3,
            Self::Box => 4,
        }
    }
}

/// Definition of a shorthand.
#[derive(Clone, Debug)]
pub struct ShorthandDefinition {
    name: &'static str,
    kind: ShorthandKind,
    longhands: SmallVec<[PropertyId; 4]>,
}

impl ShorthandDefinition {
    /// Shorthand name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Expansion grammar.
    #[must_use]
    pub fn kind(&self) -> ShorthandKind {
        self.kind
    }

    /// Underlying longhands in grammar order.
    #[must_use]
    pub fn longhands(&self) -> &[PropertyId] {
        &self.longhands
    }
}

/// Result of looking a declaration name up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NameRef {
    /// A longhand.
    Property(PropertyId),
    /// A shorthand.
    Shorthand(ShorthandId),
}

/// Registry of property and shorthand definitions.
#[derive(Clone, Debug, Default)]
pub struct PropertyRegistry {
    properties: Vec<PropertyDefinition>,
    shorthands: Vec<ShorthandDefinition>,
    by_name: HashMap<&'static str, NameRef>,
}

impl PropertyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a longhand and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if the name is already registered or more than `u16::MAX`
    /// properties are registered.
    pub fn register(&mut self, def: PropertyDefinition) -> PropertyId {
        assert!(
            !self.by_name.contains_key(def.name),
            "duplicate property name `{}`",
            def.name
        );
        assert!(
            self.properties.len() < u16::MAX as usize,
            "too many properties registered"
        );
        #[expect(clippy::cast_possible_truncation, reason = "checked above")]
        let id = PropertyId::new(self.properties.len() as u16);
        self.by_name.insert(def.name, NameRef::Property(id));
        self.properties.push(def);
        id
    }

    /// Registers a shorthand over existing longhands.
    ///
    /// # Panics
    ///
    /// Panics if the longhand count does not match `kind`, or the name is
    /// already registered.
    pub fn register_shorthand(
        &mut self,
        name: &'static str,
        kind: ShorthandKind,
        longhands: &[PropertyId],
    ) -> ShorthandId {
        assert_eq!(
            longhands.len(),
            kind.longhand_count(),
            "shorthand `{name}` has the wrong number of longhands"
        );
        assert!(
            !self.by_name.contains_key(name),
            "duplicate property name `{name}`"
        );
        assert!(
            self.shorthands.len() < u16::MAX as usize,
            "too many shorthands registered"
        );
        #[expect(clippy::cast_possible_truncation, reason = "checked above")]
        let id = ShorthandId::new(self.shorthands.len() as u16);
        self.by_name.insert(name, NameRef::Shorthand(id));
        self.shorthands.push(ShorthandDefinition {
            name,
            kind,
            longhands: longhands.iter().copied().collect(),
        });
        id
    }

    /// Number of longhands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if no longhand is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Looks up a longhand or shorthand by declaration name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<NameRef> {
        self.by_name.get(name).copied()
    }

    /// Looks up a longhand by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<PropertyId> {
        match self.lookup(name)? {
            NameRef::Property(id) => Some(id),
            NameRef::Shorthand(_) => None,
        }
    }

    /// Definition of a longhand.
    #[must_use]
    pub fn get(&self, id: PropertyId) -> Option<&PropertyDefinition> {
        self.properties.get(id.index())
    }

    /// Definition of a shorthand.
    #[must_use]
    pub fn shorthand(&self, id: ShorthandId) -> Option<&ShorthandDefinition> {
        self.shorthands.get(id.index())
    }

    /// Name of a longhand, or `"?"` for a foreign id.
    #[must_use]
    pub fn name(&self, id: PropertyId) -> &'static str {
        self.get(id).map_or("?", PropertyDefinition::name)
    }

    /// Iterates over all longhands in id order.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &PropertyDefinition)> + '_ {
        self.properties.iter().enumerate().map(|(i, def)| {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "register caps the count at u16::MAX"
            )]
            let id = PropertyId::new(i as u16);
            (id, def)
        })
    }

    /// Iterates over the ids of inherited longhands.
    pub fn inherited(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.iter()
            .filter(|(_, def)| def.inherits)
            .map(|(id, _)| id)
    }

    /// Shorthands whose expansion fills `id`.
    pub fn shorthands_of(&self, id: PropertyId) -> impl Iterator<Item = ShorthandId> + '_ {
        self.shorthands
            .iter()
            .enumerate()
            .filter(move |(_, def)| def.longhands.contains(&id))
            .map(|(i, _)| {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "register_shorthand caps the count at u16::MAX"
                )]
                let id = ShorthandId::new(i as u16);
                id
            })
    }

    /// Union of the channels of every property in `changed`.
    ///
    /// Unknown ids contribute nothing.
    #[must_use]
    pub fn channels_of(&self, changed: &PropertyIdSet) -> ChangeChannels {
        changed
            .iter()
            .filter_map(|id| self.get(id))
            .fold(ChangeChannels::empty(), |acc, def| acc | def.channels)
    }

    /// The built-in property set. Ids match the constants in [`props`] and
    /// [`shorthands`].
    #[must_use]
    pub fn standard() -> Self {
        use ChangeChannels as C;
        use PropertyDefinitionBuilder as B;
        use RelativeTarget as R;

        const AUTO: &[&str] = &["auto"];
        const NONE: &[&str] = &["none"];

        let length = || ValueGrammar::new(Unit::LENGTH_PERCENT);
        let zero = || PropertyValue::px(0.0);
        let auto = || PropertyValue::keyword("auto");
        let none = || PropertyValue::keyword("none");

        let mut r = Self::new();
        let defs = [
            B::new("color", ValueGrammar::new(Unit::COLOR), Color::BLACK.into())
                .inherits(true)
                .affects(C::PAINT),
            B::new(
                "background-color",
                ValueGrammar::new(Unit::COLOR),
                Color::TRANSPARENT.into(),
            )
            .affects(C::PAINT),
            B::new("font-size", length(), PropertyValue::px(12.0))
                .inherits(true)
                .relative_to(R::ParentFontSize)
                .affects(C::LAYOUT | C::PAINT),
            B::new(
                "font-family",
                ValueGrammar::new(Unit::STRING),
                PropertyValue::String(alloc::string::String::new()),
            )
            .inherits(true)
            .affects(C::LAYOUT | C::PAINT),
            B::new(
                "visibility",
                ValueGrammar::new(Unit::empty()).with_keywords(&["visible", "hidden"]),
                PropertyValue::keyword("visible"),
            )
            .inherits(true)
            .affects(C::PAINT),
            B::new(
                "opacity",
                ValueGrammar::new(Unit::NUMBER),
                PropertyValue::numeric(1.0, Unit::NUMBER),
            )
            .affects(C::PAINT),
            B::new("width", length().with_keywords(AUTO), auto())
                .relative_to(R::ContainingBlockWidth)
                .affects(C::LAYOUT),
            B::new("height", length().with_keywords(AUTO), auto())
                .relative_to(R::ContainingBlockHeight)
                .affects(C::LAYOUT),
            B::new("padding-top", length(), zero())
                .relative_to(R::ContainingBlockWidth)
                .affects(C::LAYOUT),
            B::new("padding-right", length(), zero())
                .relative_to(R::ContainingBlockWidth)
                .affects(C::LAYOUT),
            B::new("padding-bottom", length(), zero())
                .relative_to(R::ContainingBlockWidth)
                .affects(C::LAYOUT),
            B::new("padding-left", length(), zero())
                .relative_to(R::ContainingBlockWidth)
                .affects(C::LAYOUT),
            B::new("margin-top", length().with_keywords(AUTO), zero())
                .relative_to(R::ContainingBlockWidth)
                .affects(C::LAYOUT),
            B::new("margin-right", length().with_keywords(AUTO), zero())
                .relative_to(R::ContainingBlockWidth)
                .affects(C::LAYOUT),
            B::new("margin-bottom", length().with_keywords(AUTO), zero())
                .relative_to(R::ContainingBlockWidth)
                .affects(C::LAYOUT),
            B::new("margin-left", length().with_keywords(AUTO), zero())
                .relative_to(R::ContainingBlockWidth)
                .affects(C::LAYOUT),
            B::new(
                "flex-grow",
                ValueGrammar::new(Unit::NUMBER),
                PropertyValue::numeric(0.0, Unit::NUMBER),
            )
            .affects(C::LAYOUT),
            B::new(
                "flex-shrink",
                ValueGrammar::new(Unit::NUMBER),
                PropertyValue::numeric(1.0, Unit::NUMBER),
            )
            .affects(C::LAYOUT),
            B::new("flex-basis", length().with_keywords(AUTO), auto())
                .relative_to(R::ContainingBlockWidth)
                .affects(C::LAYOUT),
            B::new(
                "box-shadow",
                ValueGrammar::new(Unit::SHADOW_LIST).with_keywords(NONE),
                none(),
            )
            .affects(C::PAINT),
            B::new(
                "transform",
                ValueGrammar::new(Unit::TRANSFORM).with_keywords(NONE),
                none(),
            )
            .affects(C::PAINT),
            B::new(
                "background-gradient",
                ValueGrammar::new(Unit::COLOR_STOP_LIST).with_keywords(NONE),
                none(),
            )
            .affects(C::PAINT),
        ];
        for def in defs {
            r.register(def.build());
        }
        debug_assert_eq!(r.name(props::BACKGROUND_GRADIENT), "background-gradient");

        r.register_shorthand(
            "flex",
            ShorthandKind::Flex,
            &[props::FLEX_GROW, props::FLEX_SHRINK, props::FLEX_BASIS],
        );
        r.register_shorthand(
            "padding",
            ShorthandKind::Box,
            &[
                props::PADDING_TOP,
                props::PADDING_RIGHT,
                props::PADDING_BOTTOM,
                props::PADDING_LEFT,
            ],
        );
        r.register_shorthand(
            "margin",
            ShorthandKind::Box,
            &[
                props::MARGIN_TOP,
                props::MARGIN_RIGHT,
                props::MARGIN_BOTTOM,
                props::MARGIN_LEFT,
            ],
        );
        r
    }
}

/// Ids of the longhands in [`PropertyRegistry::standard`].
pub mod props {
    use crate::PropertyId;

    /// `color`
    pub const COLOR: PropertyId = PropertyId::new(0);
    /// `background-color`
    pub const BACKGROUND_COLOR: PropertyId = PropertyId::new(1);
    /// `font-size`
    pub const FONT_SIZE: PropertyId = PropertyId::new(2);
    /// `font-family`
    pub const FONT_FAMILY: PropertyId = PropertyId::new(3);
    /// `visibility`
    pub const VISIBILITY: PropertyId = PropertyId::new(4);
    /// `opacity`
    pub const OPACITY: PropertyId = PropertyId::new(5);
    /// `width`
    pub const WIDTH: PropertyId = PropertyId::new(6);
    /// `height`
    pub const HEIGHT: PropertyId = PropertyId::new(7);
    /// `padding-top`
    pub const PADDING_TOP: PropertyId = PropertyId::new(8);
    /// `padding-right`
    pub const PADDING_RIGHT: PropertyId = PropertyId::new(9);
    /// `padding-bottom`
    pub const PADDING_BOTTOM: PropertyId = PropertyId::new(10);
    /// `padding-left`
    pub const PADDING_LEFT: PropertyId = PropertyId::new(11);
    /// `margin-top`
    pub const MARGIN_TOP: PropertyId = PropertyId::new(12);
    /// `margin-right`
    pub const MARGIN_RIGHT: PropertyId = PropertyId::new(13);
    /// `margin-bottom`
    pub const MARGIN_BOTTOM: PropertyId = PropertyId::new(14);
    /// `margin-left`
    pub const MARGIN_LEFT: PropertyId = PropertyId::new(15);
    /// `flex-grow`
    pub const FLEX_GROW: PropertyId = PropertyId::new(16);
    /// `flex-shrink`
    pub const FLEX_SHRINK: PropertyId = PropertyId::new(17);
    /// `flex-basis`
    pub const FLEX_BASIS: PropertyId = PropertyId::new(18);
    /// `box-shadow`
    pub const BOX_SHADOW: PropertyId = PropertyId::new(19);
    /// `transform`
    pub const TRANSFORM: PropertyId = PropertyId::new(20);
    /// `background-gradient`
    pub const BACKGROUND_GRADIENT: PropertyId = PropertyId::new(21);
}

/// Ids of the shorthands in [`PropertyRegistry::standard`].
pub mod shorthands {
    use crate::ShorthandId;

    /// `flex`
    pub const FLEX: ShorthandId = ShorthandId::new(0);
    /// `padding`
    pub const PADDING: ShorthandId = ShorthandId::new(1);
    /// `margin`
    pub const MARGIN: ShorthandId = ShorthandId::new(2);
}
