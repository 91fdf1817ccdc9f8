// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Final values after inheritance and unit resolution.

use alloc::string::String;
use alloc::vec::Vec;

use understory_value::{Color, PropertyValue};

use crate::{LengthContext, PropertyId, RelativeTarget};

/// A concrete property value.
#[derive(Clone, Debug, PartialEq)]
pub enum ComputedValue {
    /// An identifier such as `auto`.
    Keyword(String),
    /// A unit-less number.
    Number(f32),
    /// A length in pixels.
    Length(f32),
    /// A percentage left for layout to resolve.
    Percentage(f32),
    /// An angle in radians.
    Angle(f32),
    /// A color.
    Color(Color),
    /// Free text.
    String(String),
    /// A composite value kept in specified form.
    Specified(PropertyValue),
}

impl ComputedValue {
    /// Computes a specified value.
    #[must_use]
    pub fn compute(value: &PropertyValue, target: RelativeTarget, cx: &LengthContext) -> Self {
        match value {
            PropertyValue::Keyword(word) => Self::Keyword(word.clone()),
            PropertyValue::Numeric(n) => cx.resolve_relative_length(*n, target),
            PropertyValue::Color(c) => Self::Color(*c),
            PropertyValue::String(s) => Self::String(s.clone()),
            other => Self::Specified(other.clone()),
        }
    }

    /// The length in pixels, if this is a length.
    #[must_use]
    pub fn as_length(&self) -> Option<f32> {
        match self {
            Self::Length(px) => Some(*px),
            _ => None,
        }
    }

    /// The number, if this is a unit-less number.
    #[must_use]
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The color, if this is a color.
    #[must_use]
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// The keyword, if this is a keyword.
    #[must_use]
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Self::Keyword(word) => Some(word),
            _ => None,
        }
    }
}

/// Computed values of one node, indexed by [`PropertyId`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComputedValues {
    values: Vec<ComputedValue>,
}

impl ComputedValues {
    /// Returns `true` if nothing has been computed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The computed value of `id`.
    #[must_use]
    pub fn get(&self, id: PropertyId) -> Option<&ComputedValue> {
        self.values.get(id.index())
    }

    /// Stores `value`; returns `true` if it differs from the previous one.
    pub(crate) fn set(&mut self, id: PropertyId, value: ComputedValue) -> bool {
        let idx = id.index();
        if idx >= self.values.len() {
            self.values.resize(idx + 1, ComputedValue::Keyword(String::new()));
        } else if self.values[idx] == value {
            return false;
        }
        self.values[idx] = value;
        true
    }

    /// Iterates over computed values in id order.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &ComputedValue)> + '_ {
        self.values.iter().enumerate().map(|(i, v)| {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "values are indexed by u16 ids"
            )]
            let id = PropertyId::new(i as u16);
            (id, v)
        })
    }
}
