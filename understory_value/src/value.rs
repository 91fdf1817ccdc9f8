// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::{Color, ColorStop, NumericValue, Shadow, TransformPrimitive, Unit, VariableTerm};

/// A declared property value.
///
/// Values are immutable once constructed; [`PropertyValue::unit`] reports the
/// single unit tag used for grammar checks and unit-based invalidation.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// An identifier such as `auto`, stored in lower case.
    Keyword(String),
    /// A number with a unit.
    Numeric(NumericValue),
    /// A color.
    Color(Color),
    /// Free text.
    String(String),
    /// Gradient color stops.
    ColorStops(Vec<ColorStop>),
    /// Box shadows.
    Shadows(Vec<Shadow>),
    /// Transform functions.
    Transform(Vec<TransformPrimitive>),
    /// Text that still contains `var()` references.
    Term(VariableTerm),
}

impl PropertyValue {
    /// Creates a keyword value.
    #[must_use]
    pub fn keyword(word: &str) -> Self {
        Self::Keyword(word.to_ascii_lowercase())
    }

    /// Creates a pixel length.
    #[must_use]
    pub fn px(number: f32) -> Self {
        Self::Numeric(NumericValue::px(number))
    }

    /// Creates a numeric value.
    #[must_use]
    pub fn numeric(number: f32, unit: Unit) -> Self {
        Self::Numeric(NumericValue::new(number, unit))
    }

    /// The unit tag of this value.
    #[must_use]
    pub fn unit(&self) -> Unit {
        match self {
            Self::Keyword(_) => Unit::KEYWORD,
            Self::Numeric(n) => n.unit,
            Self::Color(_) => Unit::COLOR,
            Self::String(_) => Unit::STRING,
            Self::ColorStops(_) => Unit::COLOR_STOP_LIST,
            Self::Shadows(_) => Unit::SHADOW_LIST,
            Self::Transform(_) => Unit::TRANSFORM,
            Self::Term(_) => Unit::VARIABLE_TERM,
        }
    }

    /// The numeric payload, if any.
    #[must_use]
    pub fn as_numeric(&self) -> Option<NumericValue> {
        match self {
            Self::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    /// The keyword, if any.
    #[must_use]
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Self::Keyword(k) => Some(k),
            _ => None,
        }
    }

    /// The variable term, if this value is unresolved.
    #[must_use]
    pub fn as_term(&self) -> Option<&VariableTerm> {
        match self {
            Self::Term(t) => Some(t),
            _ => None,
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(k) => f.write_str(k),
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Color(c) => write!(f, "{c}"),
            Self::String(s) => f.write_str(s),
            Self::ColorStops(stops) => write_list(f, stops, ", "),
            Self::Shadows(shadows) => write_list(f, shadows, ", "),
            Self::Transform(list) => write_list(f, list, " "),
            Self::Term(term) => write!(f, "{term}"),
        }
    }
}

impl From<NumericValue> for PropertyValue {
    fn from(value: NumericValue) -> Self {
        Self::Numeric(value)
    }
}

impl From<Color> for PropertyValue {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}

impl From<VariableTerm> for PropertyValue {
    fn from(value: VariableTerm) -> Self {
        Self::Term(value)
    }
}

impl From<&str> for PropertyValue {
    /// Wraps text as a [`PropertyValue::String`].
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
