// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! List-valued properties: gradient color stops, box shadows and transforms.

use alloc::vec::Vec;
use core::fmt;

use crate::parse::{split_commas, split_spaces};
use crate::{Color, NumericValue, ParseError, Unit};

/// One stop of a gradient color-stop list.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColorStop {
    /// Stop color.
    pub color: Color,
    /// Optional position along the gradient line.
    pub position: Option<NumericValue>,
}

impl ColorStop {
    /// Parses a comma-separated color-stop list such as `red 5px, blue 50%`.
    ///
    /// A stop with two positions expands into two stops of the same color.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, ParseError> {
        let mut stops = Vec::new();
        for item in split_commas(text) {
            let tokens = split_spaces(item);
            let Some((color, positions)) = tokens.split_first() else {
                return Err(ParseError::new("empty color stop", text));
            };
            let color = Color::parse(color)?;
            if positions.len() > 2 {
                return Err(ParseError::new("too many stop positions", item));
            }
            if positions.is_empty() {
                stops.push(Self {
                    color,
                    position: None,
                });
            }
            for position in positions {
                let position = length_percent(position)?;
                stops.push(Self {
                    color,
                    position: Some(position),
                });
            }
        }
        Ok(stops)
    }
}

fn length_percent(token: &str) -> Result<NumericValue, ParseError> {
    let value = NumericValue::parse(token)?;
    match value.unit {
        unit if Unit::LENGTH_PERCENT.contains(unit) => Ok(value),
        Unit::NUMBER if value.number == 0.0 => Ok(NumericValue::px(0.0)),
        _ => Err(ParseError::new("expected a length or percentage", token)),
    }
}

fn length(token: &str) -> Result<NumericValue, ParseError> {
    let value = length_percent(token)?;
    if value.unit == Unit::PERCENT {
        return Err(ParseError::new("expected a length", token));
    }
    Ok(value)
}

impl fmt::Display for ColorStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{} {position}", self.color),
            None => write!(f, "{}", self.color),
        }
    }
}

/// One entry of a box-shadow list.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Shadow {
    /// Shadow color; black when omitted.
    pub color: Color,
    /// Horizontal offset.
    pub offset_x: NumericValue,
    /// Vertical offset.
    pub offset_y: NumericValue,
    /// Blur radius, if given.
    pub blur: Option<NumericValue>,
    /// Spread distance, if given.
    pub spread: Option<NumericValue>,
    /// Inner shadow.
    pub inset: bool,
}

impl Shadow {
    /// Parses a comma-separated list of `[color] x y [blur [spread]] [inset]`.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, ParseError> {
        split_commas(text).into_iter().map(Self::parse_one).collect()
    }

    fn parse_one(item: &str) -> Result<Self, ParseError> {
        let mut color = None;
        let mut inset = false;
        let mut lengths = Vec::new();
        for token in split_spaces(item) {
            if token.eq_ignore_ascii_case("inset") && !inset {
                inset = true;
            } else if color.is_none() && Color::is_color_start(token) {
                color = Some(Color::parse(token)?);
            } else {
                lengths.push(length(token)?);
            }
        }
        let (offset_x, offset_y, blur, spread) = match lengths[..] {
            [x, y] => (x, y, None, None),
            [x, y, b] => (x, y, Some(b), None),
            [x, y, b, s] => (x, y, Some(b), Some(s)),
            _ => return Err(ParseError::new("expected two to four shadow lengths", item)),
        };
        Ok(Self {
            color: color.unwrap_or(Color::BLACK),
            offset_x,
            offset_y,
            blur,
            spread,
            inset,
        })
    }
}

impl fmt::Display for Shadow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.color, self.offset_x, self.offset_y)?;
        if let Some(blur) = self.blur {
            write!(f, " {blur}")?;
        }
        if let Some(spread) = self.spread {
            write!(f, " {spread}")?;
        }
        if self.inset {
            f.write_str(" inset")?;
        }
        Ok(())
    }
}

/// Transform functions: name, argument count range, accepted units.
const TRANSFORM_FUNCTIONS: &[(&str, usize, usize, Unit)] = &[
    ("translateX", 1, 1, Unit::LENGTH_PERCENT),
    ("translateY", 1, 1, Unit::LENGTH_PERCENT),
    ("translateZ", 1, 1, Unit::LENGTH),
    ("translate", 1, 2, Unit::LENGTH_PERCENT),
    ("scaleX", 1, 1, Unit::NUMBER),
    ("scaleY", 1, 1, Unit::NUMBER),
    ("scale", 1, 2, Unit::NUMBER),
    ("rotate", 1, 1, Unit::ANGLE),
    ("rotateX", 1, 1, Unit::ANGLE),
    ("rotateY", 1, 1, Unit::ANGLE),
    ("rotateZ", 1, 1, Unit::ANGLE),
    ("skewX", 1, 1, Unit::ANGLE),
    ("skewY", 1, 1, Unit::ANGLE),
    ("skew", 1, 2, Unit::ANGLE),
    ("perspective", 1, 1, Unit::LENGTH),
];

/// A single transform function such as `translate(20in, 50em)`.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformPrimitive {
    name: &'static str,
    args: Vec<NumericValue>,
}

impl TransformPrimitive {
    /// Canonical function name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Function arguments.
    #[must_use]
    pub fn args(&self) -> &[NumericValue] {
        &self.args
    }

    /// Parses a space-separated list of transform functions.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, ParseError> {
        split_spaces(text).into_iter().map(Self::parse_one).collect()
    }

    fn parse_one(call: &str) -> Result<Self, ParseError> {
        let open = call
            .find('(')
            .ok_or_else(|| ParseError::new("expected a transform function", call))?;
        let inner = call[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| ParseError::new("unterminated transform function", call))?;
        let requested = call[..open].trim();
        let &(name, min, max, units) = TRANSFORM_FUNCTIONS
            .iter()
            .find(|(name, ..)| name.eq_ignore_ascii_case(requested))
            .ok_or_else(|| ParseError::new("unknown transform function", call))?;
        let mut args = Vec::new();
        for arg in split_commas(inner) {
            let mut value = NumericValue::parse(arg)?;
            if value.unit == Unit::NUMBER && value.number == 0.0 && !units.contains(Unit::NUMBER) {
                value.unit = if units.intersects(Unit::LENGTH) {
                    Unit::PX
                } else {
                    Unit::DEG
                };
            }
            if !units.contains(value.unit) {
                return Err(ParseError::new("invalid transform argument", call));
            }
            args.push(value);
        }
        if args.len() < min || args.len() > max {
            return Err(ParseError::new("wrong number of transform arguments", call));
        }
        Ok(Self { name, args })
    }
}

impl fmt::Display for TransformPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}
