// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Numbers tagged with a unit.

use core::fmt;

use crate::{ParseError, Unit};

/// A number carrying exactly one numeric [`Unit`].
///
/// Serialization uses the shortest number form followed by the unit suffix:
///
/// ```rust
/// use understory_value::{NumericValue, Unit};
///
/// assert_eq!(NumericValue::new(5.2, Unit::CM).to_string(), "5.2cm");
/// assert_eq!(NumericValue::new(150.0, Unit::PERCENT).to_string(), "150%");
/// assert_eq!(NumericValue::new(2.0, Unit::NUMBER).to_string(), "2");
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NumericValue {
    /// The magnitude.
    pub number: f32,
    /// The unit tag; a single bit within [`Unit::NUMERIC`].
    pub unit: Unit,
}

impl NumericValue {
    /// Creates a numeric value.
    #[inline]
    #[must_use]
    pub const fn new(number: f32, unit: Unit) -> Self {
        Self { number, unit }
    }

    /// Shorthand for a pixel length.
    #[inline]
    #[must_use]
    pub const fn px(number: f32) -> Self {
        Self::new(number, Unit::PX)
    }

    /// Shorthand for a unit-less number.
    #[inline]
    #[must_use]
    pub const fn number(number: f32) -> Self {
        Self::new(number, Unit::NUMBER)
    }

    /// Parses a single numeric token such as `10px`, `-1.5em` or `50%`.
    pub fn parse(token: &str) -> Result<Self, ParseError> {
        let (digits, unit) =
            Unit::split_suffix(token).ok_or_else(|| ParseError::new("unknown unit", token))?;
        if digits.is_empty() || !looks_numeric(digits) {
            return Err(ParseError::new("expected a number", token));
        }
        let number: f32 = digits
            .parse()
            .map_err(|_| ParseError::new("expected a number", token))?;
        if !number.is_finite() {
            return Err(ParseError::new("number out of range", token));
        }
        Ok(Self::new(number, unit))
    }
}

/// Guards against `inf`/`nan` spellings that `f32::from_str` accepts.
fn looks_numeric(text: &str) -> bool {
    text.bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        && text.bytes().any(|b| b.is_ascii_digit())
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Avoid printing `-0`.
        let number = if self.number == 0.0 { 0.0 } else { self.number };
        write!(f, "{number}{}", self.unit.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn parse_with_units() {
        assert_eq!(NumericValue::parse("10px"), Ok(NumericValue::px(10.0)));
        assert_eq!(
            NumericValue::parse("10.00em"),
            Ok(NumericValue::new(10.0, Unit::EM))
        );
        assert_eq!(
            NumericValue::parse("-.5rem"),
            Ok(NumericValue::new(-0.5, Unit::REM))
        );
        assert_eq!(NumericValue::parse("3"), Ok(NumericValue::number(3.0)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(NumericValue::parse("px").is_err());
        assert!(NumericValue::parse("inf").is_err());
        assert!(NumericValue::parse("nanpx").is_err());
        assert!(NumericValue::parse("10qq").is_err());
        assert!(NumericValue::parse("").is_err());
    }

    #[test]
    fn display_is_shortest_form() {
        assert_eq!(NumericValue::new(10.0, Unit::EM).to_string(), "10em");
        assert_eq!(NumericValue::new(0.25, Unit::DEG).to_string(), "0.25deg");
        assert_eq!(NumericValue::new(-0.0, Unit::PX).to_string(), "0px");
        assert_eq!(NumericValue::new(20.0, Unit::INCH).to_string(), "20in");
    }
}
