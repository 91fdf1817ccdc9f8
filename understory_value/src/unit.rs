// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Unit tags for property values.
//!
//! [`Unit`] is a bit set: a single bit tags a concrete value, and unions of
//! bits describe the set of units a property accepts or the mask used when
//! invalidating unit-relative values after a context change.

use bitflags::bitflags;

bitflags! {
    /// Unit tag of a [`PropertyValue`](crate::PropertyValue).
    ///
    /// A concrete value always carries exactly one bit. Composite constants
    /// (such as [`Unit::LENGTH`]) are masks for matching.
    ///
    /// ```rust
    /// use understory_value::Unit;
    ///
    /// assert!(Unit::LENGTH.contains(Unit::EM));
    /// assert!(Unit::VIEWPORT.intersects(Unit::VW | Unit::PX));
    /// assert_eq!(Unit::CM.suffix(), "cm");
    /// ```
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Unit: u32 {
        /// An identifier such as `auto` or `none`.
        const KEYWORD = 1 << 0;
        /// Free text.
        const STRING = 1 << 1;
        /// An sRGB color with alpha.
        const COLOR = 1 << 2;
        /// A unit-less number.
        const NUMBER = 1 << 3;
        /// CSS pixels.
        const PX = 1 << 4;
        /// Density-independent pixels, scaled by the device pixel ratio.
        const DP = 1 << 5;
        /// Percent of the viewport width.
        const VW = 1 << 6;
        /// Percent of the viewport height.
        const VH = 1 << 7;
        /// Multiple of the element font size.
        const EM = 1 << 8;
        /// Multiple of the root element font size.
        const REM = 1 << 9;
        /// Percent of a property-specific base value.
        const PERCENT = 1 << 10;
        /// Inches.
        const INCH = 1 << 11;
        /// Centimeters.
        const CM = 1 << 12;
        /// Millimeters.
        const MM = 1 << 13;
        /// Points (1/72 inch).
        const PT = 1 << 14;
        /// Picas (1/6 inch).
        const PC = 1 << 15;
        /// Degrees.
        const DEG = 1 << 16;
        /// Radians.
        const RAD = 1 << 17;
        /// A list of gradient color stops.
        const COLOR_STOP_LIST = 1 << 18;
        /// A list of box shadows.
        const SHADOW_LIST = 1 << 19;
        /// A list of transform primitives.
        const TRANSFORM = 1 << 20;
        /// Unresolved text containing `var()` references.
        const VARIABLE_TERM = 1 << 21;

        /// Lengths that do not depend on any context.
        const ABSOLUTE_LENGTH = Self::PX.bits()
            | Self::INCH.bits()
            | Self::CM.bits()
            | Self::MM.bits()
            | Self::PT.bits()
            | Self::PC.bits();
        /// Viewport-relative lengths.
        const VIEWPORT = Self::VW.bits() | Self::VH.bits();
        /// Font-relative lengths.
        const FONT_RELATIVE = Self::EM.bits() | Self::REM.bits();
        /// Every length unit.
        const LENGTH = Self::ABSOLUTE_LENGTH.bits()
            | Self::DP.bits()
            | Self::VIEWPORT.bits()
            | Self::FONT_RELATIVE.bits();
        /// Lengths and percentages.
        const LENGTH_PERCENT = Self::LENGTH.bits() | Self::PERCENT.bits();
        /// Numbers, lengths and percentages.
        const NUMBER_LENGTH_PERCENT = Self::NUMBER.bits() | Self::LENGTH_PERCENT.bits();
        /// Angles.
        const ANGLE = Self::DEG.bits() | Self::RAD.bits();
        /// Every unit carried by a [`NumericValue`](crate::NumericValue).
        const NUMERIC = Self::NUMBER_LENGTH_PERCENT.bits() | Self::ANGLE.bits();
    }
}

/// Suffixes in match order; longer suffixes sharing a tail come first.
const SUFFIXES: &[(&str, Unit)] = &[
    ("px", Unit::PX),
    ("dp", Unit::DP),
    ("vw", Unit::VW),
    ("vh", Unit::VH),
    ("rem", Unit::REM),
    ("em", Unit::EM),
    ("%", Unit::PERCENT),
    ("in", Unit::INCH),
    ("cm", Unit::CM),
    ("mm", Unit::MM),
    ("pt", Unit::PT),
    ("pc", Unit::PC),
    ("deg", Unit::DEG),
    ("rad", Unit::RAD),
];

impl Unit {
    /// Returns the canonical serialization suffix of a single numeric unit.
    ///
    /// Unit-less numbers and non-numeric units have an empty suffix.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        SUFFIXES
            .iter()
            .find(|(_, unit)| *unit == self)
            .map_or("", |(suffix, _)| suffix)
    }

    /// Splits a numeric token into its number text and unit.
    ///
    /// Returns `None` if the token has an unknown suffix.
    #[must_use]
    pub fn split_suffix(token: &str) -> Option<(&str, Self)> {
        let lower_end = token
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_alphabetic() || *c == '%')
            .last()
            .map_or(token.len(), |(idx, _)| idx);
        let (number, suffix) = token.split_at(lower_end);
        if suffix.is_empty() {
            return Some((number, Self::NUMBER));
        }
        SUFFIXES
            .iter()
            .find(|(text, _)| text.eq_ignore_ascii_case(suffix))
            .map(|(_, unit)| (number, *unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_cover_members() {
        assert!(Unit::LENGTH.contains(Unit::PX | Unit::DP | Unit::VH | Unit::REM));
        assert!(!Unit::LENGTH.contains(Unit::PERCENT));
        assert!(Unit::LENGTH_PERCENT.contains(Unit::PERCENT));
        assert!(Unit::NUMERIC.contains(Unit::RAD | Unit::NUMBER));
        assert!(!Unit::NUMERIC.intersects(Unit::COLOR | Unit::KEYWORD));
    }

    #[test]
    fn split_suffix_recognizes_units() {
        assert_eq!(Unit::split_suffix("10px"), Some(("10", Unit::PX)));
        assert_eq!(Unit::split_suffix("1.5rem"), Some(("1.5", Unit::REM)));
        assert_eq!(Unit::split_suffix("2em"), Some(("2", Unit::EM)));
        assert_eq!(Unit::split_suffix("50%"), Some(("50", Unit::PERCENT)));
        assert_eq!(Unit::split_suffix("3"), Some(("3", Unit::NUMBER)));
        assert_eq!(Unit::split_suffix("45DEG"), Some(("45", Unit::DEG)));
        assert_eq!(Unit::split_suffix("3furlongs"), None);
    }

    #[test]
    fn suffix_of_number_is_empty() {
        assert_eq!(Unit::NUMBER.suffix(), "");
        assert_eq!(Unit::PERCENT.suffix(), "%");
        assert_eq!(Unit::INCH.suffix(), "in");
    }
}
