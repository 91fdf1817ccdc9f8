// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grammar-driven parsing of declaration text.

use alloc::string::ToString;
use alloc::vec::Vec;

use crate::{
    Color, ColorStop, NumericValue, ParseError, PropertyValue, Shadow, TransformPrimitive, Unit,
    VariableTerm,
};

/// What a single property accepts.
///
/// A grammar is a set of accepted [`Unit`]s plus a list of keywords. Parsing
/// tries keywords first, then each accepted value form in turn.
///
/// ```rust
/// use understory_value::{PropertyValue, Unit, ValueGrammar};
///
/// let width = ValueGrammar::new(Unit::LENGTH_PERCENT).with_keywords(&["auto"]);
/// assert_eq!(width.parse("10.00em").unwrap().to_string(), "10em");
/// assert_eq!(width.parse("AUTO").unwrap(), PropertyValue::keyword("auto"));
/// // A bare zero is a length when plain numbers are not accepted.
/// assert_eq!(width.parse("0").unwrap().to_string(), "0px");
/// assert!(width.parse("red").is_err());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ValueGrammar {
    units: Unit,
    keywords: &'static [&'static str],
}

impl ValueGrammar {
    /// Creates a grammar accepting the given units and no keywords.
    #[inline]
    #[must_use]
    pub const fn new(units: Unit) -> Self {
        Self {
            units,
            keywords: &[],
        }
    }

    /// Adds the accepted keywords. Keywords always carry [`Unit::KEYWORD`].
    #[inline]
    #[must_use]
    pub const fn with_keywords(mut self, keywords: &'static [&'static str]) -> Self {
        self.keywords = keywords;
        self
    }

    /// Accepted units, including [`Unit::KEYWORD`] when keywords are present.
    #[must_use]
    pub fn units(&self) -> Unit {
        if self.keywords.is_empty() {
            self.units
        } else {
            self.units | Unit::KEYWORD
        }
    }

    /// Accepted keywords.
    #[must_use]
    pub fn keywords(&self) -> &'static [&'static str] {
        self.keywords
    }

    /// Returns `true` if a value with `unit` may be stored for this grammar.
    ///
    /// Variable terms are always accepted; they are validated once substituted.
    #[must_use]
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match value {
            PropertyValue::Term(_) => true,
            PropertyValue::Keyword(word) => self.keywords.iter().any(|k| k == word),
            other => self.units.contains(other.unit()),
        }
    }

    /// Parses declaration text into a value.
    ///
    /// Text containing `var(` becomes a [`PropertyValue::Term`].
    pub fn parse(&self, text: &str) -> Result<PropertyValue, ParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseError::new("empty value", text));
        }
        if VariableTerm::contains_reference(text) {
            return VariableTerm::parse(text).map(PropertyValue::Term);
        }
        if let Some(keyword) = self.keywords.iter().find(|k| k.eq_ignore_ascii_case(text)) {
            return Ok(PropertyValue::keyword(keyword));
        }
        let units = self.units;
        if units.contains(Unit::COLOR_STOP_LIST) {
            return ColorStop::parse_list(text).map(PropertyValue::ColorStops);
        }
        if units.contains(Unit::SHADOW_LIST) {
            return Shadow::parse_list(text).map(PropertyValue::Shadows);
        }
        if units.contains(Unit::TRANSFORM) {
            return TransformPrimitive::parse_list(text).map(PropertyValue::Transform);
        }
        if units.contains(Unit::COLOR) {
            if let Ok(color) = Color::parse(text) {
                return Ok(PropertyValue::Color(color));
            }
        }
        if units.intersects(Unit::NUMERIC) {
            if let Ok(value) = NumericValue::parse(text) {
                if let Some(value) = self.coerce_numeric(value) {
                    return Ok(PropertyValue::Numeric(value));
                }
            }
        }
        if units.contains(Unit::STRING) {
            return Ok(PropertyValue::String(unquote(text).to_string()));
        }
        Err(ParseError::new("value does not match the property grammar", text))
    }

    fn coerce_numeric(&self, mut value: NumericValue) -> Option<NumericValue> {
        if value.unit == Unit::NUMBER && value.number == 0.0 && !self.units.contains(Unit::NUMBER)
        {
            if self.units.intersects(Unit::LENGTH) {
                value.unit = Unit::PX;
            } else if self.units.intersects(Unit::ANGLE) {
                value.unit = Unit::DEG;
            }
        }
        self.units.contains(value.unit).then_some(value)
    }
}

fn unquote(text: &str) -> &str {
    let quoted = text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')));
    if quoted { &text[1..text.len() - 1] } else { text }
}

/// Splits at top-level commas, trimming each piece. Empty pieces are kept.
pub(crate) fn split_commas(text: &str) -> Vec<&str> {
    split_top_level(text, |b| b == b',', true)
}

/// Splits at top-level whitespace, dropping empty pieces.
pub(crate) fn split_spaces(text: &str) -> Vec<&str> {
    split_top_level(text, |b| b.is_ascii_whitespace(), false)
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn split_top_level(text: &str, is_sep: impl Fn(u8) -> bool, keep_last: bool) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0_usize;
    let mut quote = None;
    let mut start = 0;
    for (i, b) in text.bytes().enumerate() {
        match (quote, b) {
            (Some(q), _) if q == b => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'(') => depth += 1,
            (None, b')') => depth = depth.saturating_sub(1),
            (None, _) if depth == 0 && is_sep(b) => {
                pieces.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if keep_last || !last.is_empty() {
        pieces.push(last);
    }
    pieces
}

/// Splits a shorthand value into its top-level space-separated tokens.
#[must_use]
pub fn tokenize(text: &str) -> Vec<&str> {
    split_spaces(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn splitting_respects_parens() {
        assert_eq!(
            split_commas("red 5px, rgba(0, 0, 0, 1) 2px"),
            ["red 5px", "rgba(0, 0, 0, 1) 2px"]
        );
        assert_eq!(
            split_spaces("  rgba(0, 0, 0, 1)   2px "),
            ["rgba(0, 0, 0, 1)", "2px"]
        );
        assert_eq!(split_spaces("\"a b\" c"), ["\"a b\"", "c"]);
    }

    #[test]
    fn grammar_dispatch() {
        let color = ValueGrammar::new(Unit::COLOR);
        assert_eq!(color.parse("#abc").unwrap().to_string(), "#aabbcc");
        assert_eq!(color.parse("red").unwrap().to_string(), "#ff0000");

        let number = ValueGrammar::new(Unit::NUMBER);
        assert_eq!(number.parse("2").unwrap().to_string(), "2");
        assert!(number.parse("2px").is_err());

        let text = ValueGrammar::new(Unit::STRING);
        assert_eq!(
            text.parse("\"Delicious\"").unwrap(),
            PropertyValue::String("Delicious".into())
        );
    }

    #[test]
    fn composite_grammars() {
        let gradient = ValueGrammar::new(Unit::COLOR_STOP_LIST);
        assert_eq!(
            gradient.parse("red 5px, blue 50%").unwrap().to_string(),
            "#ff0000 5px, #0000ff 50%"
        );
        let shadow = ValueGrammar::new(Unit::SHADOW_LIST).with_keywords(&["none"]);
        assert_eq!(
            shadow.parse("2px 2px 0px, #00ff 4px 4px 2em").unwrap().to_string(),
            "#000000 2px 2px 0px, #0000ff 4px 4px 2em"
        );
        assert_eq!(shadow.parse("none").unwrap(), PropertyValue::keyword("none"));
        let transform = ValueGrammar::new(Unit::TRANSFORM).with_keywords(&["none"]);
        assert_eq!(
            transform.parse("translateX(10px)").unwrap().to_string(),
            "translateX(10px)"
        );
    }

    #[test]
    fn var_text_becomes_term() {
        let g = ValueGrammar::new(Unit::COLOR);
        let value = g.parse("var(--missing-var, #ff0000)").unwrap();
        assert_eq!(value.unit(), Unit::VARIABLE_TERM);
        assert!(g.accepts(&value));
    }

    #[test]
    fn canonical_round_trip() {
        let cases = [
            (ValueGrammar::new(Unit::LENGTH_PERCENT), "5.2cm"),
            (ValueGrammar::new(Unit::LENGTH_PERCENT), "150%"),
            (ValueGrammar::new(Unit::COLOR), "#00ff0096"),
            (ValueGrammar::new(Unit::TRANSFORM), "translate(20in, 50em)"),
            (ValueGrammar::new(Unit::SHADOW_LIST), "#0000ff 4px 4px 2em inset"),
            (ValueGrammar::new(Unit::COLOR_STOP_LIST), "#ff0000, #0000ff 50%"),
        ];
        for (grammar, text) in cases {
            let value = grammar.parse(text).unwrap();
            assert_eq!(value.to_string(), text);
            assert_eq!(grammar.parse(&value.to_string()).unwrap(), value);
        }
    }
}
