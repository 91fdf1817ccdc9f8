// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shorthand expansion grammars.

use alloc::string::ToString;

use smallvec::{SmallVec, smallvec};
use understory_value::{PropertyValue, Unit, tokenize};

use crate::{PropertyId, PropertyRegistry, ShorthandDefinition, ShorthandKind, StyleError};

/// Longhand values produced by one shorthand.
pub type Expansion = SmallVec<[(PropertyId, PropertyValue); 4]>;

/// Expands literal shorthand text into its longhands.
///
/// The text must not contain variable references; dependent shorthands are
/// substituted before they reach this function.
///
/// ```rust
/// use understory_cascade::{PropertyRegistry, expand_shorthand, props, shorthands};
///
/// let registry = PropertyRegistry::standard();
/// let flex = registry.shorthand(shorthands::FLEX).unwrap();
/// let values = expand_shorthand(flex, "2 auto", &registry).unwrap();
/// assert_eq!(values[0].0, props::FLEX_GROW);
/// assert_eq!(values[0].1.to_string(), "2");
/// assert_eq!(values[1].1.to_string(), "1");
/// assert_eq!(values[2].1.to_string(), "auto");
/// ```
pub fn expand_shorthand(
    def: &ShorthandDefinition,
    text: &str,
    registry: &PropertyRegistry,
) -> Result<Expansion, StyleError> {
    let malformed = || StyleError::MalformedShorthand {
        shorthand: def.name(),
        text: text.trim().to_string(),
    };
    let tokens = tokenize(text);
    let longhands = def.longhands();
    let parse = |id: PropertyId, token: &str| -> Result<PropertyValue, StyleError> {
        let grammar = registry.get(id).ok_or_else(malformed)?.grammar();
        grammar.parse(token).map_err(|_| malformed())
    };
    let values: SmallVec<[PropertyValue; 4]> = match def.kind() {
        ShorthandKind::Flex => expand_flex(&tokens, longhands[2], parse).ok_or_else(malformed)?,
        ShorthandKind::Box => {
            let picked: SmallVec<[&str; 4]> = match tokens[..] {
                [all] => smallvec![all, all, all, all],
                [v, h] => smallvec![v, h, v, h],
                [t, h, b] => smallvec![t, h, b, h],
                [t, r, b, l] => smallvec![t, r, b, l],
                _ => return Err(malformed()),
            };
            picked
                .iter()
                .zip(longhands)
                .map(|(token, id)| parse(*id, token))
                .collect::<Result<_, _>>()?
        }
    };
    Ok(longhands.iter().copied().zip(values).collect())
}

/// `flex`: `none`, `auto`, `<grow>`, `<basis>`, `<grow> <shrink>`,
/// `<grow> <basis>` or `<grow> <shrink> <basis>`.
fn expand_flex(
    tokens: &[&str],
    basis_id: PropertyId,
    parse: impl Fn(PropertyId, &str) -> Result<PropertyValue, StyleError>,
) -> Option<SmallVec<[PropertyValue; 4]>> {
    let number = |token: &str| -> Option<PropertyValue> {
        let value: f32 = token.parse().ok()?;
        value
            .is_finite()
            .then(|| PropertyValue::numeric(value, Unit::NUMBER))
    };
    let basis = |token: &str| parse(basis_id, token).ok();
    let zero = || PropertyValue::px(0.0);
    let auto = || PropertyValue::keyword("auto");
    let n = |v: f32| PropertyValue::numeric(v, Unit::NUMBER);

    let values = match *tokens {
        [word] if word.eq_ignore_ascii_case("none") => smallvec![n(0.0), n(0.0), auto()],
        [word] if word.eq_ignore_ascii_case("auto") => smallvec![n(1.0), n(1.0), auto()],
        [single] => match number(single) {
            Some(grow) => smallvec![grow, n(1.0), zero()],
            None => smallvec![n(1.0), n(1.0), basis(single)?],
        },
        [grow, second] => {
            let grow = number(grow)?;
            match number(second) {
                Some(shrink) => smallvec![grow, shrink, zero()],
                None => smallvec![grow, n(1.0), basis(second)?],
            }
        }
        [grow, shrink, flex_basis] => {
            smallvec![number(grow)?, number(shrink)?, basis(flex_basis)?]
        }
        _ => return None,
    };
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{props, shorthands};
    use alloc::string::String;
    use alloc::vec::Vec;

    fn expand(id: crate::ShorthandId, text: &str) -> Result<Vec<String>, StyleError> {
        let registry = PropertyRegistry::standard();
        let def = registry.shorthand(id).unwrap();
        Ok(expand_shorthand(def, text, &registry)?
            .iter()
            .map(|(_, v)| v.to_string())
            .collect())
    }

    #[test]
    fn flex_table() {
        let cases = [
            ("none", ["0", "0", "auto"]),
            ("auto", ["1", "1", "auto"]),
            ("1", ["1", "1", "0px"]),
            ("2", ["2", "1", "0px"]),
            ("2 0", ["2", "0", "0px"]),
            ("2 3", ["2", "3", "0px"]),
            ("2 auto", ["2", "1", "auto"]),
            ("2 0 auto", ["2", "0", "auto"]),
            ("0 0 auto", ["0", "0", "auto"]),
            ("0 0 50px", ["0", "0", "50px"]),
            ("0 0 0", ["0", "0", "0px"]),
            ("30%", ["1", "1", "30%"]),
        ];
        for (text, expected) in cases {
            assert_eq!(expand(shorthands::FLEX, text).unwrap(), expected, "flex: {text}");
        }
    }

    #[test]
    fn flex_rejects_garbage() {
        assert!(expand(shorthands::FLEX, "red").is_err());
        assert!(expand(shorthands::FLEX, "1 2 3 4").is_err());
        assert!(expand(shorthands::FLEX, "auto 1").is_err());
        assert!(expand(shorthands::FLEX, "").is_err());
    }

    #[test]
    fn box_rule() {
        assert_eq!(
            expand(shorthands::PADDING, "20px 5px").unwrap(),
            ["20px", "5px", "20px", "5px"]
        );
        assert_eq!(
            expand(shorthands::PADDING, "1px 2px 3px").unwrap(),
            ["1px", "2px", "3px", "2px"]
        );
        assert_eq!(
            expand(shorthands::MARGIN, "auto").unwrap(),
            ["auto", "auto", "auto", "auto"]
        );
        assert!(matches!(
            expand(shorthands::PADDING, "1px 2px 3px 4px 5px"),
            Err(StyleError::MalformedShorthand {
                shorthand: "padding",
                ..
            })
        ));
        assert!(expand(shorthands::PADDING, "auto").is_err());
    }

    #[test]
    fn expansion_targets_longhands_in_order() {
        let registry = PropertyRegistry::standard();
        let def = registry.shorthand(shorthands::PADDING).unwrap();
        let ids: Vec<_> = expand_shorthand(def, "1px", &registry)
            .unwrap()
            .iter()
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(
            ids,
            [
                props::PADDING_TOP,
                props::PADDING_RIGHT,
                props::PADDING_BOTTOM,
                props::PADDING_LEFT
            ]
        );
    }
}
