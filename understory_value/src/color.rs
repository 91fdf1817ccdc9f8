// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 8-bit sRGB colors with alpha.

use core::fmt;

use crate::ParseError;

/// An 8-bit per channel sRGB color with straight alpha.
///
/// ```rust
/// use understory_value::Color;
///
/// let c = Color::parse("#abc").unwrap();
/// assert_eq!(c, Color::rgb(0xaa, 0xbb, 0xcc));
/// assert_eq!(c.to_string(), "#aabbcc");
/// assert_eq!(Color::parse("rgba(0, 255, 0, 150)").unwrap().to_string(), "#00ff0096");
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel; 255 is opaque.
    pub a: u8,
}

const NAMED: &[(&str, Color)] = &[
    ("transparent", Color::rgba(0, 0, 0, 0)),
    ("black", Color::rgb(0, 0, 0)),
    ("white", Color::rgb(255, 255, 255)),
    ("red", Color::rgb(255, 0, 0)),
    ("lime", Color::rgb(0, 255, 0)),
    ("green", Color::rgb(0, 128, 0)),
    ("blue", Color::rgb(0, 0, 255)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("cyan", Color::rgb(0, 255, 255)),
    ("aqua", Color::rgb(0, 255, 255)),
    ("magenta", Color::rgb(255, 0, 255)),
    ("fuchsia", Color::rgb(255, 0, 255)),
    ("gray", Color::rgb(128, 128, 128)),
    ("grey", Color::rgb(128, 128, 128)),
    ("silver", Color::rgb(192, 192, 192)),
    ("maroon", Color::rgb(128, 0, 0)),
    ("olive", Color::rgb(128, 128, 0)),
    ("purple", Color::rgb(128, 0, 128)),
    ("teal", Color::rgb(0, 128, 128)),
    ("navy", Color::rgb(0, 0, 128)),
    ("orange", Color::rgb(255, 165, 0)),
];

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Creates an opaque color.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Creates a color with alpha.
    #[inline]
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns `true` if `text` starts like a color token.
    #[must_use]
    pub fn is_color_start(text: &str) -> bool {
        let lower = text.trim_start();
        lower.starts_with('#')
            || starts_with_ignore_case(lower, "rgb(")
            || starts_with_ignore_case(lower, "rgba(")
            || Self::named(lower).is_some()
    }

    /// Looks up a CSS color keyword.
    #[must_use]
    pub fn named(name: &str) -> Option<Self> {
        NAMED
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| *c)
    }

    /// Parses `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()` or a
    /// color keyword. Functional alpha is given in the `0..=255` range.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.trim();
        if let Some(hex) = text.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ParseError::new("invalid hex color", text));
        }
        if let Some(args) = strip_function(text, "rgba").or_else(|| strip_function(text, "rgb")) {
            return parse_channels(args).ok_or_else(|| ParseError::new("invalid rgb color", text));
        }
        Self::named(text).ok_or_else(|| ParseError::new("unknown color", text))
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Returns the argument text of `name(...)` if `text` is exactly that call.
fn strip_function<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    if !starts_with_ignore_case(text, name) {
        return None;
    }
    text[name.len()..]
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok();
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 | 4 => {
            let mut c = [0_u8, 0, 0, 255];
            for (i, slot) in c.iter_mut().enumerate().take(hex.len()) {
                *slot = nibble(i)? * 17;
            }
            Some(Color::rgba(c[0], c[1], c[2], c[3]))
        }
        6 | 8 => {
            let mut c = [0_u8, 0, 0, 255];
            for (i, slot) in c.iter_mut().enumerate().take(hex.len() / 2) {
                *slot = byte(i * 2)?;
            }
            Some(Color::rgba(c[0], c[1], c[2], c[3]))
        }
        _ => None,
    }
}

fn parse_channels(args: &str) -> Option<Color> {
    let mut c = [0_u8, 0, 0, 255];
    let mut count = 0;
    for part in args.split(',') {
        if count == 4 {
            return None;
        }
        let value: f32 = part.trim().parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "clamped to the channel range before the cast"
        )]
        let channel = (value.clamp(0.0, 255.0) + 0.5) as u8;
        c[count] = channel;
        count += 1;
    }
    (count >= 3).then(|| Color::rgba(c[0], c[1], c[2], c[3]))
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}
