// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Value: typed style property values.
//!
//! This crate defines the values a style cascade stores and compares, along
//! with a compact text codec. It does not resolve anything; cascading,
//! inheritance and `var()` substitution live in `understory_cascade`.
//!
//! ## Core Concepts
//!
//! - [`Unit`] - bit set of unit tags. A value carries exactly one bit; a
//!   property's accepted set and invalidation masks are unions.
//! - [`PropertyValue`] - tagged union of keyword, number + unit, color,
//!   string, color-stop list, shadow list, transform list and variable term.
//! - [`VariableTerm`] - raw text with `var(name[, fallback])` references,
//!   kept unresolved until a cascade substitutes it.
//! - [`ValueGrammar`] - what one property accepts; drives parsing.
//!
//! ## Canonical Serialization
//!
//! `Display` on every value produces canonical text, and parsing that text
//! with the same grammar yields an equal value:
//!
//! - numbers use the shortest form followed by the unit suffix (`10em`,
//!   `5.2cm`, `150%`, and no suffix for plain numbers);
//! - colors are lower-case `#rrggbb`, or `#rrggbbaa` when not opaque;
//! - lists are comma separated (stops, shadows) or space separated
//!   (transforms).
//!
//! ```rust
//! use understory_value::{Unit, ValueGrammar};
//!
//! let width = ValueGrammar::new(Unit::LENGTH_PERCENT).with_keywords(&["auto"]);
//! assert_eq!(width.parse("10.00em").unwrap().to_string(), "10em");
//!
//! let gradient = ValueGrammar::new(Unit::COLOR_STOP_LIST);
//! let stops = gradient.parse("red 50px 20%, blue 10in").unwrap();
//! assert_eq!(stops.to_string(), "#ff0000 50px, #ff0000 20%, #0000ff 10in");
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod color;
mod composite;
mod error;
mod numeric;
mod parse;
mod term;
mod unit;
mod value;

pub use color::Color;
pub use composite::{ColorStop, Shadow, TransformPrimitive};
pub use error::ParseError;
pub use numeric::NumericValue;
pub use parse::{ValueGrammar, tokenize};
pub use term::{TermAtom, VariableTerm};
pub use unit::Unit;
pub use value::PropertyValue;
