// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Unresolved text with `var()` references.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::ParseError;

/// One piece of a [`VariableTerm`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermAtom {
    /// Text copied verbatim into the substituted result.
    Literal(String),
    /// A `var(name[, fallback])` reference.
    Reference {
        /// Variable name, including its leading `--`.
        name: String,
        /// Term used when the variable is missing or fails to resolve.
        fallback: Option<Box<VariableTerm>>,
    },
}

/// Text made of literal fragments and `var()` references.
///
/// Terms are stored raw and substituted at resolution time; fallbacks are
/// terms themselves and may nest further references.
///
/// ```rust
/// use understory_value::VariableTerm;
///
/// let term = VariableTerm::parse("var(--v) var(--h, 7px)").unwrap();
/// let names: Vec<&str> = term.references().collect();
/// assert_eq!(names, ["--v", "--h"]);
/// assert_eq!(term.to_string(), "var(--v) var(--h, 7px)");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct VariableTerm {
    atoms: Vec<TermAtom>,
}

impl VariableTerm {
    /// Returns `true` if `text` contains a `var(` reference.
    #[must_use]
    pub fn contains_reference(text: &str) -> bool {
        find_var(text, 0).is_some()
    }

    /// Creates a term made of a single literal fragment.
    #[must_use]
    pub fn literal(text: &str) -> Self {
        let mut term = Self::default();
        term.push_literal(text);
        term
    }

    /// Parses text into literal fragments and references.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut term = Self::default();
        let mut cursor = 0;
        while let Some(start) = find_var(text, cursor) {
            term.push_literal(&text[cursor..start]);
            let args_start = start + "var(".len();
            let close = matching_paren(text, args_start)
                .ok_or_else(|| ParseError::new("unbalanced var()", text))?;
            let args = &text[args_start..close];
            let (name, fallback) = match top_level_comma(args) {
                Some(comma) => (&args[..comma], Some(args[comma + 1..].trim())),
                None => (args, None),
            };
            let name = name.trim();
            if !name.starts_with("--") || name.len() == 2 {
                return Err(ParseError::new("invalid variable name", text));
            }
            let fallback = fallback.map(Self::parse).transpose()?.map(Box::new);
            term.atoms.push(TermAtom::Reference {
                name: name.to_string(),
                fallback,
            });
            cursor = close + 1;
        }
        term.push_literal(&text[cursor..]);
        Ok(term)
    }

    fn push_literal(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(TermAtom::Literal(last)) = self.atoms.last_mut() {
            last.push_str(text);
        } else {
            self.atoms.push(TermAtom::Literal(text.to_string()));
        }
    }

    /// The atoms of this term in order.
    #[must_use]
    pub fn atoms(&self) -> &[TermAtom] {
        &self.atoms
    }

    /// Returns `true` if the term has any reference.
    #[must_use]
    pub fn has_references(&self) -> bool {
        self.atoms
            .iter()
            .any(|atom| matches!(atom, TermAtom::Reference { .. }))
    }

    /// Iterates over the names this term references, including inside
    /// fallbacks, in textual order.
    pub fn references(&self) -> impl Iterator<Item = &str> + '_ {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out.into_iter()
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        for atom in &self.atoms {
            if let TermAtom::Reference { name, fallback } = atom {
                out.push(name);
                if let Some(fallback) = fallback {
                    fallback.collect_references(out);
                }
            }
        }
    }
}

fn find_var(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i + 4 <= bytes.len() {
        if bytes[i..i + 4].eq_ignore_ascii_case(b"var(")
            && (i == 0 || !is_ident_byte(bytes[i - 1]))
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Index of the `)` closing a group whose contents start at `start`.
fn matching_paren(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0_usize;
    for (i, b) in text.bytes().enumerate().skip(start) {
        match b {
            b'(' => depth += 1,
            b')' if depth == 0 => return Some(i),
            b')' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn top_level_comma(args: &str) -> Option<usize> {
    let mut depth = 0_usize;
    for (i, b) in args.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

impl fmt::Display for VariableTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for atom in &self.atoms {
            match atom {
                TermAtom::Literal(text) => f.write_str(text)?,
                TermAtom::Reference {
                    name,
                    fallback: None,
                } => write!(f, "var({name})")?,
                TermAtom::Reference {
                    name,
                    fallback: Some(fallback),
                } => write!(f, "var({name}, {fallback})")?,
            }
        }
        Ok(())
    }
}
