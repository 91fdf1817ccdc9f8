// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::{String, ToString};
use core::fmt;

/// Error returned when text does not match a value grammar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    reason: &'static str,
    input: String,
}

impl ParseError {
    /// Creates an error for `input` with a short static reason.
    #[must_use]
    pub fn new(reason: &'static str, input: &str) -> Self {
        Self {
            reason,
            input: input.to_string(),
        }
    }

    /// The reason the input was rejected.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        self.reason
    }

    /// The offending input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: `{}`", self.reason, self.input)
    }
}

impl core::error::Error for ParseError {}
