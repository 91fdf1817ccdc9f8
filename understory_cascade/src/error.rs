// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors returned at mutation boundaries and diagnostics raised while
//! resolving.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use understory_value::{ParseError, Unit};

/// Error rejecting a mutation.
///
/// The style record is left unchanged when one of these is returned.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleError {
    /// A by-name API was given a name that is not registered.
    UnknownProperty(String),
    /// The value's unit is not accepted by the property.
    UnitMismatch {
        /// Property name.
        property: &'static str,
        /// Unit of the rejected value.
        unit: Unit,
    },
    /// Text did not match the shorthand grammar.
    MalformedShorthand {
        /// Shorthand name.
        shorthand: &'static str,
        /// The rejected text.
        text: String,
    },
    /// Text did not match the property grammar.
    Parse(ParseError),
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProperty(name) => write!(f, "unknown property `{name}`"),
            Self::UnitMismatch { property, unit } => {
                write!(f, "`{property}` does not accept values of unit {unit:?}")
            }
            Self::MalformedShorthand { shorthand, text } => {
                write!(f, "malformed `{shorthand}` shorthand: `{text}`")
            }
            Self::Parse(err) => write!(f, "{err}"),
        }
    }
}

impl core::error::Error for StyleError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseError> for StyleError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

/// Recoverable problem found while resolving values.
///
/// Diagnostics never abort a compute pass. The affected key keeps its prior
/// computed value and independent keys are unaffected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StyleDiagnostic {
    /// A reference names a variable that is not declared on the node or any
    /// ancestor, and has no fallback.
    UnresolvedVariable {
        /// The property, shorthand or variable whose value holds the reference.
        referrer: String,
        /// The missing variable.
        name: String,
    },
    /// Variables that reference each other.
    CyclicVariable {
        /// Members of the cycle in name order.
        cycle: Vec<String>,
    },
    /// A dependent shorthand substituted into text its grammar rejects.
    MalformedShorthand {
        /// Shorthand name.
        shorthand: &'static str,
        /// The substituted text.
        text: String,
    },
    /// A substituted longhand value does not match the property grammar.
    InvalidValue {
        /// Property name.
        property: &'static str,
        /// The substituted text.
        text: String,
    },
}

impl fmt::Display for StyleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedVariable { referrer, name } => {
                write!(f, "`{referrer}` references undefined variable `{name}`")
            }
            Self::CyclicVariable { cycle } => {
                f.write_str("cyclic variable references: ")?;
                for (i, name) in cycle.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" -> ")?;
                    }
                    f.write_str(name)?;
                }
                Ok(())
            }
            Self::MalformedShorthand { shorthand, text } => {
                write!(f, "`{shorthand}` resolved to malformed text `{text}`")
            }
            Self::InvalidValue { property, text } => {
                write!(f, "`{property}` resolved to invalid text `{text}`")
            }
        }
    }
}

impl core::error::Error for StyleDiagnostic {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn display_messages() {
        let cycle = StyleDiagnostic::CyclicVariable {
            cycle: vec!["--a".into(), "--b".into()],
        };
        assert_eq!(cycle.to_string(), "cyclic variable references: --a -> --b");

        let err = StyleError::UnitMismatch {
            property: "width",
            unit: Unit::COLOR,
        };
        assert!(err.to_string().starts_with("`width` does not accept"));
        assert_eq!(
            StyleError::UnknownProperty("size".into()).to_string(),
            "unknown property `size`"
        );
    }
}
