//! Validation failures raised while constructing domain values.

use thiserror::Error;

/// A rejected domain value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required string was blank.
    #[error("{what} must not be blank")]
    Blank { what: &'static str },

    /// Input did not parse as the expected value.
    #[error("{what} rejected input '{input}': expected {expected}")]
    Unparseable {
        what: &'static str,
        input: String,
        expected: &'static str,
    },
}

impl ValidationError {
    /// A blank-string rejection.
    pub fn blank(what: &'static str) -> Self {
        ValidationError::Blank { what }
    }

    /// A parse rejection, keeping the offending input for the message.
    pub fn unparseable(
        what: &'static str,
        input: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        ValidationError::Unparseable {
            what,
            input: input.into(),
            expected,
        }
    }
}
