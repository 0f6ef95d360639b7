//! Structured validation errors.
//!
//! Input validation never stops at the first problem: every violated
//! constraint is collected with the path of the offending field, so a client
//! can fix a request in one round trip.

use serde::Serialize;
use thiserror::Error;

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Dotted path of the field, e.g. `order.1.quantity`.
    pub loc: String,
    pub msg: String,
}

impl FieldViolation {
    pub fn new(loc: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            msg: msg.into(),
        }
    }
}

impl core::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.loc, self.msg)
    }
}

/// Every constraint a piece of input failed.
///
/// Built with [`ValidationErrors::push`] while walking the input, then turned
/// into a `Result` with [`ValidationErrors::into_result`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("validation failed: {}", render(.violations))]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

fn render(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for an error holding a single violation.
    pub fn single(loc: impl Into<String>, msg: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(loc, msg);
        errors
    }

    pub fn push(&mut self, loc: impl Into<String>, msg: impl Into<String>) {
        self.violations.push(FieldViolation::new(loc, msg));
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// `Ok(value)` when nothing was recorded, `Err(self)` otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// An identifier could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid identifier: {0}")]
pub struct InvalidId(pub String);
