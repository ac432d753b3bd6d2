//! Error types for parsing, reducing and validating time specs.

use std::fmt;

use thiserror::Error;

use crate::grammar::Joiner;
use crate::sections::{Capability, SectionKind};

/// A single invalid argument found while normalising a section.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Errors that can occur while turning text into a spec.
///
/// Running out of occurrences is never an error: `following` returns `None`
/// for that. Everything here is raised before any occurrence is computed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimepieceError {
    /// The text does not follow the grammar. `position` is a byte offset.
    #[error("Syntax error at position {position}: expected {expected}, found {found}")]
    Syntax {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Unknown section type '{name}' (available: {})", available.join(", "))]
    UnknownSection { name: String, available: Vec<String> },

    /// Every invalid argument of one section, not just the first.
    #[error("Bad arguments for {section}: {}", join_errors(errors))]
    Validation {
        section: String,
        errors: Vec<FieldError>,
    },

    #[error("Sorry, can't do {left} {joiner} {right}")]
    UnsupportedCombination {
        joiner: Joiner,
        left: SectionKind,
        right: SectionKind,
    },

    #[error("Time spec is invalid, it doesn't say when anything happens (got: {})", join_capabilities(got))]
    IncompleteSpec { got: Vec<Capability> },

    #[error("Sorry, {kind} can only be used as a parameter")]
    ParameterOnly { kind: SectionKind },

    #[error("Size must be one of the valid units (first: {first}, second: {second})")]
    InvalidUnit { first: String, second: String },

    #[error("Invalid ISO 8601 {kind} '{literal}': {reason}")]
    InvalidIso8601 {
        kind: String,
        literal: String,
        reason: String,
    },

    #[error("Invalid range: {reason}")]
    InvalidRange { reason: String },
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_capabilities(got: &[Capability]) -> String {
    if got.is_empty() {
        return "nothing".to_string();
    }
    got.iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias used throughout timepiece.
pub type Result<T> = std::result::Result<T, TimepieceError>;
