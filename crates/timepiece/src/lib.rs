//! # timepiece
//!
//! A small algebraic language for recurring calendar events.
//!
//! A time spec is text such as
//! `between(start: sunset()) & interval(every: amount(num: 1, size: minute))`.
//! It is parsed into a tree of section calls, reduced into one canonical
//! [`Section`] and then asked for its next occurrence after some instant.
//! All arithmetic is naive UTC.
//!
//! ## Modules
//!
//! - [`grammar`]: text to [`ParseNode`]
//! - [`registry`]: section names and their field schemas
//! - [`normalize`]: raw arguments to typed section records
//! - [`sections`]: the section records and their capabilities
//! - [`algebra`]: `simplify`, `&` and `|` on sections, reduction of a tree
//! - [`recurrence`]: next occurrence search
//! - [`filter`]: calendar filter matching
//! - [`sizing`]: calendar units and amount conversion
//! - [`iso8601`]: ISO-8601 literals
//! - [`engine`]: [`Timepiece`], the configured front door
//! - [`error`]: error types

pub mod algebra;
pub mod engine;
pub mod error;
pub mod filter;
pub mod grammar;
pub mod iso8601;
pub mod normalize;
pub mod recurrence;
pub mod registry;
pub mod sections;
pub mod sizing;

use chrono::{DateTime, Utc};

pub use algebra::{reduce, reduce_with};
pub use engine::{Clock, Timepiece};
pub use error::{FieldError, Result, TimepieceError};
pub use grammar::{parse, ArgValue, Joiner, ParseNode};
pub use recurrence::next_admitted;
pub use registry::{default_registry, Registry};
pub use sections::{Capability, Section, SectionKind};
pub use sizing::{common_size, convert_amount, Size};

/// Parse and reduce `text` with the shared registry and the system clock.
///
/// # Errors
/// See [`Timepiece::time_spec_to_object`].
pub fn time_spec_to_object(text: &str, validate: bool) -> Result<Section> {
    Timepiece::new().time_spec_to_object(text, validate)
}

/// The next occurrence of `spec` after `at`, or after now when `at` is `None`.
pub fn following(spec: &Section, at: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    spec.following(at.unwrap_or_else(Utc::now))
}

/// Whether the filters in `spec` admit `instant`.
pub fn is_filtered(spec: &Section, instant: DateTime<Utc>) -> bool {
    spec.is_filtered(instant)
}
