//! The configured front door: registry, clock and random seed in one value.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::algebra;
use crate::error::Result;
use crate::grammar;
use crate::normalize::Context;
use crate::recurrence;
use crate::registry::{default_registry, Registry};
use crate::sections::Section;

/// Where "now" comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// The current UTC time, read on every call.
    #[default]
    System,
    /// A pinned instant, for repeatable results.
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(instant) => *instant,
        }
    }
}

/// Parses, reduces and queries time specs.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use timepiece::{Clock, Timepiece};
///
/// let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
/// let timepiece = Timepiece::new().with_clock(Clock::Fixed(now));
/// let spec = timepiece
///     .time_spec_to_object("between(start: now()) & interval(every: amount(num: 1, size: minute))", true)
///     .unwrap();
/// assert_eq!(
///     timepiece.following(&spec, None),
///     Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 1, 0).unwrap())
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Timepiece {
    registry: Arc<Registry>,
    clock: Clock,
    seed: Option<u64>,
}

impl Default for Timepiece {
    fn default() -> Self {
        Self::new()
    }
}

impl Timepiece {
    /// Shared registry, system clock and an entropy-seeded `range(...)`.
    pub fn new() -> Self {
        Self {
            registry: default_registry(),
            clock: Clock::System,
            seed: None,
        }
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Makes `range(...)` draw the same amounts on every parse.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Parse `text` and reduce it to a single spec.
    ///
    /// # Errors
    /// Any [`crate::TimepieceError`] from parsing or reduction. With `validate`
    /// set, a spec that can't say when it happens is an error as well:
    /// `ParameterOnly` when it reduces to a bare parameter such as `amount(...)`
    /// or a duration, and `IncompleteSpec` for everything else. A
    /// parameter-only result never yields `IncompleteSpec`.
    pub fn time_spec_to_object(&self, text: &str, validate: bool) -> Result<Section> {
        let tree = grammar::parse(text)?;
        let ctx = Context::new(&self.registry, self.clock, self.seed);
        let spec = algebra::reduce_with(&tree, &ctx, validate)?;
        debug!(kind = %spec.kind(), "reduced time spec");
        Ok(spec)
    }

    /// The next occurrence after `at`, or after the clock's now.
    pub fn following(&self, spec: &Section, at: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        let at = at.unwrap_or_else(|| self.clock.now());
        debug!(kind = %spec.kind(), %at, "following");
        spec.following(at)
    }

    /// Like [`Timepiece::following`] but skipping occurrences the filters reject.
    pub fn next_admitted(&self, spec: &Section, at: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        let at = at.unwrap_or_else(|| self.clock.now());
        recurrence::next_admitted(spec, at)
    }

    pub fn is_filtered(&self, spec: &Section, instant: DateTime<Utc>) -> bool {
        spec.is_filtered(instant)
    }
}
