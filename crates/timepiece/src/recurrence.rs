//! Occurrence search: the next instant a spec fires after a reference instant.
//!
//! Each interval of a repeat gets its own [`IntervalIter`], built fresh for
//! every query. [`merge_following`] advances all of them together in rounds
//! and gives up after [`MAX_ROUNDS`], treating that as "no occurrence".

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, trace};

use crate::sections::{
    DateTimeSpec, Every, IntervalsSpec, ManyRepeatAndFiltersSpec, RepeatAndFiltersSpec,
    RepeatSpec, Section,
};
use crate::sizing::Step;

/// Upper bound on merge rounds and on filter-aware search steps.
pub const MAX_ROUNDS: usize = 100;

/// Candidate occurrences of one interval: `start + k * step` for `k >= 1`,
/// beginning at the first one after `at` and stopping before `end`.
#[derive(Debug, Clone)]
pub struct IntervalIter {
    step: Step,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    k: i64,
    done: bool,
}

impl IntervalIter {
    pub fn new(
        every: &Every,
        start: DateTime<Utc>,
        at: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        Self::from_step(every.step(), start, at, end)
    }

    pub fn from_step(
        step: Step,
        start: DateTime<Utc>,
        at: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        let mut iter = IntervalIter {
            step,
            start,
            end,
            k: 1,
            done: step.is_zero(),
        };
        if !iter.done {
            iter.jump_past(at);
        }
        iter
    }

    /// Move `k` straight to the first step after `at`.
    fn jump_past(&mut self, at: DateTime<Utc>) {
        let mut k = self.step.estimate_steps(self.start, at).max(1);
        while k > 1 && self.step.nth(self.start, k - 1).is_some_and(|c| c > at) {
            k -= 1;
        }
        loop {
            match self.step.nth(self.start, k) {
                Some(candidate) if candidate <= at => k += 1,
                Some(_) => break,
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        self.k = k;
    }
}

impl Iterator for IntervalIter {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let candidate = self
            .step
            .nth(self.start, self.k)
            .filter(|c| self.end.is_none_or(|end| *c < end));
        match candidate {
            Some(candidate) => {
                self.k += 1;
                Some(candidate)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// Merge candidate generators round by round.
///
/// Each round takes the next candidate of every active generator. A
/// generator that is exhausted, or whose candidate is past `end`, is dropped
/// for good. The first round whose smallest candidate is after `at` answers
/// the query.
pub fn merge_following<I>(
    generators: Vec<I>,
    at: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>>
where
    I: Iterator<Item = DateTime<Utc>>,
{
    let mut active = generators;
    for round in 0..MAX_ROUNDS {
        let mut minimum: Option<DateTime<Utc>> = None;
        let mut survivors = Vec::with_capacity(active.len());
        for mut generator in active {
            let Some(candidate) = generator.next() else {
                continue;
            };
            if end.is_some_and(|end| candidate > end) {
                continue;
            }
            minimum = Some(minimum.map_or(candidate, |m| m.min(candidate)));
            survivors.push(generator);
        }
        active = survivors;
        trace!(round, active = active.len(), ?minimum, "interval round");

        if active.is_empty() {
            return None;
        }
        if let Some(found) = minimum.filter(|m| *m > at) {
            return Some(found);
        }
    }
    debug!(rounds = MAX_ROUNDS, %at, "no occurrence within the round cap");
    None
}

impl IntervalsSpec {
    /// The next step of any of these intervals after `at`, counting from `start`.
    pub fn following(
        &self,
        at: DateTime<Utc>,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Option<DateTime<Utc>> {
        let generators = self
            .intervals
            .iter()
            .map(|interval| IntervalIter::new(&interval.every, start, at, end))
            .collect();
        merge_following(generators, at, end)
    }
}

impl DateTimeSpec {
    /// `at` is compared to the whole second.
    pub fn following(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        (at.trunc_subsecs(0) <= self.datetime).then_some(self.datetime)
    }
}

impl RepeatSpec {
    pub fn following(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let end = self.end_instant();
        if end.is_some_and(|end| at > end) {
            return None;
        }
        if at < self.start.datetime {
            return self.start.following(at);
        }
        match &self.every {
            Some(every) => every.following(at, self.start.datetime, end),
            // A single occurrence, still due when `at` is its own second.
            None => self.start.following(at),
        }
    }
}

impl RepeatAndFiltersSpec {
    /// Filters play no part here; see [`next_admitted`] for a search that
    /// honours them.
    pub fn following(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.repeat.following(at)
    }
}

impl ManyRepeatAndFiltersSpec {
    pub fn following(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.specs.iter().filter_map(|spec| spec.following(at)).min()
    }
}

impl Section {
    /// The next occurrence after `at`. Sections that don't say when anything
    /// happens have none.
    pub fn following(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Section::DateTime(spec) => spec.following(at),
            Section::Repeat(spec) => spec.following(at),
            Section::RepeatAndFilters(spec) => spec.following(at),
            Section::ManyRepeatAndFilters(spec) => spec.following(at),
            Section::Epoch(epoch) => epoch
                .datetime()
                .and_then(|datetime| DateTimeSpec::new(datetime).following(at)),
            _ => None,
        }
    }
}

/// The next occurrence after `at` that the spec's filters also admit.
///
/// Each member of an OR-group is searched on its own, so an occurrence of one
/// member is only checked against that member's filters.
pub fn next_admitted(spec: &Section, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match spec {
        Section::ManyRepeatAndFilters(many) => many
            .specs
            .iter()
            .filter_map(|member| {
                walk_admitted(at, |t| member.following(t), |t| member.is_filtered(t))
            })
            .min(),
        other => walk_admitted(at, |t| other.following(t), |t| other.is_filtered(t)),
    }
}

fn walk_admitted(
    at: DateTime<Utc>,
    following: impl Fn(DateTime<Utc>) -> Option<DateTime<Utc>>,
    admits: impl Fn(DateTime<Utc>) -> bool,
) -> Option<DateTime<Utc>> {
    let mut cursor = at;
    for _ in 0..MAX_ROUNDS {
        let candidate = following(cursor)?;
        if admits(candidate) {
            return Some(candidate);
        }
        cursor = if candidate > cursor {
            candidate
        } else {
            candidate + chrono::Duration::seconds(1)
        };
    }
    debug!(steps = MAX_ROUNDS, %at, "no admitted occurrence within the step cap");
    None
}
