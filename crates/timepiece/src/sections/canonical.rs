//! The canonical section records every spec simplifies into.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::shorthand::{DayName, IntervalSpec};
use super::Capability;

/// A single moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateTimeSpec {
    pub datetime: DateTime<Utc>,
}

impl DateTimeSpec {
    pub fn new(datetime: DateTime<Utc>) -> Self {
        Self { datetime }
    }
}

impl fmt::Display for DateTimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "datetime({})", self.datetime.to_rfc3339())
    }
}

/// Where a repeat stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RepeatEnd {
    At(DateTimeSpec),
    Forever,
}

impl RepeatEnd {
    /// The bounding instant, `None` for an unbounded repeat.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            RepeatEnd::At(end) => Some(end.datetime),
            RepeatEnd::Forever => None,
        }
    }
}

impl fmt::Display for RepeatEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatEnd::At(end) => write!(f, "{end}"),
            RepeatEnd::Forever => f.write_str("forever()"),
        }
    }
}

/// When an event starts, optionally when it stops, and how often it recurs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatSpec {
    pub start: DateTimeSpec,
    pub end: Option<RepeatEnd>,
    pub every: Option<IntervalsSpec>,
}

impl RepeatSpec {
    /// A repeat that happens exactly once, at `start`.
    pub fn once(start: DateTimeSpec) -> Self {
        Self {
            start,
            end: None,
            every: None,
        }
    }

    /// The same start and end, recurring on `every`.
    pub fn with_every(&self, every: IntervalsSpec) -> Self {
        Self {
            start: self.start,
            end: self.end,
            every: Some(every),
        }
    }

    pub fn end_instant(&self) -> Option<DateTime<Utc>> {
        self.end.and_then(|end| end.instant())
    }

    pub fn specifies(&self) -> BTreeSet<Capability> {
        let mut caps = BTreeSet::new();
        if self.every.is_some() {
            caps.insert(Capability::Repeat);
        }
        if self.end.is_some() {
            caps.insert(Capability::Duration);
        }
        if caps.is_empty() {
            caps.insert(Capability::Once);
        }
        caps
    }
}

impl fmt::Display for RepeatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repeat(start: {}", self.start)?;
        if let Some(end) = &self.end {
            write!(f, ", end: {end}")?;
        }
        if let Some(every) = &self.every {
            write!(f, ", every: {every}")?;
        }
        f.write_str(")")
    }
}

/// Calendar component matcher. Empty fields match everything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterSpec {
    pub minutes: BTreeSet<u32>,
    pub hours: BTreeSet<u32>,
    /// Day of the month.
    pub days: BTreeSet<u32>,
    /// ISO week of the year.
    pub weeks: BTreeSet<u32>,
    pub months: BTreeSet<u32>,
    pub day_names: BTreeSet<DayName>,
    /// Day of the year.
    pub day_numbers: BTreeSet<u32>,
}

impl FilterSpec {
    /// Field-by-field union of two filters.
    pub fn union(mut self, other: FilterSpec) -> FilterSpec {
        self.minutes.extend(other.minutes);
        self.hours.extend(other.hours);
        self.days.extend(other.days);
        self.weeks.extend(other.weeks);
        self.months.extend(other.months);
        self.day_names.extend(other.day_names);
        self.day_numbers.extend(other.day_numbers);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
            && self.hours.is_empty()
            && self.days.is_empty()
            && self.weeks.is_empty()
            && self.months.is_empty()
            && self.day_names.is_empty()
            && self.day_numbers.is_empty()
    }
}

fn write_numbers(f: &mut fmt::Formatter<'_>, sep: &mut bool, name: &str, values: &BTreeSet<u32>) -> fmt::Result {
    if values.is_empty() {
        return Ok(());
    }
    if *sep {
        f.write_str(", ")?;
    }
    *sep = true;
    let joined: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    write!(f, "{name}: {}", joined.join(";"))
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = false;
        f.write_str("[filter(")?;
        write_numbers(f, &mut sep, "minutes", &self.minutes)?;
        write_numbers(f, &mut sep, "hours", &self.hours)?;
        write_numbers(f, &mut sep, "days", &self.days)?;
        write_numbers(f, &mut sep, "weeks", &self.weeks)?;
        write_numbers(f, &mut sep, "months", &self.months)?;
        if !self.day_names.is_empty() {
            if sep {
                f.write_str(", ")?;
            }
            sep = true;
            let joined: Vec<&str> = self.day_names.iter().map(|d| d.as_str()).collect();
            write!(f, "day_names: {}", joined.join(";"))?;
        }
        write_numbers(f, &mut sep, "day_numbers", &self.day_numbers)?;
        f.write_str(")]")
    }
}

/// A repeat constrained by filters, all of which must match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatAndFiltersSpec {
    pub repeat: RepeatSpec,
    pub filters: Vec<FilterSpec>,
}

impl RepeatAndFiltersSpec {
    pub fn new(repeat: RepeatSpec, filters: Vec<FilterSpec>) -> Self {
        Self { repeat, filters }
    }

    pub fn unfiltered(repeat: RepeatSpec) -> Self {
        Self::new(repeat, Vec::new())
    }

    /// A copy with one more filter appended.
    pub fn and_filter(&self, filter: FilterSpec) -> Self {
        let mut filters = self.filters.clone();
        filters.push(filter);
        Self::new(self.repeat.clone(), filters)
    }
}

impl fmt::Display for RepeatAndFiltersSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repeat)?;
        for filter in &self.filters {
            write!(f, "{filter}")?;
        }
        Ok(())
    }
}

/// An OR-group: an occurrence of any member is an occurrence of the group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManyRepeatAndFiltersSpec {
    pub specs: Vec<RepeatAndFiltersSpec>,
}

impl ManyRepeatAndFiltersSpec {
    pub fn new(specs: Vec<RepeatAndFiltersSpec>) -> Self {
        Self { specs }
    }
}

impl fmt::Display for ManyRepeatAndFiltersSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, spec) in self.specs.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{spec}")?;
        }
        Ok(())
    }
}

/// A set of periodic step rules, merged when searching for occurrences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalsSpec {
    pub intervals: Vec<IntervalSpec>,
}

impl IntervalsSpec {
    pub fn new(intervals: Vec<IntervalSpec>) -> Self {
        Self { intervals }
    }

    pub fn contain(interval: IntervalSpec) -> Self {
        Self::new(vec![interval])
    }
}

impl fmt::Display for IntervalsSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grouped = self.intervals.len() > 1;
        if grouped {
            f.write_str("(")?;
        }
        for (i, interval) in self.intervals.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{interval}")?;
        }
        if grouped {
            f.write_str(")")?;
        }
        Ok(())
    }
}
