//! The section variants a time spec is made of.
//!
//! Every registered section name normalises into one [`Section`]. Shorthand
//! variants (`now`, `sunset`, `day_name`, ...) simplify into the canonical
//! ones (`DateTime`, `Repeat`, `Filter`, `RepeatAndFilters`,
//! `ManyRepeatAndFilters`, `Intervals`) before anything asks them for an
//! occurrence. The combination rules live in [`crate::algebra`], occurrence
//! search in [`crate::recurrence`] and filter matching in [`crate::filter`].

mod canonical;
pub(crate) mod schemas;
mod shorthand;

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

pub use canonical::{
    DateTimeSpec, FilterSpec, IntervalsSpec, ManyRepeatAndFiltersSpec, RepeatAndFiltersSpec,
    RepeatEnd, RepeatSpec,
};
pub use shorthand::{
    AmountSpec, BetweenSpec, DateSpec, DayName, DayNameSpec, DayNumberSpec, DurationSpec,
    EpochSpec, Every, IntervalSpec, Iso8601Kind, Iso8601Spec, Iso8601Value, RangeSpec,
    RepeatingInterval, TimeSpec,
};

/// What a section tells us about an event.
///
/// Only used to report expressions that cannot answer "when is the next one".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Once,
    Repeat,
    Duration,
    Filter,
    Interval,
    Day,
    Time,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Once => "once",
            Capability::Repeat => "repeat",
            Capability::Duration => "duration",
            Capability::Filter => "filter",
            Capability::Interval => "interval",
            Capability::Day => "day",
            Capability::Time => "time",
        };
        f.write_str(name)
    }
}

/// A normalised time spec value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Section {
    DateTime(DateTimeSpec),
    Repeat(RepeatSpec),
    Filter(FilterSpec),
    RepeatAndFilters(RepeatAndFiltersSpec),
    ManyRepeatAndFilters(ManyRepeatAndFiltersSpec),
    Intervals(IntervalsSpec),
    Interval(IntervalSpec),
    Amount(AmountSpec),
    Range(RangeSpec),
    Duration(DurationSpec),
    Now,
    Epoch(EpochSpec),
    SunRise,
    SunSet,
    Forever,
    DayName(DayNameSpec),
    DayNumber(DayNumberSpec),
    Time(TimeSpec),
    Date(DateSpec),
    Between(BetweenSpec),
    Iso8601(Iso8601Spec),
}

/// The variant of a [`Section`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SectionKind {
    DateTime,
    Repeat,
    Filter,
    RepeatAndFilters,
    ManyRepeatAndFilters,
    Intervals,
    Interval,
    Amount,
    Range,
    Duration,
    Now,
    Epoch,
    SunRise,
    SunSet,
    Forever,
    DayName,
    DayNumber,
    Time,
    Date,
    Between,
    Iso8601,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::DateTime(_) => SectionKind::DateTime,
            Section::Repeat(_) => SectionKind::Repeat,
            Section::Filter(_) => SectionKind::Filter,
            Section::RepeatAndFilters(_) => SectionKind::RepeatAndFilters,
            Section::ManyRepeatAndFilters(_) => SectionKind::ManyRepeatAndFilters,
            Section::Intervals(_) => SectionKind::Intervals,
            Section::Interval(_) => SectionKind::Interval,
            Section::Amount(_) => SectionKind::Amount,
            Section::Range(_) => SectionKind::Range,
            Section::Duration(_) => SectionKind::Duration,
            Section::Now => SectionKind::Now,
            Section::Epoch(_) => SectionKind::Epoch,
            Section::SunRise => SectionKind::SunRise,
            Section::SunSet => SectionKind::SunSet,
            Section::Forever => SectionKind::Forever,
            Section::DayName(_) => SectionKind::DayName,
            Section::DayNumber(_) => SectionKind::DayNumber,
            Section::Time(_) => SectionKind::Time,
            Section::Date(_) => SectionKind::Date,
            Section::Between(_) => SectionKind::Between,
            Section::Iso8601(_) => SectionKind::Iso8601,
        }
    }

    /// The capabilities this section provides.
    pub fn specifies(&self) -> BTreeSet<Capability> {
        use Capability::*;
        let caps: &[Capability] = match self {
            Section::DateTime(_) => &[Once],
            Section::Repeat(repeat) => return repeat.specifies(),
            Section::Filter(_) => &[Filter],
            Section::RepeatAndFilters(_) | Section::ManyRepeatAndFilters(_) => &[Repeat, Filter],
            Section::Intervals(_) | Section::Interval(_) | Section::Range(_) => &[Interval],
            Section::Amount(_) => &[],
            Section::Duration(_) | Section::Forever | Section::Between(_) => &[Duration],
            Section::Now | Section::Epoch(_) | Section::SunRise => &[Day, Time],
            Section::SunSet | Section::Time(_) => &[Time],
            Section::DayName(_) | Section::DayNumber(_) | Section::Date(_) => &[Day],
            Section::Iso8601(iso) => return iso.specifies(),
        };
        caps.iter().copied().collect()
    }

    /// Sections that only make sense as the value of another section's argument.
    pub fn is_parameter_only(&self) -> bool {
        matches!(
            self,
            Section::Amount(_) | Section::Range(_) | Section::Duration(_)
        )
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::DateTime(spec) => write!(f, "{spec}"),
            Section::Repeat(spec) => write!(f, "{spec}"),
            Section::Filter(spec) => write!(f, "{spec}"),
            Section::RepeatAndFilters(spec) => write!(f, "{spec}"),
            Section::ManyRepeatAndFilters(spec) => write!(f, "{spec}"),
            Section::Intervals(spec) => write!(f, "{spec}"),
            Section::Interval(spec) => write!(f, "{spec}"),
            Section::Amount(spec) => write!(f, "{spec}"),
            Section::Range(spec) => write!(f, "range(min: {}, max: {})", spec.min, spec.max),
            Section::Duration(spec) => write!(f, "{spec}"),
            Section::Now => f.write_str("now()"),
            Section::Epoch(spec) => write!(f, "epoch(epoch: {})", spec.epoch),
            Section::SunRise => f.write_str("sunrise()"),
            Section::SunSet => f.write_str("sunset()"),
            Section::Forever => f.write_str("forever()"),
            Section::DayName(spec) => write!(f, "{spec}"),
            Section::DayNumber(spec) => write!(f, "day_number(number: {})", spec.number),
            Section::Time(spec) => write!(f, "{spec}"),
            Section::Date(spec) => write!(f, "{spec}"),
            Section::Between(spec) => write!(f, "{spec}"),
            Section::Iso8601(spec) => write!(
                f,
                "iso8601(type: {}, specification: {})",
                spec.kind, spec.specification
            ),
        }
    }
}

macro_rules! section_from {
    ($($variant:ident($record:ty)),* $(,)?) => {
        $(
            impl From<$record> for Section {
                fn from(record: $record) -> Self {
                    Section::$variant(record)
                }
            }
        )*
    };
}

section_from! {
    DateTime(DateTimeSpec),
    Repeat(RepeatSpec),
    Filter(FilterSpec),
    RepeatAndFilters(RepeatAndFiltersSpec),
    ManyRepeatAndFilters(ManyRepeatAndFiltersSpec),
    Intervals(IntervalsSpec),
    Interval(IntervalSpec),
    Amount(AmountSpec),
    Range(RangeSpec),
    Duration(DurationSpec),
    Epoch(EpochSpec),
    DayName(DayNameSpec),
    DayNumber(DayNumberSpec),
    Time(TimeSpec),
    Date(DateSpec),
    Between(BetweenSpec),
    Iso8601(Iso8601Spec),
}
