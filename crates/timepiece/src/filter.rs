//! Filter matching against the calendar components of an instant.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::sections::{
    DayName, FilterSpec, ManyRepeatAndFiltersSpec, RepeatAndFiltersSpec, Section,
};

/// An empty set matches anything.
fn admits<T: Ord>(set: &std::collections::BTreeSet<T>, value: T) -> bool {
    set.is_empty() || set.contains(&value)
}

impl FilterSpec {
    /// Whether every non-empty field matches the matching component of
    /// `instant`. Weeks are ISO weeks.
    pub fn is_filtered(&self, instant: DateTime<Utc>) -> bool {
        admits(&self.minutes, instant.minute())
            && admits(&self.hours, instant.hour())
            && admits(&self.days, instant.day())
            && admits(&self.weeks, instant.iso_week().week())
            && admits(&self.months, instant.month())
            && admits(&self.day_names, DayName::from(instant.weekday()))
            && admits(&self.day_numbers, instant.ordinal())
    }
}

impl RepeatAndFiltersSpec {
    pub fn is_filtered(&self, instant: DateTime<Utc>) -> bool {
        self.filters.iter().all(|filter| filter.is_filtered(instant))
    }
}

impl ManyRepeatAndFiltersSpec {
    pub fn is_filtered(&self, instant: DateTime<Utc>) -> bool {
        self.specs.iter().any(|spec| spec.is_filtered(instant))
    }
}

impl Section {
    /// Sections without filters admit every instant.
    pub fn is_filtered(&self, instant: DateTime<Utc>) -> bool {
        match self {
            Section::Filter(filter) => filter.is_filtered(instant),
            Section::RepeatAndFilters(spec) => spec.is_filtered(instant),
            Section::ManyRepeatAndFilters(spec) => spec.is_filtered(instant),
            Section::DayName(day_name) => admits(&day_name.names, DayName::from(instant.weekday())),
            Section::DayNumber(day_number) => instant.ordinal() == day_number.number,
            _ => true,
        }
    }
}
