//! Shorthand and parameter-only section records.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use serde::Serialize;

use super::canonical::{DateTimeSpec, RepeatEnd};
use super::Capability;
use crate::sizing::{Size, Step};

/// A day of the week as written in time specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayName {
    Mon,
    Tues,
    Wed,
    Thur,
    Fri,
    Sat,
    Sun,
}

impl DayName {
    pub const NAMES: [&'static str; 7] = ["mon", "tues", "wed", "thur", "fri", "sat", "sun"];

    pub fn as_str(self) -> &'static str {
        Self::NAMES[self.index()]
    }

    pub fn parse(name: &str) -> Option<Self> {
        let index = Self::NAMES.iter().position(|n| *n == name)?;
        Some(Self::from_index(index))
    }

    fn index(self) -> usize {
        self.weekday().num_days_from_monday() as usize
    }

    fn from_index(index: usize) -> Self {
        match index {
            0 => DayName::Mon,
            1 => DayName::Tues,
            2 => DayName::Wed,
            3 => DayName::Thur,
            4 => DayName::Fri,
            5 => DayName::Sat,
            _ => DayName::Sun,
        }
    }

    pub fn weekday(self) -> Weekday {
        match self {
            DayName::Mon => Weekday::Mon,
            DayName::Tues => Weekday::Tue,
            DayName::Wed => Weekday::Wed,
            DayName::Thur => Weekday::Thu,
            DayName::Fri => Weekday::Fri,
            DayName::Sat => Weekday::Sat,
            DayName::Sun => Weekday::Sun,
        }
    }
}

impl From<Weekday> for DayName {
    fn from(weekday: Weekday) -> Self {
        Self::from_index(weekday.num_days_from_monday() as usize)
    }
}

/// `num` units of `size`, e.g. 2 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AmountSpec {
    pub num: u64,
    pub size: Size,
}

impl AmountSpec {
    pub fn new(num: u64, size: Size) -> Self {
        Self { num, size }
    }

    pub fn step(&self) -> Step {
        Step::of(self.size, self.num)
    }
}

impl fmt::Display for AmountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "amount(num: {}, size: {})", self.num, self.size)
    }
}

/// An amount drawn at random between two bounds when simplified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeSpec {
    pub min: AmountSpec,
    pub max: AmountSpec,
}

/// An ISO-8601 duration such as `P1DT12H`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DurationSpec {
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl DurationSpec {
    pub fn step(&self) -> Step {
        let days = self.weeks as i64 * 7 + self.days as i64;
        Step {
            months: self.years.saturating_mul(12).saturating_add(self.months),
            seconds: days * 86_400
                + self.hours as i64 * 3_600
                + self.minutes as i64 * 60
                + self.seconds as i64,
        }
    }
}

impl fmt::Display for DurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("P")?;
        for (value, unit) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if value > 0 {
                write!(f, "{value}{unit}")?;
            }
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds > 0 {
            f.write_str("T")?;
            for (value, unit) in [(self.hours, 'H'), (self.minutes, 'M'), (self.seconds, 'S')] {
                if value > 0 {
                    write!(f, "{value}{unit}")?;
                }
            }
        }
        Ok(())
    }
}

/// What an interval steps by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Every {
    Amount(AmountSpec),
    Duration(DurationSpec),
}

impl Every {
    pub fn step(&self) -> Step {
        match self {
            Every::Amount(amount) => amount.step(),
            Every::Duration(duration) => duration.step(),
        }
    }
}

/// A single periodic step rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntervalSpec {
    pub every: Every,
}

impl IntervalSpec {
    pub fn new(every: Every) -> Self {
        Self { every }
    }

    pub fn amount(num: u64, size: Size) -> Self {
        Self::new(Every::Amount(AmountSpec::new(num, size)))
    }
}

impl fmt::Display for IntervalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.every {
            Every::Amount(amount) => write!(f, "interval(every: {amount})"),
            Every::Duration(duration) => write!(
                f,
                "interval(every: iso8601(type: duration, specification: {duration}))"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochSpec {
    /// Seconds since the unix epoch.
    pub epoch: f64,
}

impl EpochSpec {
    /// The moment this epoch names, `None` if it is out of range.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        if !self.epoch.is_finite() {
            return None;
        }
        let secs = self.epoch.floor();
        let nanos = ((self.epoch - secs) * 1e9).round() as u32;
        DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayNameSpec {
    pub names: BTreeSet<DayName>,
}

impl fmt::Display for DayNameSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names.iter().map(|n| n.as_str()).collect();
        write!(f, "day_name(name: {})", names.join(";"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayNumberSpec {
    /// Day of the year, starting at 1.
    pub number: u32,
}

/// A time of day with no date attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSpec {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl TimeSpec {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self {
            hour,
            minute,
            second: 0,
        }
    }

    pub fn naive(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, self.second)
    }
}

impl From<NaiveTime> for TimeSpec {
    fn from(time: NaiveTime) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "time(hour: {}, minute: {}", self.hour, self.minute)?;
        if self.second > 0 {
            write!(f, ", second: {}", self.second)?;
        }
        f.write_str(")")
    }
}

/// A calendar date with no time attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateSpec {
    pub date: NaiveDate,
}

impl fmt::Display for DateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "date({})", self.date)
    }
}

/// A window of time: from `start`, optionally until `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BetweenSpec {
    pub start: DateTimeSpec,
    pub end: Option<RepeatEnd>,
}

impl fmt::Display for BetweenSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "between(start: {}", self.start)?;
        if let Some(end) = &self.end {
            write!(f, ", end: {end}")?;
        }
        f.write_str(")")
    }
}

/// Which kind of ISO-8601 literal an `iso8601(...)` section holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Iso8601Kind {
    DateTime,
    Date,
    Time,
    Duration,
    RepeatingInterval,
}

impl Iso8601Kind {
    pub const NAMES: [&'static str; 5] =
        ["datetime", "date", "time", "duration", "repeating_interval"];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "datetime" => Some(Iso8601Kind::DateTime),
            "date" => Some(Iso8601Kind::Date),
            "time" => Some(Iso8601Kind::Time),
            "duration" => Some(Iso8601Kind::Duration),
            "repeating_interval" => Some(Iso8601Kind::RepeatingInterval),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Iso8601Kind::DateTime => "datetime",
            Iso8601Kind::Date => "date",
            Iso8601Kind::Time => "time",
            Iso8601Kind::Duration => "duration",
            Iso8601Kind::RepeatingInterval => "repeating_interval",
        }
    }
}

impl fmt::Display for Iso8601Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `R[n]/<start>/<duration>`: `count` repetitions (unbounded when absent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RepeatingInterval {
    pub count: Option<u32>,
    pub start: DateTime<Utc>,
    pub duration: DurationSpec,
}

/// The parsed payload of an ISO-8601 literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Iso8601Value {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Duration(DurationSpec),
    RepeatingInterval(RepeatingInterval),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Iso8601Spec {
    pub kind: Iso8601Kind,
    pub specification: String,
    pub value: Iso8601Value,
}

impl Iso8601Spec {
    pub fn specifies(&self) -> BTreeSet<Capability> {
        let caps: &[Capability] = match self.kind {
            Iso8601Kind::RepeatingInterval => &[Capability::Interval],
            Iso8601Kind::DateTime => &[Capability::Day, Capability::Time],
            Iso8601Kind::Date => &[Capability::Day],
            Iso8601Kind::Time => &[Capability::Time],
            Iso8601Kind::Duration => &[Capability::Duration],
        };
        caps.iter().copied().collect()
    }
}
