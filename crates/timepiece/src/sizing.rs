//! Calendar units and conversions between amounts of them.
//!
//! Units are ordered from finest to coarsest. Seconds through weeks are a
//! fixed number of seconds long; months and years are calendar-aware and are
//! added with `chrono::Months`, so a month after Jan 31 is the end of February.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::Serialize;

use crate::error::{Result, TimepieceError};

/// One of the seven calendar units an amount can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Size {
    /// Every unit, finest first.
    pub const ALL: [Size; 7] = [
        Size::Second,
        Size::Minute,
        Size::Hour,
        Size::Day,
        Size::Week,
        Size::Month,
        Size::Year,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Size::Second => "second",
            Size::Minute => "minute",
            Size::Hour => "hour",
            Size::Day => "day",
            Size::Week => "week",
            Size::Month => "month",
            Size::Year => "year",
        }
    }

    /// The valid unit names, finest first.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.as_str()).collect()
    }

    /// Length in seconds for the fixed-length units, `None` for month and year.
    pub fn fixed_seconds(self) -> Option<i64> {
        match self {
            Size::Second => Some(1),
            Size::Minute => Some(60),
            Size::Hour => Some(3_600),
            Size::Day => Some(86_400),
            Size::Week => Some(604_800),
            Size::Month | Size::Year => None,
        }
    }

    /// Length in calendar months for month and year, `None` otherwise.
    pub fn calendar_months(self) -> Option<u32> {
        match self {
            Size::Month => Some(1),
            Size::Year => Some(12),
            _ => None,
        }
    }

    /// The finer of the two units, so both amounts are whole numbers in it.
    pub fn common(self, other: Size) -> Size {
        self.min(other)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Size {
    type Err = TimepieceError;

    fn from_str(s: &str) -> Result<Self> {
        Size::ALL
            .iter()
            .copied()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| TimepieceError::InvalidUnit {
                first: s.to_string(),
                second: s.to_string(),
            })
    }
}

/// Find the minimum common size of two unit names.
///
/// # Errors
/// Returns `TimepieceError::InvalidUnit` naming both inputs if either is not
/// one of the seven units.
pub fn common_size(first: &str, second: &str) -> Result<Size> {
    match (first.parse::<Size>(), second.parse::<Size>()) {
        (Ok(a), Ok(b)) => Ok(a.common(b)),
        _ => Err(TimepieceError::InvalidUnit {
            first: first.to_string(),
            second: second.to_string(),
        }),
    }
}

/// Express `old_num` of `old_size` as an amount of `new_size`, measured from now.
///
/// The result may be fractional (3 seconds is 0.05 minutes).
pub fn convert_amount(old_size: Size, new_size: Size, old_num: i64) -> f64 {
    convert_amount_from(Utc::now(), old_size, new_size, old_num)
}

/// Like [`convert_amount`] but measured from a fixed reference instant, which
/// matters when either unit is a month or a year.
pub fn convert_amount_from(
    reference: DateTime<Utc>,
    old_size: Size,
    new_size: Size,
    old_num: i64,
) -> f64 {
    if old_num < 0 {
        let magnitude = old_num.checked_neg().unwrap_or(i64::MAX);
        return -convert_amount_from(reference, old_size, new_size, magnitude);
    }
    if old_size == new_size {
        return old_num as f64;
    }

    let later = Step::of(old_size, old_num as u64)
        .nth(reference, 1)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    match new_size.fixed_seconds() {
        Some(unit) => seconds_between(reference, later) / unit as f64,
        None => {
            let unit_months = new_size.calendar_months().unwrap_or(1);
            calendar_units_between(reference, later, unit_months)
        }
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Whole units of `unit_months` between the instants plus the fraction of the
/// next unit that the remainder covers.
fn calendar_units_between(from: DateTime<Utc>, to: DateTime<Utc>, unit_months: u32) -> f64 {
    let base = |k: i64| -> Option<DateTime<Utc>> {
        let months = u32::try_from(k * unit_months as i64).ok()?;
        from.checked_add_months(Months::new(months))
    };

    let month_gap = (to.year() - from.year()) as i64 * 12 + to.month() as i64 - from.month() as i64;
    let mut k = (month_gap / unit_months as i64).max(0);
    while k > 0 && base(k).is_none_or(|b| b > to) {
        k -= 1;
    }
    while base(k + 1).is_some_and(|b| b <= to) {
        k += 1;
    }

    let (Some(lower), Some(upper)) = (base(k), base(k + 1)) else {
        return k as f64;
    };
    let span = seconds_between(lower, upper);
    if span <= 0.0 {
        return k as f64;
    }
    k as f64 + seconds_between(lower, to) / span
}

/// A stride through the calendar: some whole months plus some seconds.
///
/// Both amounts and ISO-8601 durations reduce to a `Step`, so the recurrence
/// engine only ever deals with this one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Step {
    pub months: u32,
    pub seconds: i64,
}

impl Step {
    /// `num` units of `size`.
    pub fn of(size: Size, num: u64) -> Self {
        match (size.fixed_seconds(), size.calendar_months()) {
            (Some(unit), _) => Step {
                months: 0,
                seconds: unit.saturating_mul(i64::try_from(num).unwrap_or(i64::MAX)),
            },
            (None, Some(unit_months)) => Step {
                months: unit_months.saturating_mul(u32::try_from(num).unwrap_or(u32::MAX)),
                seconds: 0,
            },
            (None, None) => Step::default(),
        }
    }

    /// A step that never moves would repeat its start forever.
    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.seconds <= 0
    }

    /// The instant `k` steps after `start`, or `None` on calendar overflow.
    pub fn nth(&self, start: DateTime<Utc>, k: i64) -> Option<DateTime<Utc>> {
        let k_months = u32::try_from(k.checked_mul(self.months as i64)?).ok()?;
        let shifted = start.checked_add_months(Months::new(k_months))?;
        let seconds = k.checked_mul(self.seconds)?;
        shifted.checked_add_signed(Duration::try_seconds(seconds)?)
    }

    /// A lower estimate of how many steps fit between `start` and `at`.
    ///
    /// Fixed strides are exact; calendar strides use the month difference and
    /// are corrected by the caller.
    pub fn estimate_steps(&self, start: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
        if at <= start {
            return 0;
        }
        if self.months == 0 {
            if self.seconds <= 0 {
                return 0;
            }
            return (at - start).num_seconds() / self.seconds;
        }
        let month_gap =
            (at.year() - start.year()) as i64 * 12 + at.month() as i64 - start.month() as i64;
        (month_gap / self.months as i64).max(0)
    }
}
