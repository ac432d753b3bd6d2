//! ISO-8601 literals: dates, times, datetimes, durations and repeating intervals.
//!
//! Datetimes without an offset are read as UTC. Durations take whole-number
//! components only (`P1Y2M3W4DT5H6M7S`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{Result, TimepieceError};
use crate::sections::{DurationSpec, Iso8601Kind, Iso8601Value, RepeatingInterval};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S",
    "%Y%m%dT%H%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M", "%H%M%S", "%H%M"];

/// Parse `literal` as the given kind of ISO-8601 value.
///
/// # Errors
/// Returns `TimepieceError::InvalidIso8601` describing why the literal was rejected.
pub fn parse(kind: Iso8601Kind, literal: &str) -> Result<Iso8601Value> {
    let parsed = match kind {
        Iso8601Kind::DateTime => parse_datetime(literal).map(Iso8601Value::DateTime),
        Iso8601Kind::Date => parse_date(literal).map(Iso8601Value::Date),
        Iso8601Kind::Time => parse_time(literal).map(Iso8601Value::Time),
        Iso8601Kind::Duration => parse_duration(literal).map(Iso8601Value::Duration),
        Iso8601Kind::RepeatingInterval => {
            parse_repeating_interval(literal).map(Iso8601Value::RepeatingInterval)
        }
    };
    parsed.map_err(|reason| TimepieceError::InvalidIso8601 {
        kind: kind.to_string(),
        literal: literal.to_string(),
        reason,
    })
}

fn parse_datetime(literal: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(literal) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    let naive = literal.strip_suffix('Z').unwrap_or(literal);
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .map(|dt| dt.and_utc())
        .ok_or_else(|| "expected a datetime like 2020-01-31T10:30:00".to_string())
}

fn parse_date(literal: &str) -> std::result::Result<NaiveDate, String> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(literal, fmt).ok())
        .ok_or_else(|| "expected a date like 2020-01-31".to_string())
}

fn parse_time(literal: &str) -> std::result::Result<NaiveTime, String> {
    let naive = literal.strip_suffix('Z').unwrap_or(literal);
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(naive, fmt).ok())
        .ok_or_else(|| "expected a time like 10:30:00".to_string())
}

fn parse_duration(literal: &str) -> std::result::Result<DurationSpec, String> {
    let body = literal
        .strip_prefix('P')
        .ok_or_else(|| "a duration starts with 'P'".to_string())?;
    let (date_part, time_part) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };

    let mut duration = DurationSpec::default();
    let mut seen = false;

    for (value, designator) in components(date_part)? {
        seen = true;
        match designator {
            'Y' => duration.years = value,
            'M' => duration.months = value,
            'W' => duration.weeks = value,
            'D' => duration.days = value,
            other => return Err(format!("unexpected designator '{other}' before 'T'")),
        }
    }
    if let Some(time_part) = time_part {
        if time_part.is_empty() {
            return Err("'T' must be followed by hours, minutes or seconds".to_string());
        }
        for (value, designator) in components(time_part)? {
            seen = true;
            match designator {
                'H' => duration.hours = value,
                'M' => duration.minutes = value,
                'S' => duration.seconds = value,
                other => return Err(format!("unexpected designator '{other}' after 'T'")),
            }
        }
    }

    if !seen {
        return Err("a duration needs at least one component".to_string());
    }
    Ok(duration)
}

/// Split `1Y2M` into `[(1, 'Y'), (2, 'M')]`.
fn components(part: &str) -> std::result::Result<Vec<(u32, char)>, String> {
    let mut found = Vec::new();
    let mut digits = String::new();
    for c in part.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            return Err(format!("expected a number before '{c}'"));
        }
        let value = digits
            .parse::<u32>()
            .map_err(|_| format!("'{digits}' is too large"))?;
        found.push((value, c));
        digits.clear();
    }
    if !digits.is_empty() {
        return Err(format!("'{digits}' has no designator"));
    }
    Ok(found)
}

fn parse_repeating_interval(literal: &str) -> std::result::Result<RepeatingInterval, String> {
    let mut parts = literal.split('/');
    let repeat = parts.next().unwrap_or_default();
    let count = match repeat.strip_prefix('R') {
        Some("") => None,
        Some(n) => Some(
            n.parse::<u32>()
                .map_err(|_| format!("'{n}' is not a repetition count"))?,
        ),
        None => return Err("a repeating interval starts with 'R'".to_string()),
    };

    let (Some(start), Some(duration), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("expected R[n]/<start>/<duration>".to_string());
    };

    Ok(RepeatingInterval {
        count,
        start: parse_datetime(start)?,
        duration: parse_duration(duration)?,
    })
}
