//! Tests for ISO-8601 literals.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use timepiece::iso8601::parse;
use timepiece::sections::{DurationSpec, Iso8601Kind, Iso8601Value};
use timepiece::TimepieceError;

fn duration(literal: &str) -> DurationSpec {
    match parse(Iso8601Kind::Duration, literal) {
        Ok(Iso8601Value::Duration(duration)) => duration,
        other => panic!("expected a duration for {literal}, got {other:?}"),
    }
}

#[test]
fn datetimes_with_offsets_become_utc() {
    assert_eq!(
        parse(Iso8601Kind::DateTime, "2020-01-31T10:30:00+02:00").unwrap(),
        Iso8601Value::DateTime(Utc.with_ymd_and_hms(2020, 1, 31, 8, 30, 0).unwrap())
    );
    assert_eq!(
        parse(Iso8601Kind::DateTime, "2020-01-31T10:30:00Z").unwrap(),
        Iso8601Value::DateTime(Utc.with_ymd_and_hms(2020, 1, 31, 10, 30, 0).unwrap())
    );
}

#[test]
fn datetimes_without_offsets_are_utc() {
    let expected = Iso8601Value::DateTime(Utc.with_ymd_and_hms(2020, 1, 31, 10, 30, 0).unwrap());
    assert_eq!(parse(Iso8601Kind::DateTime, "2020-01-31T10:30:00").unwrap(), expected);
    assert_eq!(parse(Iso8601Kind::DateTime, "2020-01-31T10:30").unwrap(), expected);
    assert_eq!(parse(Iso8601Kind::DateTime, "20200131T103000").unwrap(), expected);
}

#[test]
fn dates_and_times() {
    assert_eq!(
        parse(Iso8601Kind::Date, "2021-06-01").unwrap(),
        Iso8601Value::Date(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap())
    );
    assert_eq!(
        parse(Iso8601Kind::Date, "20210601").unwrap(),
        Iso8601Value::Date(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap())
    );
    assert_eq!(
        parse(Iso8601Kind::Time, "07:15").unwrap(),
        Iso8601Value::Time(NaiveTime::from_hms_opt(7, 15, 0).unwrap())
    );
    assert_eq!(
        parse(Iso8601Kind::Time, "07:15:30Z").unwrap(),
        Iso8601Value::Time(NaiveTime::from_hms_opt(7, 15, 30).unwrap())
    );
}

#[test]
fn durations_read_every_component() {
    assert_eq!(
        duration("P1Y2M3W4DT5H6M7S"),
        DurationSpec {
            years: 1,
            months: 2,
            weeks: 3,
            days: 4,
            hours: 5,
            minutes: 6,
            seconds: 7,
        }
    );
}

#[test]
fn minutes_and_months_share_a_designator() {
    let months = duration("P5M");
    assert_eq!((months.months, months.minutes), (5, 0));

    let minutes = duration("PT5M");
    assert_eq!((minutes.months, minutes.minutes), (0, 5));
}

#[test]
fn durations_render_back() {
    assert_eq!(duration("P1DT12H").to_string(), "P1DT12H");
    assert_eq!(duration("PT90S").to_string(), "PT90S");
}

#[test]
fn bad_durations_are_rejected() {
    for literal in ["1D", "P", "PT", "P1", "PD", "P1H", "PT1D", "P1.5D"] {
        assert!(
            matches!(
                parse(Iso8601Kind::Duration, literal),
                Err(TimepieceError::InvalidIso8601 { .. })
            ),
            "{literal} should be rejected"
        );
    }
}

#[test]
fn repeating_intervals() {
    match parse(Iso8601Kind::RepeatingInterval, "R5/2024-01-01T00:00:00Z/PT1H").unwrap() {
        Iso8601Value::RepeatingInterval(repeating) => {
            assert_eq!(repeating.count, Some(5));
            assert_eq!(repeating.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
            assert_eq!(repeating.duration.hours, 1);
        }
        other => panic!("expected a repeating interval, got {other:?}"),
    }

    match parse(Iso8601Kind::RepeatingInterval, "R/2024-01-01T00:00:00Z/P1W").unwrap() {
        Iso8601Value::RepeatingInterval(repeating) => assert_eq!(repeating.count, None),
        other => panic!("expected a repeating interval, got {other:?}"),
    }
}

#[test]
fn bad_repeating_intervals_are_rejected() {
    for literal in [
        "5/2024-01-01T00:00:00Z/PT1H",
        "Rx/2024-01-01T00:00:00Z/PT1H",
        "R5/2024-01-01T00:00:00Z",
        "R5/2024-01-01T00:00:00Z/PT1H/extra",
        "R5/yesterday/PT1H",
    ] {
        assert!(
            parse(Iso8601Kind::RepeatingInterval, literal).is_err(),
            "{literal} should be rejected"
        );
    }
}

#[test]
fn errors_name_the_kind_and_literal() {
    let message = parse(Iso8601Kind::Date, "2020-02-30").unwrap_err().to_string();
    assert!(message.contains("date"), "{message}");
    assert!(message.contains("2020-02-30"), "{message}");
}
