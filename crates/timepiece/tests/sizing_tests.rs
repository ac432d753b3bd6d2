//! Tests for calendar units and amount conversion.

use chrono::{TimeZone, Utc};
use timepiece::sizing::convert_amount_from;
use timepiece::{common_size, convert_amount, Size, TimepieceError};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn units_are_ordered_finest_first() {
    assert_eq!(
        Size::names(),
        vec!["second", "minute", "hour", "day", "week", "month", "year"]
    );
}

#[test]
fn common_size_is_the_finer_unit() {
    let names = Size::names();
    for (i, first) in names.iter().enumerate() {
        for (j, second) in names.iter().enumerate() {
            let expected = names[i.min(j)];
            assert_eq!(
                common_size(first, second).unwrap().as_str(),
                expected,
                "common_size({first}, {second})"
            );
        }
    }
}

#[test]
fn common_size_rejects_unknown_units() {
    match common_size("fortnight", "day") {
        Err(TimepieceError::InvalidUnit { first, second }) => {
            assert_eq!(first, "fortnight");
            assert_eq!(second, "day");
        }
        other => panic!("expected an invalid unit, got {other:?}"),
    }
    let message = common_size("day", "eon").unwrap_err().to_string();
    assert!(message.starts_with("Size must be one of the valid units"), "{message}");
}

#[test]
fn converts_between_fixed_units() {
    assert_close(convert_amount(Size::Hour, Size::Second, 2), 7200.0);
    assert_close(convert_amount(Size::Second, Size::Minute, 3), 0.05);
    assert_close(convert_amount(Size::Minute, Size::Second, 3), 180.0);
    assert_close(convert_amount(Size::Minute, Size::Hour, 3), 0.05);
    assert_close(convert_amount(Size::Minute, Size::Day, 24 * 60 * 6), 6.0);
    assert_close(convert_amount(Size::Day, Size::Week, 13), 13.0 / 7.0);
    assert_close(convert_amount(Size::Second, Size::Hour, 28795), 7.998_611_111);
}

#[test]
fn same_unit_is_unchanged() {
    assert_close(convert_amount(Size::Month, Size::Month, 5), 5.0);
}

#[test]
fn negative_amounts_convert_symmetrically() {
    assert_close(convert_amount(Size::Minute, Size::Second, -3), -180.0);
}

#[test]
fn the_most_negative_amount_saturates() {
    let reference = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
    let minutes = convert_amount_from(reference, Size::Second, Size::Minute, i64::MIN);
    assert!(minutes.is_finite() && minutes < 0.0, "{minutes}");
    assert!(convert_amount_from(reference, Size::Day, Size::Day, i64::MIN) < 0.0);
}

#[test]
fn calendar_units_depend_on_the_reference() {
    let new_year = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();

    assert_close(convert_amount_from(new_year, Size::Month, Size::Year, 12), 1.0);
    assert_close(convert_amount_from(new_year, Size::Year, Size::Month, 2), 24.0);
    assert_close(convert_amount_from(new_year, Size::Day, Size::Month, 45), 1.5);
    assert_close(
        convert_amount_from(new_year, Size::Week, Size::Year, 52),
        364.0 / 365.0,
    );
    assert_close(convert_amount_from(new_year, Size::Month, Size::Day, 1), 31.0);

    let february = Utc.with_ymd_and_hms(2001, 2, 1, 0, 0, 0).unwrap();
    assert_close(convert_amount_from(february, Size::Month, Size::Day, 1), 28.0);
}

#[test]
fn parses_unit_names() {
    assert_eq!("week".parse::<Size>().unwrap(), Size::Week);
    assert!("weeks".parse::<Size>().is_err());
    assert_eq!(Size::Year.to_string(), "year");
}
