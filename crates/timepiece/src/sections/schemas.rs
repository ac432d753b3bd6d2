//! Field schemas for every built-in section name.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::{
    AmountSpec, BetweenSpec, DateSpec, DateTimeSpec, DayName, DayNameSpec, DayNumberSpec, EpochSpec, Every,
    FilterSpec, IntervalSpec, IntervalsSpec, Iso8601Kind, Iso8601Spec, RangeSpec, RepeatEnd,
    RepeatSpec, Section, SectionKind, TimeSpec,
};
use crate::error::FieldError;
use crate::iso8601;
use crate::normalize::Fields;
use crate::registry::{Field, FieldKind, FieldSchema, Registry};
use crate::sizing::Size;

type Built = std::result::Result<Section, Vec<FieldError>>;

const SIZE_NAMES: &[&str] = &["second", "minute", "hour", "day", "week", "month", "year"];
const INSTANT: FieldKind = FieldKind::Instant { forever: false };
const END: FieldKind = FieldKind::Instant { forever: true };

const DEFAULTS: &[(&str, FieldSchema)] = &[
    (
        "repeat",
        FieldSchema::new(
            &[
                Field::required("start", INSTANT),
                Field::optional("end", END),
                Field::optional(
                    "every",
                    FieldKind::Section(&[SectionKind::Interval, SectionKind::Intervals]),
                ),
            ],
            build_repeat,
        ),
    ),
    (
        "filter",
        FieldSchema::new(
            &[
                Field::optional("minutes", FieldKind::list_within(0, 59)),
                Field::optional("hours", FieldKind::list_within(0, 23)),
                Field::optional("days", FieldKind::list_within(1, 31)),
                Field::optional("weeks", FieldKind::list_within(1, 53)),
                Field::optional("months", FieldKind::list_within(1, 12)),
                Field::optional("day_names", FieldKind::ChoiceList(&DayName::NAMES)),
                Field::optional("day_numbers", FieldKind::list_within(1, 366)),
            ],
            build_filter,
        ),
    ),
    ("now", FieldSchema::new(&[], build_now)),
    ("sunrise", FieldSchema::new(&[], build_sunrise)),
    ("sunset", FieldSchema::new(&[], build_sunset)),
    ("forever", FieldSchema::new(&[], build_forever)),
    (
        "epoch",
        FieldSchema::new(&[Field::required("epoch", FieldKind::Float)], build_epoch),
    ),
    (
        "amount",
        FieldSchema::new(
            &[
                Field::required("num", FieldKind::NON_NEGATIVE),
                Field::required("size", FieldKind::Choice(SIZE_NAMES)),
            ],
            build_amount,
        ),
    ),
    (
        "range",
        FieldSchema::new(
            &[
                Field::required("min", FieldKind::Section(&[SectionKind::Amount])),
                Field::required("max", FieldKind::Section(&[SectionKind::Amount])),
            ],
            build_range,
        ),
    ),
    (
        "interval",
        FieldSchema::new(
            &[Field::required(
                "every",
                FieldKind::Section(&[SectionKind::Amount, SectionKind::Duration]),
            )],
            build_interval,
        ),
    ),
    (
        "between",
        FieldSchema::new(
            &[Field::required("start", INSTANT), Field::optional("end", END)],
            build_between,
        ),
    ),
    (
        "day_name",
        FieldSchema::new(
            &[Field::required("name", FieldKind::ChoiceList(&DayName::NAMES))],
            build_day_name,
        ),
    ),
    (
        "day_number",
        FieldSchema::new(&[Field::required("number", FieldKind::within(1, 366))], build_day_number),
    ),
    (
        "time",
        FieldSchema::new(
            &[
                Field::required("hour", FieldKind::within(0, 23)),
                Field::required("minute", FieldKind::within(0, 59)),
            ],
            build_time,
        ),
    ),
    (
        "date",
        FieldSchema::new(
            &[
                Field::required("year", FieldKind::Integer),
                Field::required("month", FieldKind::within(1, 12)),
                Field::required("day", FieldKind::within(1, 31)),
            ],
            build_date,
        ),
    ),
    (
        "iso8601",
        FieldSchema::new(
            &[
                Field::required("type", FieldKind::Choice(&Iso8601Kind::NAMES)),
                Field::required("specification", FieldKind::Text),
            ],
            build_iso8601,
        ),
    ),
];

pub(crate) fn register_defaults(registry: &mut Registry) {
    for (name, schema) in DEFAULTS {
        registry.register(*name, *schema);
    }
}

fn required<T>(value: Option<T>, field: &str) -> std::result::Result<T, Vec<FieldError>> {
    value.ok_or_else(|| vec![FieldError::new(field, "required")])
}

fn start_instant(end: RepeatEnd) -> std::result::Result<DateTimeSpec, Vec<FieldError>> {
    match end {
        RepeatEnd::At(start) => Ok(start),
        RepeatEnd::Forever => Err(vec![FieldError::new("start", "a start can't be forever")]),
    }
}

fn build_now(_: &mut Fields) -> Built {
    Ok(Section::Now)
}

fn build_sunrise(_: &mut Fields) -> Built {
    Ok(Section::SunRise)
}

fn build_sunset(_: &mut Fields) -> Built {
    Ok(Section::SunSet)
}

fn build_forever(_: &mut Fields) -> Built {
    Ok(Section::Forever)
}

fn build_repeat(fields: &mut Fields) -> Built {
    let start = start_instant(required(fields.take_instant("start"), "start")?)?;
    let every = match fields.take_section("every") {
        Some(Section::Interval(interval)) => Some(IntervalsSpec::contain(interval)),
        Some(Section::Intervals(intervals)) => Some(intervals),
        _ => None,
    };
    Ok(RepeatSpec {
        start,
        end: fields.take_instant("end"),
        every,
    }
    .into())
}

fn build_filter(fields: &mut Fields) -> Built {
    let mut numbers = |name: &str| -> BTreeSet<u32> { fields.take_u32s(name).into_iter().collect() };
    let mut filter = FilterSpec {
        minutes: numbers("minutes"),
        hours: numbers("hours"),
        days: numbers("days"),
        weeks: numbers("weeks"),
        months: numbers("months"),
        day_numbers: numbers("day_numbers"),
        ..FilterSpec::default()
    };
    filter.day_names = fields
        .take_texts("day_names")
        .unwrap_or_default()
        .iter()
        .filter_map(|name| DayName::parse(name))
        .collect();
    Ok(filter.into())
}

fn build_epoch(fields: &mut Fields) -> Built {
    let epoch = EpochSpec {
        epoch: required(fields.take_float("epoch"), "epoch")?,
    };
    if epoch.datetime().is_none() {
        return Err(vec![FieldError::new(
            "epoch",
            format!("{} is not a representable moment", epoch.epoch),
        )]);
    }
    Ok(epoch.into())
}

fn build_amount(fields: &mut Fields) -> Built {
    let num = required(fields.take_integer("num"), "num")?;
    let size = required(fields.take_text("size"), "size")?;
    let size: Size = size
        .parse()
        .map_err(|_| vec![FieldError::new("size", format!("'{size}' is not a unit"))])?;
    let num = u64::try_from(num)
        .map_err(|_| vec![FieldError::new("num", format!("{num} is negative"))])?;
    Ok(AmountSpec::new(num, size).into())
}

fn build_range(fields: &mut Fields) -> Built {
    let amount = |section: Option<Section>, field: &str| match section {
        Some(Section::Amount(amount)) => Ok(amount),
        _ => Err(vec![FieldError::new(field, "expected an amount")]),
    };
    let min = amount(fields.take_section("min"), "min")?;
    let max = amount(fields.take_section("max"), "max")?;
    Ok(RangeSpec { min, max }.into())
}

fn build_interval(fields: &mut Fields) -> Built {
    let every = match fields.take_section("every") {
        Some(Section::Amount(amount)) => Every::Amount(amount),
        Some(Section::Duration(duration)) => Every::Duration(duration),
        _ => return Err(vec![FieldError::new("every", "expected an amount or a duration")]),
    };
    Ok(IntervalSpec::new(every).into())
}

fn build_between(fields: &mut Fields) -> Built {
    let start = start_instant(required(fields.take_instant("start"), "start")?)?;
    Ok(BetweenSpec {
        start,
        end: fields.take_instant("end"),
    }
    .into())
}

fn build_day_name(fields: &mut Fields) -> Built {
    let names: BTreeSet<DayName> = required(fields.take_texts("name"), "name")?
        .iter()
        .filter_map(|name| DayName::parse(name))
        .collect();
    if names.is_empty() {
        return Err(vec![FieldError::new("name", "expected at least one day name")]);
    }
    Ok(DayNameSpec { names }.into())
}

fn build_day_number(fields: &mut Fields) -> Built {
    let number = required(fields.take_u32("number"), "number")?;
    Ok(DayNumberSpec { number }.into())
}

fn build_time(fields: &mut Fields) -> Built {
    let hour = required(fields.take_u32("hour"), "hour")?;
    let minute = required(fields.take_u32("minute"), "minute")?;
    Ok(TimeSpec::new(hour, minute).into())
}

fn build_date(fields: &mut Fields) -> Built {
    let year = required(fields.take_integer("year"), "year")?;
    let month = required(fields.take_u32("month"), "month")?;
    let day = required(fields.take_u32("day"), "day")?;
    let date = i32::try_from(year)
        .ok()
        .and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
        .ok_or_else(|| {
            vec![FieldError::new(
                "day",
                format!("{year}-{month}-{day} is not a calendar date"),
            )]
        })?;
    Ok(DateSpec { date }.into())
}

fn build_iso8601(fields: &mut Fields) -> Built {
    let kind_name = required(fields.take_text("type"), "type")?;
    let kind = Iso8601Kind::parse(&kind_name).ok_or_else(|| {
        vec![FieldError::new(
            "type",
            format!("'{kind_name}' is not an ISO 8601 type"),
        )]
    })?;
    let specification = required(fields.take_text("specification"), "specification")?;
    let value = iso8601::parse(kind, &specification)
        .map_err(|e| vec![FieldError::new("specification", e.to_string())])?;
    Ok(Iso8601Spec {
        kind,
        specification,
        value,
    }
    .into())
}
