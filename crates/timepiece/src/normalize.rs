//! Turning raw call arguments into typed section records.
//!
//! [`normalize`] checks every argument of a call against the section's
//! [`FieldSchema`] and collects every problem before failing, so a single
//! `Validation` error lists all of them. Nested section calls are resolved
//! through the same registry.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Range;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::algebra;
use crate::engine::Clock;
use crate::error::{FieldError, Result, TimepieceError};
use crate::grammar::{ArgValue, Args};
use crate::registry::{FieldKind, FieldSchema, Registry};
use crate::sections::{DateTimeSpec, DayName, RepeatEnd, Section};

/// Everything a reduction needs besides the tree itself.
pub struct Context<'a> {
    registry: &'a Registry,
    clock: Clock,
    rng: RefCell<StdRng>,
}

impl<'a> Context<'a> {
    /// `seed` makes `range(...)` draws repeatable.
    pub fn new(registry: &'a Registry, clock: Clock, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            registry,
            clock,
            rng: RefCell::new(rng),
        }
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// A uniform draw from `range`. The range must not be empty.
    pub fn draw(&self, range: Range<u64>) -> u64 {
        self.rng.borrow_mut().gen_range(range)
    }
}

/// A field value after type checking.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    IntegerList(Vec<i64>),
    TextList(Vec<String>),
    Section(Section),
    Instant(RepeatEnd),
}

/// Type-checked fields handed to a section's build function.
///
/// Required fields are always present; the `take_*` accessors return `None`
/// only for optional fields that were not given.
#[derive(Debug, Default)]
pub struct Fields {
    values: BTreeMap<&'static str, FieldValue>,
}

impl Fields {
    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        self.values.insert(name, value);
    }

    pub fn take(&mut self, name: &str) -> Option<FieldValue> {
        self.values.remove(name)
    }

    pub fn take_integer(&mut self, name: &str) -> Option<i64> {
        match self.take(name)? {
            FieldValue::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// For fields whose kind already bounds them to `u32`.
    pub fn take_u32(&mut self, name: &str) -> Option<u32> {
        self.take_integer(name).and_then(|n| u32::try_from(n).ok())
    }

    pub fn take_float(&mut self, name: &str) -> Option<f64> {
        match self.take(name)? {
            FieldValue::Float(n) => Some(n),
            _ => None,
        }
    }

    pub fn take_text(&mut self, name: &str) -> Option<String> {
        match self.take(name)? {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn take_integers(&mut self, name: &str) -> Option<Vec<i64>> {
        match self.take(name)? {
            FieldValue::IntegerList(items) => Some(items),
            _ => None,
        }
    }

    pub fn take_u32s(&mut self, name: &str) -> Vec<u32> {
        self.take_integers(name)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|n| u32::try_from(n).ok())
            .collect()
    }

    pub fn take_texts(&mut self, name: &str) -> Option<Vec<String>> {
        match self.take(name)? {
            FieldValue::TextList(items) => Some(items),
            _ => None,
        }
    }

    pub fn take_section(&mut self, name: &str) -> Option<Section> {
        match self.take(name)? {
            FieldValue::Section(section) => Some(section),
            _ => None,
        }
    }

    pub fn take_instant(&mut self, name: &str) -> Option<RepeatEnd> {
        match self.take(name)? {
            FieldValue::Instant(end) => Some(end),
            _ => None,
        }
    }
}

/// Normalise the arguments of a call to the section registered as `section`.
///
/// # Errors
/// Returns `TimepieceError::Validation` listing every missing, unexpected or
/// invalid argument.
pub fn normalize(section: &str, schema: &FieldSchema, args: &Args, ctx: &Context<'_>) -> Result<Section> {
    let mut errors = Vec::new();
    let mut fields = Fields::default();

    for name in args.keys() {
        if schema.field(name).is_none() {
            errors.push(FieldError::new(name.as_str(), "unexpected argument"));
        }
    }

    for field in schema.fields {
        match args.get(field.name) {
            None if field.required => errors.push(FieldError::new(field.name, "required")),
            None => {}
            Some(value) => match normalize_value(field.kind, value, ctx) {
                Ok(value) => fields.insert(field.name, value),
                Err(reason) => errors.push(FieldError::new(field.name, reason)),
            },
        }
    }

    if !errors.is_empty() {
        return Err(validation(section, errors));
    }
    (schema.build)(&mut fields).map_err(|errors| validation(section, errors))
}

fn validation(section: &str, errors: Vec<FieldError>) -> TimepieceError {
    TimepieceError::Validation {
        section: section.to_string(),
        errors,
    }
}

fn normalize_value(kind: FieldKind, value: &ArgValue, ctx: &Context<'_>) -> std::result::Result<FieldValue, String> {
    match kind {
        FieldKind::Integer => as_integer(value).map(FieldValue::Integer),
        FieldKind::BoundedInteger { min, max } => {
            let n = as_integer(value)?;
            check_bounds(n, min, max)?;
            Ok(FieldValue::Integer(n))
        }
        FieldKind::Float => as_float(value).map(FieldValue::Float),
        FieldKind::Text => as_text(value).map(FieldValue::Text),
        FieldKind::Choice(choices) => {
            let text = as_text(value)?;
            check_choice(&text, choices)?;
            Ok(FieldValue::Text(text))
        }
        FieldKind::IntegerList { min, max } => {
            let items = as_list(value)?;
            let mut numbers = Vec::with_capacity(items.len());
            let mut problems = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let checked = item
                    .parse::<i64>()
                    .map_err(|_| format!("expected an integer, got '{item}'"))
                    .and_then(|n| check_bounds(n, min, max).map(|()| n));
                match checked {
                    Ok(n) => numbers.push(n),
                    Err(reason) => problems.push(format!("item {index}: {reason}")),
                }
            }
            if problems.is_empty() {
                Ok(FieldValue::IntegerList(numbers))
            } else {
                Err(problems.join(", "))
            }
        }
        FieldKind::ChoiceList(choices) => {
            let items = as_list(value)?;
            let problems: Vec<String> = items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| {
                    check_choice(item, choices)
                        .err()
                        .map(|reason| format!("item {index}: {reason}"))
                })
                .collect();
            if problems.is_empty() {
                Ok(FieldValue::TextList(items))
            } else {
                Err(problems.join(", "))
            }
        }
        FieldKind::Section(kinds) => {
            let section = nested_section(value, ctx, true)?;
            if kinds.contains(&section.kind()) {
                Ok(FieldValue::Section(section))
            } else {
                let wanted: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
                Err(format!(
                    "expected one of {}, got {}",
                    wanted.join(", "),
                    section.kind()
                ))
            }
        }
        FieldKind::Instant { forever } => {
            let section = nested_section(value, ctx, false)?;
            resolve_instant(section, ctx, forever).map(FieldValue::Instant)
        }
    }
}

fn as_integer(value: &ArgValue) -> std::result::Result<i64, String> {
    match value {
        ArgValue::Int(n) => Ok(*n),
        ArgValue::Str(s) => s
            .parse::<i64>()
            .map_err(|_| format!("expected an integer, got '{s}'")),
        other => Err(format!("expected an integer, got '{other}'")),
    }
}

fn as_float(value: &ArgValue) -> std::result::Result<f64, String> {
    match value {
        ArgValue::Int(n) => Ok(*n as f64),
        ArgValue::Str(s) => s
            .parse::<f64>()
            .map_err(|_| format!("expected a number, got '{s}'")),
        other => Err(format!("expected a number, got '{other}'")),
    }
}

fn as_text(value: &ArgValue) -> std::result::Result<String, String> {
    match value {
        ArgValue::Str(s) => Ok(s.clone()),
        ArgValue::Int(n) => Ok(n.to_string()),
        ArgValue::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected a string, got '{other}'")),
    }
}

fn as_list(value: &ArgValue) -> std::result::Result<Vec<String>, String> {
    match value {
        ArgValue::List(items) => Ok(items.clone()),
        ArgValue::Str(s) => Ok(vec![s.clone()]),
        ArgValue::Int(n) => Ok(vec![n.to_string()]),
        other => Err(format!("expected ';' separated values, got '{other}'")),
    }
}

fn check_bounds(n: i64, min: i64, max: i64) -> std::result::Result<(), String> {
    match (n < min, n > max) {
        (false, false) => Ok(()),
        _ if max == i64::MAX => Err(format!("expected at least {min}, got {n}")),
        _ => Err(format!("expected {min}..={max}, got {n}")),
    }
}

fn check_choice(text: &str, choices: &[&str]) -> std::result::Result<(), String> {
    if choices.contains(&text) {
        Ok(())
    } else {
        Err(format!(
            "expected one of the available choices ({}), got '{text}'",
            choices.join(", ")
        ))
    }
}

/// The section an argument names, simplified when `simplify` is set.
fn nested_section(value: &ArgValue, ctx: &Context<'_>, simplify: bool) -> std::result::Result<Section, String> {
    let section = match value {
        ArgValue::Call { name, args } => algebra::normalize_call(name, args, ctx),
        ArgValue::Spec(section) => Ok(section.as_ref().clone()),
        other => return Err(format!("expected a section, got '{other}'")),
    };
    let section = section.map_err(|e| e.to_string())?;
    if simplify {
        section.simplify(ctx).map_err(|e| e.to_string())
    } else {
        Ok(section)
    }
}

/// Pin a section down to a single moment, relative to the context's clock
/// where it only names a time of day or a day.
fn resolve_instant(section: Section, ctx: &Context<'_>, forever_ok: bool) -> std::result::Result<RepeatEnd, String> {
    let today = ctx.now().date_naive();
    let at = |date: NaiveDate, time: NaiveTime| RepeatEnd::At(DateTimeSpec::new(date.and_time(time).and_utc()));

    match section {
        Section::DateTime(datetime) => Ok(RepeatEnd::At(datetime)),
        Section::Repeat(repeat) if repeat.every.is_none() && repeat.end.is_none() => {
            Ok(RepeatEnd::At(repeat.start))
        }
        Section::Now => Ok(RepeatEnd::At(DateTimeSpec::new(ctx.now()))),
        Section::Epoch(epoch) => epoch
            .datetime()
            .map(|dt| RepeatEnd::At(DateTimeSpec::new(dt)))
            .ok_or_else(|| format!("epoch {} is out of range", epoch.epoch)),
        Section::SunRise | Section::SunSet | Section::Iso8601(_) => {
            let simplified = section.simplify(ctx).map_err(|e| e.to_string())?;
            resolve_instant(simplified, ctx, forever_ok)
        }
        Section::Time(time) => time
            .naive()
            .map(|t| at(today, t))
            .ok_or_else(|| format!("{time} is not a valid time of day")),
        Section::Date(date) => Ok(at(date.date, NaiveTime::MIN)),
        Section::DayName(names) => names
            .names
            .iter()
            .map(|name| days_until(today, *name))
            .min()
            .map(|ahead| at(today + Duration::days(ahead), NaiveTime::MIN))
            .ok_or_else(|| "expected at least one day name".to_string()),
        Section::DayNumber(number) => NaiveDate::from_yo_opt(today.year(), number.number)
            .map(|date| at(date, NaiveTime::MIN))
            .ok_or_else(|| format!("{} has no day number {}", today.year(), number.number)),
        Section::Forever if forever_ok => Ok(RepeatEnd::Forever),
        Section::Forever => Err("forever() can only be used as an end".to_string()),
        other => Err(format!("expected a moment in time, got {}", other.kind())),
    }
}

fn days_until(today: NaiveDate, name: DayName) -> i64 {
    let from = today.weekday().num_days_from_monday() as i64;
    let to = name.weekday().num_days_from_monday() as i64;
    (to - from).rem_euclid(7)
}
