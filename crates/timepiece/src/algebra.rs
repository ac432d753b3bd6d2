//! Spec algebra: reducing a parse tree into one canonical [`Section`].
//!
//! Leaves are normalised through the registry and simplified. Joins fold
//! through [`Section::combine_with`] (`&`) and [`Section::or_with`] (`|`),
//! each an exhaustive match over the pair of operands. The result of every
//! join is simplified again, so an OR-group is always a
//! `ManyRepeatAndFilters` by the time it meets the next operator.

use chrono::NaiveTime;
use tracing::debug;

use crate::engine::Clock;
use crate::error::{FieldError, Result, TimepieceError};
use crate::grammar::{Args, Joiner, ParseNode};
use crate::normalize::{normalize, Context};
use crate::registry::default_registry;
use crate::sections::{
    AmountSpec, Capability, DateSpec, DateTimeSpec, Every, FilterSpec, IntervalSpec, IntervalsSpec,
    Iso8601Value, ManyRepeatAndFiltersSpec, RangeSpec, RepeatAndFiltersSpec, RepeatEnd, RepeatSpec,
    Section, TimeSpec,
};
use crate::sizing::convert_amount_from;

/// Reduce a parse tree with the shared registry and the system clock.
///
/// # Errors
/// Any failure from normalising a leaf, an unsupported pair of operands, or,
/// when `validate` is set, a result that cannot say when anything happens.
pub fn reduce(node: &ParseNode, validate: bool) -> Result<Section> {
    let registry = default_registry();
    let ctx = Context::new(&registry, Clock::System, None);
    reduce_with(node, &ctx, validate)
}

/// Reduce a parse tree within an explicit context.
pub fn reduce_with(node: &ParseNode, ctx: &Context<'_>, validate: bool) -> Result<Section> {
    let result = reduce_node(node, ctx)?;
    if validate {
        check_complete(&result)?;
    }
    Ok(result)
}

fn reduce_node(node: &ParseNode, ctx: &Context<'_>) -> Result<Section> {
    match node {
        ParseNode::Call { name, args, .. } => section_from_call(name, args, ctx),
        ParseNode::Join {
            joiner,
            left,
            right,
        } => {
            let left = reduce_node(left, ctx)?.simplify(ctx)?;
            let right = reduce_node(right, ctx)?.simplify(ctx)?;
            let joined = match joiner {
                Joiner::And => left.combine_with(right)?,
                Joiner::Or => left.or_with(right)?,
            };
            let result = joined.simplify(ctx)?;
            debug!(%joiner, kind = %result.kind(), "joined sections");
            Ok(result)
        }
    }
}

fn check_complete(result: &Section) -> Result<()> {
    if result.is_parameter_only() {
        return Err(TimepieceError::ParameterOnly {
            kind: result.kind(),
        });
    }
    let got = result.specifies();
    if got.contains(&Capability::Once) || got.contains(&Capability::Repeat) {
        return Ok(());
    }
    Err(TimepieceError::IncompleteSpec {
        got: got.into_iter().collect(),
    })
}

/// Resolve `name` in the context's registry and normalise `args` into it,
/// without simplifying.
///
/// # Errors
/// `UnknownSection` listing the registered names, or the normaliser's
/// `Validation` error.
pub fn normalize_call(name: &str, args: &Args, ctx: &Context<'_>) -> Result<Section> {
    let registry = ctx.registry();
    let schema = registry
        .resolve(name)
        .ok_or_else(|| TimepieceError::UnknownSection {
            name: name.to_string(),
            available: registry.names(),
        })?;
    normalize(name, schema, args, ctx)
}

/// [`normalize_call`] followed by [`Section::simplify`].
pub fn section_from_call(name: &str, args: &Args, ctx: &Context<'_>) -> Result<Section> {
    let section = normalize_call(name, args, ctx)?.simplify(ctx)?;
    debug!(section = name, kind = %section.kind(), "normalised section");
    Ok(section)
}

/// A `Repeat` view of the operands that name a start.
fn into_repeat(section: Section) -> std::result::Result<RepeatSpec, Section> {
    match section {
        Section::Repeat(repeat) => Ok(repeat),
        Section::DateTime(datetime) => Ok(RepeatSpec::once(datetime)),
        other => Err(other),
    }
}

fn unsupported(joiner: Joiner, left: &Section, right: &Section) -> TimepieceError {
    TimepieceError::UnsupportedCombination {
        joiner,
        left: left.kind(),
        right: right.kind(),
    }
}

impl Section {
    /// Collapse a shorthand section into its canonical form. Canonical
    /// sections come back unchanged.
    ///
    /// # Errors
    /// `InvalidRange` for a `range` that has nothing to draw from, and
    /// `InvalidIso8601` for a repeating interval whose end cannot be
    /// represented.
    pub fn simplify(self, ctx: &Context<'_>) -> Result<Section> {
        let simplified: Section = match self {
            Section::Now => RepeatSpec::once(DateTimeSpec::new(ctx.now())).into(),
            Section::SunRise => TimeSpec::new(3, 0).into(),
            Section::SunSet => TimeSpec::new(18, 0).into(),
            Section::Epoch(epoch) => {
                let datetime = epoch.datetime().ok_or_else(|| TimepieceError::Validation {
                    section: "epoch".to_string(),
                    errors: vec![FieldError::new("epoch", "out of range")],
                })?;
                DateTimeSpec::new(datetime).into()
            }
            Section::Between(between) => RepeatSpec {
                start: between.start,
                end: Some(between.end.unwrap_or(RepeatEnd::Forever)),
                every: None,
            }
            .into(),
            Section::DayName(day_name) => FilterSpec {
                day_names: day_name.names,
                ..FilterSpec::default()
            }
            .into(),
            Section::DayNumber(day_number) => FilterSpec {
                day_numbers: [day_number.number].into(),
                ..FilterSpec::default()
            }
            .into(),
            Section::Range(range) => draw_amount(range, ctx)?.into(),
            Section::RepeatAndFilters(spec) => ManyRepeatAndFiltersSpec::new(vec![spec]).into(),
            Section::Iso8601(iso) => match iso.value {
                Iso8601Value::DateTime(datetime) => DateTimeSpec::new(datetime).into(),
                Iso8601Value::Date(date) => DateSpec { date }.into(),
                Iso8601Value::Time(time) => TimeSpec::from(time).into(),
                Iso8601Value::Duration(duration) => duration.into(),
                Iso8601Value::RepeatingInterval(repeating) => {
                    let every = Every::Duration(repeating.duration);
                    let end = match repeating.count {
                        None => RepeatEnd::Forever,
                        Some(count) => every
                            .step()
                            .nth(repeating.start, count as i64)
                            .map(|end| RepeatEnd::At(DateTimeSpec::new(end)))
                            .ok_or_else(|| TimepieceError::InvalidIso8601 {
                                kind: iso.kind.to_string(),
                                literal: iso.specification.clone(),
                                reason: "the last repetition is out of range".to_string(),
                            })?,
                    };
                    RepeatSpec {
                        start: DateTimeSpec::new(repeating.start),
                        end: Some(end),
                        every: Some(IntervalsSpec::contain(IntervalSpec::new(every))),
                    }
                    .into()
                }
            },
            canonical => canonical,
        };
        Ok(simplified)
    }

    /// `self & other`.
    ///
    /// # Errors
    /// `UnsupportedCombination` for any pair without a rule.
    pub fn combine_with(self, other: Section) -> Result<Section> {
        let combined: Section = match (self, other) {
            (Section::Repeat(repeat), Section::Filter(filter)) => {
                RepeatAndFiltersSpec::new(repeat, vec![filter]).into()
            }
            (Section::Repeat(repeat), Section::Interval(interval)) => {
                repeat.with_every(IntervalsSpec::contain(interval)).into()
            }
            (Section::Repeat(repeat), Section::Intervals(intervals)) => {
                repeat.with_every(intervals).into()
            }
            (
                Section::DateTime(datetime),
                right @ (Section::Filter(_) | Section::Interval(_) | Section::Intervals(_)),
            ) => return Section::Repeat(RepeatSpec::once(datetime)).combine_with(right),
            (Section::Filter(filter), Section::DateTime(datetime)) => {
                RepeatAndFiltersSpec::new(RepeatSpec::once(datetime), vec![filter]).into()
            }
            (Section::Filter(filter), Section::Repeat(repeat)) => {
                ManyRepeatAndFiltersSpec::new(vec![RepeatAndFiltersSpec::new(repeat, vec![filter])])
                    .into()
            }
            (Section::Filter(left), Section::Filter(right)) => left.union(right).into(),
            (Section::Filter(filter), Section::ManyRepeatAndFilters(many))
            | (Section::ManyRepeatAndFilters(many), Section::Filter(filter)) => {
                let specs = many
                    .specs
                    .iter()
                    .map(|spec| spec.and_filter(filter.clone()))
                    .collect();
                ManyRepeatAndFiltersSpec::new(specs).into()
            }
            (Section::Between(between), Section::Interval(interval)) => RepeatSpec {
                start: between.start,
                end: between.end,
                every: Some(IntervalsSpec::contain(interval)),
            }
            .into(),
            (Section::Between(between), Section::Intervals(intervals)) => RepeatSpec {
                start: between.start,
                end: between.end,
                every: Some(intervals),
            }
            .into(),
            (Section::Time(time), Section::Date(date))
            | (Section::Date(date), Section::Time(time)) => at_time(date, time)?.into(),
            (left, right) => return Err(unsupported(Joiner::And, &left, &right)),
        };
        Ok(combined)
    }

    /// `self | other`.
    ///
    /// # Errors
    /// `UnsupportedCombination` for any pair without a rule.
    pub fn or_with(self, other: Section) -> Result<Section> {
        let joined: Section = match (self, other) {
            (Section::Interval(left), Section::Interval(right)) => {
                IntervalsSpec::new(vec![left, right]).into()
            }
            (Section::Interval(left), Section::Intervals(right)) => {
                let mut intervals = vec![left];
                intervals.extend(right.intervals);
                IntervalsSpec::new(intervals).into()
            }
            (Section::Intervals(mut left), Section::Interval(right)) => {
                left.intervals.push(right);
                left.into()
            }
            (Section::Intervals(mut left), Section::Intervals(right)) => {
                left.intervals.extend(right.intervals);
                left.into()
            }
            (Section::ManyRepeatAndFilters(mut left), Section::ManyRepeatAndFilters(right)) => {
                left.specs.extend(right.specs);
                left.into()
            }
            (Section::ManyRepeatAndFilters(mut left), right) => match into_repeat(right) {
                Ok(repeat) => {
                    left.specs.push(RepeatAndFiltersSpec::unfiltered(repeat));
                    left.into()
                }
                Err(right) => {
                    return Err(unsupported(Joiner::Or, &Section::from(left), &right));
                }
            },
            (left, Section::ManyRepeatAndFilters(right)) => match into_repeat(left) {
                Ok(repeat) => {
                    let mut specs = vec![RepeatAndFiltersSpec::unfiltered(repeat)];
                    specs.extend(right.specs);
                    ManyRepeatAndFiltersSpec::new(specs).into()
                }
                Err(left) => {
                    return Err(unsupported(Joiner::Or, &left, &Section::from(right)));
                }
            },
            (left, right) => {
                let repeat = match into_repeat(left) {
                    Ok(repeat) => repeat,
                    Err(left) => return Err(unsupported(Joiner::Or, &left, &right)),
                };
                let alternative = match right {
                    Section::Filter(filter) => RepeatAndFiltersSpec::new(repeat.clone(), vec![filter]),
                    Section::Interval(interval) => RepeatAndFiltersSpec::unfiltered(
                        repeat.with_every(IntervalsSpec::contain(interval)),
                    ),
                    Section::Intervals(intervals) => {
                        RepeatAndFiltersSpec::unfiltered(repeat.with_every(intervals))
                    }
                    right => match into_repeat(right) {
                        Ok(other) => RepeatAndFiltersSpec::unfiltered(other),
                        Err(right) => {
                            return Err(unsupported(Joiner::Or, &Section::from(repeat), &right));
                        }
                    },
                };
                ManyRepeatAndFiltersSpec::new(vec![
                    RepeatAndFiltersSpec::unfiltered(repeat),
                    alternative,
                ])
                .into()
            }
        };
        Ok(joined)
    }
}

fn at_time(date: DateSpec, time: TimeSpec) -> Result<DateTimeSpec> {
    let naive: NaiveTime = time.naive().ok_or_else(|| TimepieceError::Validation {
        section: "time".to_string(),
        errors: vec![FieldError::new("hour", format!("{time} is not a valid time of day"))],
    })?;
    Ok(DateTimeSpec::new(date.date.and_time(naive).and_utc()))
}

/// Draw a concrete amount from `[min, max)`, both expressed in the finer unit.
fn draw_amount(range: RangeSpec, ctx: &Context<'_>) -> Result<AmountSpec> {
    let size = range.min.size.common(range.max.size);
    let reference = ctx.now();
    let in_common = |amount: AmountSpec| -> u64 {
        let num = i64::try_from(amount.num).unwrap_or(i64::MAX);
        convert_amount_from(reference, amount.size, size, num).round() as u64
    };

    let (low, high) = (in_common(range.min), in_common(range.max));
    if low >= high {
        return Err(TimepieceError::InvalidRange {
            reason: format!("{} is not less than {}", range.min, range.max),
        });
    }
    Ok(AmountSpec::new(ctx.draw(low..high), size))
}
