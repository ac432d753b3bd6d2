//! Property-based tests for occurrence search and filter matching using proptest.
//!
//! These check invariants that should hold for any spec of the given shape,
//! not just the examples in `following_tests.rs` and `filter_tests.rs`.

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use timepiece::sections::{
    DateTimeSpec, FilterSpec, IntervalSpec, IntervalsSpec, RepeatAndFiltersSpec, RepeatEnd,
    RepeatSpec,
};
use timepiece::{Clock, Size, Timepiece};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// A whole-second instant between 1970 and 2033.
fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..2_000_000_000).prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
}

fn arb_fixed_size() -> impl Strategy<Value = Size> {
    prop_oneof![
        Just(Size::Second),
        Just(Size::Minute),
        Just(Size::Hour),
        Just(Size::Day),
        Just(Size::Week),
    ]
}

fn arb_any_size() -> impl Strategy<Value = Size> {
    prop_oneof![arb_fixed_size(), Just(Size::Month), Just(Size::Year)]
}

fn arb_num() -> impl Strategy<Value = u64> {
    1u64..=90
}

fn arb_hours() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..24, 1..4)
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn repeat(start: DateTime<Utc>, end: Option<DateTime<Utc>>, intervals: Vec<IntervalSpec>) -> RepeatSpec {
    RepeatSpec {
        start: DateTimeSpec::new(start),
        end: Some(end.map_or(RepeatEnd::Forever, |end| {
            RepeatEnd::At(DateTimeSpec::new(end))
        })),
        every: Some(IntervalsSpec::new(intervals)),
    }
}

fn hours_filter(hours: &[u32]) -> FilterSpec {
    FilterSpec {
        hours: hours.iter().copied().collect(),
        ..FilterSpec::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: A single moment is due exactly until it has passed
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn one_shot_is_due_until_it_passes(moment in arb_instant(), at in arb_instant()) {
        let spec = DateTimeSpec::new(moment);
        let expected = (at <= moment).then_some(moment);
        prop_assert_eq!(spec.following(at), expected);
    }
}

// ---------------------------------------------------------------------------
// Property 2: Occurrences are after the query and before the end
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn occurrences_stay_inside_the_window(
        start in arb_instant(),
        length in 1i64..10_000_000,
        offset in -1_000_000i64..20_000_000,
        size in arb_any_size(),
        num in arb_num(),
    ) {
        let end = start + Duration::seconds(length);
        let at = start + Duration::seconds(offset);
        let spec = repeat(start, Some(end), vec![IntervalSpec::amount(num, size)]);

        match spec.following(at) {
            Some(next) => {
                prop_assert!(next >= at, "{} is before {}", next, at);
                prop_assert!(next < end, "{} is not before {}", next, end);
            }
            None => prop_assert!(
                at > end || at >= start,
                "nothing found before the start ({}) for {}",
                start,
                at
            ),
        }
        if at > end {
            prop_assert_eq!(spec.following(at), None);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: A fixed step lands on the first multiple after the query
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn fixed_steps_land_on_the_next_multiple(
        start in arb_instant(),
        offset in 0i64..500_000_000,
        size in arb_fixed_size(),
        num in arb_num(),
    ) {
        let at = start + Duration::seconds(offset);
        let spec = repeat(start, None, vec![IntervalSpec::amount(num, size)]);
        let step = size.fixed_seconds().unwrap() * num as i64;

        let expected = start + Duration::seconds((offset / step + 1) * step);
        prop_assert_eq!(spec.following(at), Some(expected));
    }
}

// ---------------------------------------------------------------------------
// Property 4: Several intervals answer the earliest of each on its own
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn intervals_answer_the_earliest_member(
        start in arb_instant(),
        offset in 0i64..50_000_000,
        first in (arb_any_size(), arb_num()),
        second in (arb_any_size(), arb_num()),
    ) {
        let at = start + Duration::seconds(offset);
        let a = IntervalSpec::amount(first.1, first.0);
        let b = IntervalSpec::amount(second.1, second.0);

        let both = repeat(start, None, vec![a, b]).following(at);
        let alone_a = repeat(start, None, vec![a]).following(at);
        let alone_b = repeat(start, None, vec![b]).following(at);
        prop_assert_eq!(both, alone_a.min(alone_b));
    }
}

// ---------------------------------------------------------------------------
// Property 5: OR is commutative for occurrence search
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn or_is_commutative(
        now in arb_instant(),
        epoch in 0i64..2_000_000_000,
        size in arb_any_size(),
        num in arb_num(),
        at in arb_instant(),
    ) {
        let timepiece = Timepiece::new().with_clock(Clock::Fixed(now));
        let left = format!("epoch(epoch: {epoch})");
        let right = format!(
            "(between(start: now()) & interval(every: amount(num: {num}, size: {size})))"
        );

        let forwards = timepiece
            .time_spec_to_object(&format!("{left} | {right}"), true)
            .unwrap();
        let backwards = timepiece
            .time_spec_to_object(&format!("{right} | {left}"), true)
            .unwrap();
        prop_assert_eq!(
            timepiece.following(&forwards, Some(at)),
            timepiece.following(&backwards, Some(at))
        );
    }
}

// ---------------------------------------------------------------------------
// Property 6: A repeat's filters all have to agree
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn filters_on_a_repeat_are_a_conjunction(
        first in arb_hours(),
        second in arb_hours(),
        instant in arb_instant(),
    ) {
        let (f, g) = (hours_filter(&first), hours_filter(&second));
        let spec = RepeatAndFiltersSpec::new(
            repeat(instant, None, vec![IntervalSpec::amount(1, Size::Hour)]),
            vec![f.clone(), g.clone()],
        );
        prop_assert_eq!(
            spec.is_filtered(instant),
            f.is_filtered(instant) && g.is_filtered(instant)
        );
    }
}

// ---------------------------------------------------------------------------
// Property 7: Merging two filters on one field admits either set
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn merged_filters_admit_either(
        first in arb_hours(),
        second in arb_hours(),
        instant in arb_instant(),
    ) {
        let (f, g) = (hours_filter(&first), hours_filter(&second));
        let merged = f.clone().union(g.clone());
        prop_assert_eq!(
            merged.is_filtered(instant),
            f.is_filtered(instant) || g.is_filtered(instant)
        );
    }
}

// ---------------------------------------------------------------------------
// Property 8: Admitted occurrences pass the filters
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn admitted_occurrences_pass_the_filters(
        start in arb_instant(),
        offset in 0i64..10_000_000,
        hours in arb_hours(),
    ) {
        let at = start + Duration::seconds(offset);
        let spec = timepiece::Section::from(RepeatAndFiltersSpec::new(
            repeat(start, None, vec![IntervalSpec::amount(1, Size::Hour)]),
            vec![hours_filter(&hours)],
        ));

        // An hourly repeat reaches every hour of the day within the step cap.
        let next = timepiece::next_admitted(&spec, at);
        prop_assert!(next.is_some());
        let next = next.unwrap();
        prop_assert!(next > at);
        prop_assert!(spec.is_filtered(next));
    }
}
