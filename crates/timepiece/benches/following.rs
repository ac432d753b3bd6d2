//! Benchmarks for next-occurrence search.
//!
//! Run with: cargo bench -p timepiece

use std::hint::black_box;

use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use timepiece::{Clock, Timepiece};

fn bench_following(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    let timepiece = Timepiece::new().with_clock(Clock::Fixed(start)).with_seed(7);
    let mut group = c.benchmark_group("following");

    let cases = [
        ("every_second", "between(start: now()) & interval(every: amount(num: 1, size: second))"),
        ("every_month", "between(start: now()) & interval(every: amount(num: 1, size: month))"),
        (
            "three_intervals",
            "between(start: now()) & (interval(every: amount(num: 7, size: second)) \
             | interval(every: amount(num: 11, size: minute)) \
             | interval(every: iso8601(type: duration, specification: P1DT1H)))",
        ),
    ];

    for (name, text) in cases {
        let spec = timepiece.time_spec_to_object(text, true).unwrap();
        for years in [1i64, 25] {
            let at = start + Duration::days(365 * years);
            group.bench_with_input(BenchmarkId::new(name, years), &at, |b, at| {
                b.iter(|| black_box(spec.following(black_box(*at))));
            });
        }
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let text = "(repeat(start: date(year: 2020, month: 1, day: 1)) | now()) \
                & filter(hours: 9;10;11, day_names: mon;wed;fri)";
    let timepiece = Timepiece::new().with_seed(7);
    c.bench_function("time_spec_to_object", |b| {
        b.iter(|| black_box(timepiece.time_spec_to_object(black_box(text), true)))
    });
}

criterion_group!(benches, bench_following, bench_parse);
criterion_main!(benches);
