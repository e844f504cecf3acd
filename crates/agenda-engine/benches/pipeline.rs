use std::hint::black_box;

use agenda_engine::{
    expand_all, local_sort, Category, DayBucketer, EventDefinition, HolidayCalendar,
    HorizonPolicy, Palette, RepeatRule,
};
use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};

fn definitions(n: usize) -> Vec<EventDefinition> {
    let base = Utc.with_ymd_and_hms(2026, 2, 17, 2, 0, 0).unwrap();
    let rules = [
        RepeatRule::None,
        RepeatRule::Daily,
        RepeatRule::Weekly,
        RepeatRule::Monthly,
        RepeatRule::Yearly,
    ];
    (0..n)
        .map(|i| {
            let start = base + Duration::minutes((i as i64 * 37) % (14 * 24 * 60));
            EventDefinition::new(format!("event-{i}"), format!("Event {i}"), start, start + Duration::hours(1))
                .with_repeat(rules[i % rules.len()])
                .with_category(Category::ALL[i % Category::ALL.len()])
        })
        .collect()
}

fn bench_pipeline(c: &mut Criterion) {
    let tz = chrono_tz::Asia::Ho_Chi_Minh;
    let policy = HorizonPolicy::default();
    let holidays = HolidayCalendar::builtin();
    let palette = Palette::new();
    let now = Utc.with_ymd_and_hms(2026, 2, 17, 0, 0, 0).unwrap();
    let defs = definitions(500);

    c.bench_function("expand_500", |b| {
        b.iter(|| expand_all(black_box(&defs), &policy, tz))
    });

    let expanded = expand_all(&defs, &policy, tz);
    let bucketer = DayBucketer::new(now, tz, &holidays, &palette);
    c.bench_function("bucket_500", |b| b.iter(|| bucketer.bucket(black_box(&expanded))));

    let buckets = bucketer.bucket(&expanded);
    c.bench_function("local_sort_all", |b| b.iter(|| local_sort(black_box(&buckets.all))));
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
