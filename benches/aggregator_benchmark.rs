use criterion::{Criterion, black_box, criterion_group, criterion_main};
use run_reporter::{Aggregator, Event, JsonRenderer, LogLevel, ReporterConfig, SnapshotRenderer};

/// A run of `suites` root suites, each with two nested suites of ten tests
fn synthetic_run(suites: usize) -> Vec<Event> {
    let mut events = vec![Event::run_start((0..suites).map(|i| format!("spec-{}.js", i)))];
    for s in 0..suites {
        let root = format!("s{}", s);
        events.push(Event::suite_start(&root, &format!("Suite {}", s), None));
        for n in 0..2 {
            let nested = format!("{}-{}", root, n);
            events.push(Event::suite_start(&nested, "Nested", Some(&root)));
            for t in 0..10 {
                let id = format!("{}-t{}", nested, t);
                events.push(Event::test_start(&id, "does a thing", Some(&nested)));
                events.push(Event::log(LogLevel::Info, "step completed"));
                events.push(Event::screenshot(format!("shots/{}.png", id)));
                events.push(if t % 5 == 0 {
                    Event::test_fail(&id, 12, None)
                } else {
                    Event::test_pass(&id, 8)
                });
            }
            events.push(Event::suite_end(&nested));
        }
        events.push(Event::suite_end(&root));
    }
    events.push(Event::run_end());
    events
}

fn benchmark_aggregation(c: &mut Criterion) {
    let events = synthetic_run(50);

    c.bench_function("aggregate_1000_tests", |b| {
        b.iter(|| {
            let mut aggregator = Aggregator::new(ReporterConfig::defaults(), SnapshotRenderer);
            for event in events.iter().cloned() {
                aggregator.handle(black_box(event)).unwrap();
            }
            assert!(aggregator.is_finished());
        })
    });

    c.bench_function("aggregate_and_render_json", |b| {
        b.iter(|| {
            let renderer = JsonRenderer::new("bench").pretty(false);
            let mut aggregator = Aggregator::new(ReporterConfig::defaults(), renderer);
            for event in events.iter().cloned() {
                aggregator.handle(black_box(event)).unwrap();
            }
            black_box(aggregator.into_artifact().unwrap());
        })
    });
}

fn benchmark_title_resolution(c: &mut Criterion) {
    // Every suite shares a title, so each parent lookup falls back to the title index
    let mut events = Vec::new();
    for i in 0..500 {
        events.push(Event::suite_start(&format!("dup{}", i), "Shared", None));
        events.push(Event::test_start(&format!("t{}", i), "t", Some("Shared")));
    }

    c.bench_function("resolve_parents_by_title", |b| {
        b.iter(|| {
            let mut aggregator = Aggregator::new(ReporterConfig::defaults(), SnapshotRenderer);
            for event in events.iter().cloned() {
                aggregator.handle(black_box(event)).unwrap();
            }
        })
    });
}

criterion_group!(benches, benchmark_aggregation, benchmark_title_resolution);
criterion_main!(benches);
