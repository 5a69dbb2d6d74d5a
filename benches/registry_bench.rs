use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rate_watch::measure::LatencyMeasurer;
use rate_watch::{
    AlertEvaluator, BoundedWindow, CollectingSink, Detection, Detector, Reading, Registry, Stage,
    WINDOW_CAPACITY,
};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

const PAIRS: [&str; 8] = [
    "CNYAUD", "USDAUD", "EURUSD", "GBPJPY", "USDCHF", "NZDUSD", "AUDJPY", "EURGBP",
];

fn bench_window_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("window");
    group.throughput(Throughput::Elements(1));

    let mut window = BoundedWindow::new("CNYAUD", WINDOW_CAPACITY);
    let mut measurer = LatencyMeasurer::new(1000);
    group.bench_function("insert", |b| {
        let mut ts = 0.0;
        b.iter(|| {
            let _latency_guard = measurer.measure_with_guard();
            window.insert(black_box(0.59281), ts);
            ts += 1.0;
        });
    });
    println!("insert latency:{}", measurer.format_stats());

    group.finish();
}

fn bench_registry_route(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    group.throughput(Throughput::Elements(1));

    let sink = Arc::new(CollectingSink::new());
    let mut registry =
        Registry::default().with_subscriber(Arc::new(AlertEvaluator::new(sink.clone())));
    group.bench_function("route_8_keys", |b| {
        let mut i = 0usize;
        b.iter(|| {
            let pair = PAIRS[i % PAIRS.len()];
            let rate = 1.0 + (i % 7) as f64 * 0.001;
            black_box(registry.route(Reading::new(pair, rate, i as f64)));
            i += 1;
        });
    });

    let mut detector = Detector::default();
    let record = json!({"timestamp": 1554933784.023, "currencyPair": "CNYAUD", "rate": 0.59281});
    group.bench_function("detect_record", |b| {
        b.iter(|| {
            detector.process(black_box(record.clone()), &mut |d: Detection| {
                black_box(d);
            });
        });
    });

    group.finish();
}

criterion_group!(benches, bench_window_insert, bench_registry_route);
criterion_main!(benches);
