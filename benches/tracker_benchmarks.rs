//! Tracker benchmarks using Criterion.
//!
//! Run with: cargo bench

use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use people_counter::bbox::iou_matrix;
use people_counter::{BoundingBox, Detection, MatchingStrategy, Tracker, TrackerConfig};

/// People on a grid, spaced so no two overlap.
fn create_test_detections(n: usize, jitter: f64) -> Vec<Detection> {
    (0..n)
        .map(|i| {
            let x = (i % 10) as f64 * 100.0 + jitter;
            let y = (i / 10) as f64 * 200.0;
            Detection::person([x, y, 50.0, 150.0], 0.9).expect("valid detection")
        })
        .collect()
}

fn benchmark_tracker_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker_update");

    for strategy in [MatchingStrategy::FirstMatch, MatchingStrategy::Optimal] {
        for n in [10usize, 50, 100] {
            let config = TrackerConfig::default().with_matching(strategy);
            let mut tracker = Tracker::new(config).expect("valid tracker");
            let frames = [create_test_detections(n, 0.0), create_test_detections(n, 2.0)];
            let t0 = Instant::now();
            let mut tick = 0u64;

            group.bench_with_input(BenchmarkId::new(strategy.as_str(), n), &frames, |b, frames| {
                b.iter(|| {
                    tick += 1;
                    let now = t0 + Duration::from_millis(tick * 100);
                    tracker.update(black_box(&frames[(tick % 2) as usize]), now)
                })
            });
        }
    }

    group.finish();
}

fn benchmark_iou_matrix(c: &mut Criterion) {
    let boxes: Vec<BoundingBox> = create_test_detections(100, 0.0).iter().map(|d| d.bbox).collect();

    c.bench_function("iou_matrix_100x100", |b| {
        b.iter(|| iou_matrix(black_box(&boxes), black_box(&boxes)))
    });
}

fn benchmark_find_match(c: &mut Criterion) {
    let mut tracker = Tracker::default();
    tracker.update(&create_test_detections(100, 0.0), Instant::now());
    let probe = BoundingBox::new(902.0, 1800.0, 50.0, 150.0);

    c.bench_function("find_match_100_identities", |b| {
        b.iter(|| tracker.find_match(black_box(&probe)).map(|identity| identity.id()))
    });
}

criterion_group!(
    benches,
    benchmark_tracker_update,
    benchmark_iou_matrix,
    benchmark_find_match,
);
criterion_main!(benches);
