//! Experiment overhead benchmarks
//!
//! Measures what `conduct()` adds on top of running the cases themselves:
//! observation bookkeeping, execution-order shuffling, comparison, and
//! publishing.
//!
//! Run with: cargo bench --bench conduct_overhead

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use crucible::{Experiment, ExperimentConfig};

const CANDIDATE_COUNTS: [usize; 3] = [0, 4, 64];

fn work(n: u64) -> u64 {
    (0..n).fold(0, |acc, x| acc.wrapping_mul(31).wrapping_add(x))
}

/// Benchmark a direct call against a disabled and an enabled experiment
fn bench_single_candidate(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_candidate");

    group.bench_function("direct_call", |b| b.iter(|| work(black_box(64))));

    group.bench_function("disabled", |b| {
        b.iter(|| {
            let mut experiment: Experiment<'_, u64> =
                Experiment::new("bench").enabled_when(|| false);
            experiment.control(|| Ok(work(black_box(64)))).unwrap();
            experiment.candidate(|| Ok(work(black_box(64))));
            experiment.conduct().unwrap()
        });
    });

    group.bench_function("enabled", |b| {
        b.iter(|| {
            let mut experiment: Experiment<'_, u64> = Experiment::new("bench");
            experiment.control(|| Ok(work(black_box(64)))).unwrap();
            experiment.candidate(|| Ok(work(black_box(64))));
            experiment.conduct().unwrap()
        });
    });

    group.finish();
}

/// Benchmark conduct() as the number of candidates grows
fn bench_candidate_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("candidate_fanout");

    for &count in &CANDIDATE_COUNTS {
        for (label, randomize) in [("ordered", false), ("shuffled", true)] {
            group.bench_with_input(BenchmarkId::new(label, count), &count, |b, &count| {
                b.iter(|| {
                    let config = ExperimentConfig::new("fanout").randomize(randomize);
                    let mut experiment: Experiment<'_, u64> = Experiment::from_config(config);
                    experiment.control(|| Ok(black_box(7))).unwrap();
                    for _ in 0..count {
                        experiment.candidate(|| Ok(black_box(7)));
                    }
                    experiment.conduct().unwrap()
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_single_candidate, bench_candidate_fanout);
criterion_main!(benches);
