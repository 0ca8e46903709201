//! Micro-benchmarks for weighted task selection
//!
//! Every simulated client calls `TaskProfile::select` once per task, so this
//! sits on the hot path of every run:
//! - Selection from the four-channel profile
//! - Selection from larger synthetic profiles
//!
//! Run with: cargo bench --bench task_selection

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use frodo_loadgen::{Task, TaskProfile};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Build a profile with `count` tasks and weights cycling 1..=8
fn synthetic_profile(count: usize) -> TaskProfile {
    let tasks = (0..count)
        .map(|i| Task::new(format!("task_{}", i), format!("/bench/{}", i), (i % 8) as u32 + 1))
        .collect();
    TaskProfile::new("bench", tasks).unwrap()
}

fn bench_channel_selection(c: &mut Criterion) {
    let profile = TaskProfile::channels();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let mut group = c.benchmark_group("channel_selection");
    group.throughput(Throughput::Elements(1));
    group.bench_function("select", |b| {
        b.iter(|| black_box(profile.select(&mut rng)));
    });
    group.finish();
}

fn bench_profile_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("profile_size");

    for count in [4, 64, 1024] {
        let profile = synthetic_profile(count);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(count), &profile, |b, profile| {
            b.iter(|| black_box(profile.select(&mut rng)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_channel_selection, bench_profile_size);
criterion_main!(benches);
