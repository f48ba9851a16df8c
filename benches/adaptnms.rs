use adaptnms::lowlevel::generate_workload;
use adaptnms::{
    AdaptiveNms, ConcurrentConfig, ConcurrentNms, DispatchConfig, SequentialNms, Suppressor,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;

const THRESHOLD: f32 = 0.7;
const SIZES: [usize; 4] = [300, 1000, 3000, 6000];

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("nms");
    let mut rng = StdRng::seed_from_u64(2160);

    let sequential = SequentialNms::new();
    let concurrent = ConcurrentNms::new();
    let concurrent_two = ConcurrentNms::new().with_config(ConcurrentConfig { workers: Some(2) });

    for size in SIZES {
        let (boxes, scores) = generate_workload(size, 4096, 2160, &mut rng);

        group.bench_with_input(BenchmarkId::new("sequential", size), &size, |b, _| {
            b.iter(|| black_box(sequential.suppress(&boxes, &scores, THRESHOLD).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("concurrent", size), &size, |b, _| {
            b.iter(|| black_box(concurrent.suppress(&boxes, &scores, THRESHOLD).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("concurrent_2", size), &size, |b, _| {
            b.iter(|| black_box(concurrent_two.suppress(&boxes, &scores, THRESHOLD).unwrap()));
        });

        #[cfg(feature = "rayon")]
        {
            let rayon = adaptnms::RayonNms::new();
            group.bench_with_input(BenchmarkId::new("rayon", size), &size, |b, _| {
                b.iter(|| black_box(rayon.suppress(&boxes, &scores, THRESHOLD).unwrap()));
            });
        }
    }
    group.finish();
}

fn bench_adaptive(c: &mut Criterion) {
    let max_boxes = *SIZES.last().unwrap_or(&1000);
    let mut adaptive = AdaptiveNms::new().with_config(DispatchConfig {
        sweep_step: max_boxes / 20,
        seed: Some(7),
        ..DispatchConfig::default()
    });
    adaptive.init(max_boxes).unwrap();

    let mut rng = StdRng::seed_from_u64(4096);
    let mut group = c.benchmark_group("adaptive");
    for size in SIZES {
        let (boxes, scores) = generate_workload(size, 4096, 2160, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(adaptive.suppress(&boxes, &scores, THRESHOLD).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_strategies, bench_adaptive);
criterion_main!(benches);
