use adaptnms::lowlevel::generate_workload;
use adaptnms::{BBox, ConcurrentConfig, ConcurrentNms, SequentialNms, Suppressor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn concurrent(workers: Option<usize>) -> ConcurrentNms {
    ConcurrentNms::new().with_config(ConcurrentConfig { workers })
}

#[test]
fn concurrent_matches_sequential_on_screen_workloads() {
    let mut rng = StdRng::seed_from_u64(2024);
    let sequential = SequentialNms::new();

    for &count in &[1usize, 2, 17, 300, 1200] {
        let (boxes, scores) = generate_workload(count, 4096, 2160, &mut rng);
        for &threshold in &[0.1f32, 0.5, 0.7, 0.95] {
            let expected = sequential.suppress(&boxes, &scores, threshold).unwrap();
            for workers in [None, Some(1), Some(3), Some(8)] {
                let out = concurrent(workers)
                    .suppress(&boxes, &scores, threshold)
                    .unwrap();
                assert_eq!(
                    out, expected,
                    "count = {count}, threshold = {threshold}, workers = {workers:?}"
                );
            }
        }
    }
}

#[test]
fn concurrent_matches_sequential_on_crowded_scene() {
    // Small screen: nearly every box overlaps several others, so long
    // suppression chains cross worker boundaries.
    let mut rng = StdRng::seed_from_u64(99);
    let (boxes, scores) = generate_workload(2000, 120, 80, &mut rng);
    let expected = SequentialNms::new().suppress(&boxes, &scores, 0.4).unwrap();
    for workers in 2..=6 {
        let out = concurrent(Some(workers))
            .suppress(&boxes, &scores, 0.4)
            .unwrap();
        assert_eq!(out, expected, "workers = {workers}");
    }
}

#[test]
fn concurrent_is_stable_across_repeated_runs() {
    let mut rng = StdRng::seed_from_u64(5);
    let (boxes, scores) = generate_workload(800, 400, 300, &mut rng);
    let nms = concurrent(Some(4));
    let first = nms.suppress(&boxes, &scores, 0.5).unwrap();
    for _ in 0..20 {
        assert_eq!(nms.suppress(&boxes, &scores, 0.5).unwrap(), first);
    }
}

#[test]
fn tied_scores_keep_input_order_in_every_strategy() {
    let mut rng = StdRng::seed_from_u64(42);
    let boxes: Vec<BBox> = (0..400)
        .map(|_| {
            let x = rng.random_range(0..200);
            let y = rng.random_range(0..200);
            BBox::new(x, x + rng.random_range(5..40), y, y + rng.random_range(5..40))
        })
        .collect();
    // Only four distinct scores.
    let scores: Vec<f32> = (0..400).map(|i| [0.2f32, 0.4, 0.6, 0.8][i % 4]).collect();

    let expected = SequentialNms::new().suppress(&boxes, &scores, 0.3).unwrap();
    let out = concurrent(Some(5)).suppress(&boxes, &scores, 0.3).unwrap();
    assert_eq!(out, expected);
}
