//! Lock-free multi-threaded strategy.
//!
//! Ranked detections are dealt round-robin to `W` workers: worker `k` owns
//! indices `k, k + W, k + 2W, ...`. Each worker publishes a cursor holding the
//! next index it owns. A published cursor `c` means the worker has finished
//! every write it will ever make to indices below `c`, because all of its
//! later scans start above `c`.
//!
//! A worker may only read the fate of its index `i` once every cursor is at
//! least `i`. Cursors of other workers are never equal to `i` (they live in
//! other residue classes), so at that point every higher-ranked detection
//! that could suppress `i` has already done so. The decision for `i` is
//! therefore the same one the sequential walk would make.
//!
//! A worker publishes `i + W` as soon as its scan from `i` passes `i + W - 1`,
//! which lets the other workers move on while it finishes the tail of the
//! scan. The worker with the smallest cursor never waits, so the pool always
//! makes progress.

use crate::candidate::{ranked_detections, Detection};
use crate::geometry::{iou, BBox};
use crate::strategy::{Suppressed, Suppressor};
use crate::trace::{trace_event, trace_span};
use crate::util::{check_lengths, NmsError, NmsResult};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

/// Busy-polls before the waiting worker starts yielding its time slice.
const SPINS_BEFORE_YIELD: u32 = 128;

/// Configuration for [`ConcurrentNms`].
#[derive(Clone, Debug, Default)]
pub struct ConcurrentConfig {
    /// Worker thread count; `None` uses the available hardware parallelism.
    pub workers: Option<usize>,
}

/// Greedy NMS spread over a per-call pool of OS threads.
///
/// Produces exactly the output of [`SequentialNms`](super::SequentialNms)
/// for every input, independent of scheduling.
#[derive(Clone, Debug, Default)]
pub struct ConcurrentNms {
    cfg: ConcurrentConfig,
}

#[repr(align(64))]
struct Cursor(AtomicUsize);

struct Shared<'a> {
    records: &'a [Detection],
    removed: &'a [AtomicBool],
    cursors: &'a [Cursor],
    abort: &'a AtomicBool,
    threshold: f32,
}

impl ConcurrentNms {
    /// Creates the strategy with one worker per available core.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: ConcurrentConfig) -> Self {
        self.cfg = cfg;
        self
    }

    fn configured_workers(&self) -> NmsResult<usize> {
        match self.cfg.workers {
            Some(0) => Err(NmsError::InvalidInput("worker count must be at least 1")),
            Some(workers) => Ok(workers),
            None => Ok(thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)),
        }
    }
}

impl Suppressor for ConcurrentNms {
    fn name(&self) -> &'static str {
        "concurrent"
    }

    fn init(&mut self, _max_boxes: usize) -> NmsResult<()> {
        self.configured_workers().map(|_| ())
    }

    fn suppress(&self, boxes: &[BBox], scores: &[f32], threshold: f32) -> NmsResult<Suppressed> {
        check_lengths(boxes.len(), scores.len())?;
        let workers = self.configured_workers()?;

        let records = ranked_detections(boxes, scores);
        let size = records.len();
        if size == 0 {
            return Ok(Suppressed::default());
        }
        let workers = workers.min(size);
        let _span = trace_span!("concurrent_nms", boxes = size, workers = workers).entered();

        let removed: Vec<AtomicBool> = (0..size).map(|_| AtomicBool::new(false)).collect();
        let cursors: Vec<Cursor> = (0..workers).map(|k| Cursor(AtomicUsize::new(k))).collect();
        let abort = AtomicBool::new(false);
        let shared = Shared {
            records: &records,
            removed: &removed,
            cursors: &cursors,
            abort: &abort,
            threshold,
        };

        thread::scope(|scope| -> NmsResult<()> {
            for worker in 0..workers {
                let shared = &shared;
                let spawned = thread::Builder::new()
                    .name(format!("nms-worker-{worker}"))
                    .spawn_scoped(scope, move || run_worker(shared, worker));
                if let Err(err) = spawned {
                    // Workers already running would otherwise wait forever on
                    // the cursor of the worker that never started.
                    shared.abort.store(true, Ordering::Release);
                    return Err(NmsError::WorkerSpawn {
                        reason: err.to_string(),
                    });
                }
            }
            Ok(())
        })?;

        let mut out = Suppressed::default();
        for (record, flag) in records.iter().zip(removed.iter()) {
            if !flag.load(Ordering::Acquire) {
                out.push(*record);
            }
        }

        trace_event!("concurrent_nms_kept", kept = out.len());
        Ok(out)
    }
}

fn run_worker(shared: &Shared<'_>, worker: usize) {
    let size = shared.records.len();
    let stride = shared.cursors.len();
    let cursor = &shared.cursors[worker].0;

    loop {
        // Only this worker stores to its own cursor.
        let i = cursor.load(Ordering::Relaxed);
        if i >= size {
            return;
        }
        if !wait_for_cursors(shared, i) {
            return;
        }

        let next = i.saturating_add(stride);
        let mut published = false;
        if !shared.removed[i].load(Ordering::Acquire) {
            let bbox = shared.records[i].bbox;
            for j in (i + 1)..size {
                if j == next {
                    cursor.store(next, Ordering::Release);
                    published = true;
                }
                if shared.removed[j].load(Ordering::Acquire) {
                    continue;
                }
                if iou(&bbox, &shared.records[j].bbox) >= shared.threshold {
                    shared.removed[j].store(true, Ordering::Release);
                }
            }
        }

        if !published {
            cursor.store(next, Ordering::Release);
        }
    }
}

/// Spins until every cursor has reached `index`; returns `false` on abort.
fn wait_for_cursors(shared: &Shared<'_>, index: usize) -> bool {
    let mut spins = 0u32;
    loop {
        if shared
            .cursors
            .iter()
            .all(|c| c.0.load(Ordering::Acquire) >= index)
        {
            return true;
        }
        if shared.abort.load(Ordering::Acquire) {
            return false;
        }
        if spins < SPINS_BEFORE_YIELD {
            spins += 1;
            std::hint::spin_loop();
        } else {
            thread::yield_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConcurrentConfig, ConcurrentNms};
    use crate::geometry::BBox;
    use crate::strategy::{SequentialNms, Suppressor};
    use crate::synth::generate_workload;
    use crate::NmsError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn with_workers(workers: usize) -> ConcurrentNms {
        ConcurrentNms::new().with_config(ConcurrentConfig {
            workers: Some(workers),
        })
    }

    #[test]
    fn every_worker_count_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(7);
        let (boxes, scores) = generate_workload(400, 256, 256, &mut rng);
        let expected = SequentialNms::new().suppress(&boxes, &scores, 0.3).unwrap();

        for workers in 1..=8 {
            let out = with_workers(workers)
                .suppress(&boxes, &scores, 0.3)
                .unwrap();
            assert_eq!(out, expected, "workers = {workers}");
        }
    }

    #[test]
    fn more_workers_than_boxes() {
        let boxes = [BBox::new(0, 10, 0, 10), BBox::new(1, 11, 0, 10)];
        let scores = [0.4f32, 0.6];
        let out = with_workers(16).suppress(&boxes, &scores, 0.5).unwrap();
        assert_eq!(out.boxes, vec![boxes[1]]);
        assert_eq!(out.scores, vec![0.6]);
    }

    #[test]
    fn chained_suppression_respects_rank() {
        // b suppresses c only if b survives; a suppresses b, so c must survive.
        let a = BBox::new(0, 9, 0, 9);
        let b = BBox::new(2, 11, 0, 9);
        let c = BBox::new(4, 13, 0, 9);
        let boxes = [c, b, a];
        let scores = [0.7f32, 0.8, 0.9];
        let expected = SequentialNms::new().suppress(&boxes, &scores, 0.6).unwrap();
        assert_eq!(expected.boxes, vec![a, c]);

        for workers in 1..=3 {
            let out = with_workers(workers)
                .suppress(&boxes, &scores, 0.6)
                .unwrap();
            assert_eq!(out, expected, "workers = {workers}");
        }
    }

    #[test]
    fn zero_workers_is_rejected() {
        let mut nms = with_workers(0);
        assert_eq!(
            nms.init(100).unwrap_err(),
            NmsError::InvalidInput("worker count must be at least 1")
        );
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = ConcurrentNms::new()
            .suppress(&[], &[0.5], 0.5)
            .unwrap_err();
        assert_eq!(
            err,
            NmsError::InputMismatch {
                boxes: 0,
                scores: 1
            }
        );
    }
}
