//! Rayon-parallel strategy (feature-gated).
//!
//! The rank walk stays sequential; only the suppression scan behind each
//! survivor is split across the rayon pool. Each scan touches disjoint flags,
//! so the output matches the sequential strategy without any atomics.

use crate::candidate::ranked_detections;
use crate::geometry::{iou, BBox};
use crate::strategy::{Suppressed, Suppressor};
use crate::trace::{trace_event, trace_span};
use crate::util::{check_lengths, NmsResult};
use rayon::prelude::*;

/// Smallest slice of the tail scan handed to one rayon task.
const MIN_CHUNK: usize = 256;

/// Greedy NMS with the per-survivor scan on the rayon pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct RayonNms;

impl RayonNms {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }
}

impl Suppressor for RayonNms {
    fn name(&self) -> &'static str {
        "rayon"
    }

    fn init(&mut self, _max_boxes: usize) -> NmsResult<()> {
        Ok(())
    }

    fn suppress(&self, boxes: &[BBox], scores: &[f32], threshold: f32) -> NmsResult<Suppressed> {
        check_lengths(boxes.len(), scores.len())?;
        let _span = trace_span!("rayon_nms", boxes = boxes.len()).entered();

        let records = ranked_detections(boxes, scores);
        let size = records.len();
        let mut removed = vec![false; size];
        let mut out = Suppressed::default();

        for i in 0..size {
            if removed[i] {
                continue;
            }
            let record = records[i];
            out.push(record);

            let bbox = record.bbox;
            removed[i + 1..]
                .par_iter_mut()
                .zip(records[i + 1..].par_iter())
                .with_min_len(MIN_CHUNK)
                .for_each(|(flag, other)| {
                    if !*flag && iou(&bbox, &other.bbox) >= threshold {
                        *flag = true;
                    }
                });
        }

        trace_event!("rayon_nms_kept", kept = out.len());
        Ok(out)
    }
}
