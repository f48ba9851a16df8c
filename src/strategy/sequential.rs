//! Single-threaded reference strategy.

use crate::candidate::ranked_detections;
use crate::geometry::{iou, BBox};
use crate::strategy::{Suppressed, Suppressor};
use crate::trace::{trace_event, trace_span};
use crate::util::{check_lengths, NmsResult};

/// Greedy NMS on one thread.
///
/// Walks the ranked detections once; each survivor suppresses every later,
/// still-live detection it overlaps at or above the threshold. O(n²) IoU
/// evaluations in the worst case. This is the baseline the other strategies
/// are checked against.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialNms;

impl SequentialNms {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }
}

impl Suppressor for SequentialNms {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn init(&mut self, _max_boxes: usize) -> NmsResult<()> {
        Ok(())
    }

    fn suppress(&self, boxes: &[BBox], scores: &[f32], threshold: f32) -> NmsResult<Suppressed> {
        check_lengths(boxes.len(), scores.len())?;
        let _span = trace_span!("sequential_nms", boxes = boxes.len()).entered();

        let records = ranked_detections(boxes, scores);
        let size = records.len();
        let mut removed = vec![false; size];
        let mut out = Suppressed::default();

        let mut i = 0usize;
        while i < size {
            let record = records[i];
            out.push(record);
            removed[i] = true;

            for j in (i + 1)..size {
                if removed[j] {
                    continue;
                }
                if iou(&record.bbox, &records[j].bbox) >= threshold {
                    removed[j] = true;
                }
            }

            while i < size && removed[i] {
                i += 1;
            }
        }

        trace_event!("sequential_nms_kept", kept = out.len());
        Ok(out)
    }
}
