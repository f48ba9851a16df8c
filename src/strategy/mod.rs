//! Suppression strategies and the contract they share.
//!
//! Every strategy ranks its input with the same stable descending sort and
//! applies the same greedy rule, so for a fixed input all of them return the
//! same boxes in the same order. They differ only in how the work is spread
//! over cores, which is what the adaptive dispatcher measures.

use crate::candidate::Detection;
use crate::geometry::BBox;
use crate::util::NmsResult;

pub mod concurrent;
pub mod sequential;

#[cfg(feature = "rayon")]
pub mod rayon;

/// Surviving boxes and scores in descending score order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Suppressed {
    /// Retained boxes.
    pub boxes: Vec<BBox>,
    /// Scores of the retained boxes, index-aligned with `boxes`.
    pub scores: Vec<f32>,
}

impl Suppressed {
    /// Returns the number of retained detections.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Returns `true` when nothing was retained.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Iterates over retained detections in output order.
    pub fn iter(&self) -> impl Iterator<Item = Detection> + '_ {
        self.boxes
            .iter()
            .zip(self.scores.iter())
            .map(|(&bbox, &score)| Detection::new(bbox, score))
    }

    pub(crate) fn push(&mut self, detection: Detection) {
        self.boxes.push(detection.bbox);
        self.scores.push(detection.score);
    }
}

/// Contract implemented by every suppression strategy.
///
/// A GPU or other accelerated backend plugs into the dispatcher by
/// implementing this trait; `init` may fail, in which case the dispatcher
/// leaves the strategy out.
pub trait Suppressor: Send + Sync {
    /// Short stable name used in routing tables and logs.
    fn name(&self) -> &'static str;

    /// Prepares the strategy for inputs of up to `max_boxes` detections.
    fn init(&mut self, max_boxes: usize) -> NmsResult<()>;

    /// Removes every box whose IoU with a higher-ranked survivor is at least
    /// `threshold`, returning survivors in descending score order.
    ///
    /// Fails with [`NmsError::InputMismatch`](crate::NmsError::InputMismatch)
    /// when `boxes` and `scores` differ in length.
    fn suppress(&self, boxes: &[BBox], scores: &[f32], threshold: f32) -> NmsResult<Suppressed>;
}

pub use concurrent::{ConcurrentConfig, ConcurrentNms};
pub use sequential::SequentialNms;

#[cfg(feature = "rayon")]
pub use self::rayon::RayonNms;
