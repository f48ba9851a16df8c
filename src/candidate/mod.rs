//! Scored detections and the rank order every strategy shares.

use crate::geometry::BBox;
use std::cmp::Ordering;

/// A bounding box paired with its confidence score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Box geometry.
    pub bbox: BBox,
    /// Confidence score; higher ranks first.
    pub score: f32,
}

impl Detection {
    /// Creates a detection.
    pub fn new(bbox: BBox, score: f32) -> Self {
        Self { bbox, score }
    }
}

fn detection_cmp_desc(a: &Detection, b: &Detection) -> Ordering {
    b.score.total_cmp(&a.score)
}

/// Pairs up boxes and scores and sorts them by descending score.
///
/// The sort is stable, so equal scores keep their input order. Every strategy
/// ranks through this function, which is what makes their outputs comparable
/// element by element. Lengths are checked by the caller.
pub(crate) fn ranked_detections(boxes: &[BBox], scores: &[f32]) -> Vec<Detection> {
    let mut detections: Vec<Detection> = boxes
        .iter()
        .zip(scores.iter())
        .map(|(&bbox, &score)| Detection::new(bbox, score))
        .collect();
    detections.sort_by(detection_cmp_desc);
    detections
}
