//! Synthetic detection workloads for calibration, tests and benchmarks.

use crate::geometry::BBox;
use crate::util::{NmsError, NmsResult};
use rand::Rng;

/// Default screen width used for calibration workloads.
pub const DEFAULT_SCREEN_WIDTH: i32 = 4096;
/// Default screen height used for calibration workloads.
pub const DEFAULT_SCREEN_HEIGHT: i32 = 2160;

/// Draws boxes whose edges are uniform over a screen extent.
#[derive(Clone, Copy, Debug)]
pub struct BoxGenerator {
    width: i32,
    height: i32,
}

impl BoxGenerator {
    /// Creates a generator for a `width x height` screen.
    pub fn new(width: i32, height: i32) -> NmsResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(NmsError::InvalidInput("screen extent must be positive"));
        }
        Ok(Self { width, height })
    }

    /// Draws one box; both corners are uniform, so the box is too.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> BBox {
        let x1 = rng.random_range(0..self.width);
        let x2 = rng.random_range(0..self.width);
        let y1 = rng.random_range(0..self.height);
        let y2 = rng.random_range(0..self.height);
        BBox::new(x1, x2, y1, y2)
    }

    /// Generates `count` boxes together with uniform scores in `[0, 1)`.
    pub fn workload<R: Rng>(&self, count: usize, rng: &mut R) -> (Vec<BBox>, Vec<f32>) {
        let mut boxes = Vec::with_capacity(count);
        let mut scores = Vec::with_capacity(count);
        for _ in 0..count {
            boxes.push(self.generate(rng));
            scores.push(rng.random::<f32>());
        }
        (boxes, scores)
    }
}

impl Default for BoxGenerator {
    fn default() -> Self {
        Self {
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
        }
    }
}

/// Generates `count` boxes on a `width x height` screen with scores in `[0, 1)`.
///
/// Non-positive extents are clamped to one pixel.
pub fn generate_workload<R: Rng>(
    count: usize,
    width: i32,
    height: i32,
    rng: &mut R,
) -> (Vec<BBox>, Vec<f32>) {
    let generator = BoxGenerator {
        width: width.max(1),
        height: height.max(1),
    };
    generator.workload(count, rng)
}
