//! Building blocks for custom strategies and calibration harnesses.
//!
//! Most users only need [`AdaptiveNms`](crate::AdaptiveNms) or one of the
//! strategy types re-exported at the crate root.

pub use crate::dispatch::{default_strategies, Breakpoint, MIN_MAX_BOXES};
pub use crate::geometry::area;
pub use crate::synth::{
    generate_workload, BoxGenerator, DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH,
};
