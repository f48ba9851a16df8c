//! adaptnms removes overlapping detections from scored bounding boxes
//! (non-maximum suppression).
//!
//! Three CPU strategies share one contract and produce identical output: a
//! sequential reference, a lock-free concurrent variant that spreads the same
//! greedy walk over OS threads, and an optional rayon variant behind the
//! `rayon` feature. [`AdaptiveNms`] times the available strategies once at
//! startup and routes each call to the fastest one for its input size.

mod candidate;
pub mod dispatch;
pub mod geometry;
pub mod lowlevel;
pub mod strategy;
pub mod synth;
mod trace;
pub mod util;

pub use candidate::Detection;
pub use dispatch::{AdaptiveNms, DispatchConfig, RoutingTable};
pub use geometry::{iou, BBox};
pub use strategy::{ConcurrentConfig, ConcurrentNms, SequentialNms, Suppressed, Suppressor};
pub use util::{NmsError, NmsResult};

#[cfg(feature = "rayon")]
pub use strategy::RayonNms;
