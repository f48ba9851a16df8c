//! Self-calibrating dispatcher over several suppression strategies.
//!
//! `init` times every available strategy on synthetic workloads for a sweep of
//! sizes and records the fastest one per size in a [`RoutingTable`]. Later
//! calls look the input size up in that table and never measure again.
//! The table belongs to the dispatcher instance; independent instances
//! calibrate independently.

mod table;

pub use table::{Breakpoint, RoutingTable};

use crate::geometry::BBox;
use crate::strategy::{ConcurrentNms, SequentialNms, Suppressed, Suppressor};
use crate::synth::{BoxGenerator, DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{check_lengths, NmsError, NmsResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

/// Smallest `max_boxes` the dispatcher agrees to calibrate for.
pub const MIN_MAX_BOXES: usize = 100;

/// Calibration settings for [`AdaptiveNms`].
#[derive(Clone, Debug)]
pub struct DispatchConfig {
    /// Smallest accepted `max_boxes` for `init`.
    pub min_max_boxes: usize,
    /// The sweep starts at `max_boxes / sweep_divisor`.
    pub sweep_divisor: usize,
    /// Distance between swept sizes; `1` benchmarks every size.
    pub sweep_step: usize,
    /// IoU threshold used for calibration runs.
    pub calibration_threshold: f32,
    /// Seed for calibration workloads; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Screen width for calibration boxes.
    pub screen_width: i32,
    /// Screen height for calibration boxes.
    pub screen_height: i32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            min_max_boxes: MIN_MAX_BOXES,
            sweep_divisor: 10,
            sweep_step: 1,
            calibration_threshold: 0.7,
            seed: None,
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
        }
    }
}

/// Strategies the dispatcher calibrates when none are supplied.
pub fn default_strategies() -> Vec<Box<dyn Suppressor>> {
    #[allow(unused_mut)]
    let mut strategies: Vec<Box<dyn Suppressor>> =
        vec![Box::new(SequentialNms::new()), Box::new(ConcurrentNms::new())];
    #[cfg(feature = "rayon")]
    strategies.push(Box::new(crate::strategy::RayonNms::new()));
    strategies
}

/// Routes each call to the strategy that was fastest for its size.
pub struct AdaptiveNms {
    cfg: DispatchConfig,
    strategies: Vec<Box<dyn Suppressor>>,
    unavailable: Vec<NmsError>,
    table: Option<RoutingTable>,
    max_boxes: usize,
}

impl AdaptiveNms {
    /// Creates an uninitialized dispatcher over the built-in strategies.
    pub fn new() -> Self {
        Self::with_strategies(default_strategies())
    }

    /// Creates an uninitialized dispatcher over `strategies`, in priority
    /// order: on equal timings the earlier strategy wins.
    pub fn with_strategies(strategies: Vec<Box<dyn Suppressor>>) -> Self {
        Self {
            cfg: DispatchConfig::default(),
            strategies,
            unavailable: Vec::new(),
            table: None,
            max_boxes: 0,
        }
    }

    /// Replaces the calibration settings.
    pub fn with_config(mut self, cfg: DispatchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Appends a candidate strategy, e.g. a GPU backend.
    ///
    /// Any existing calibration is discarded.
    pub fn with_strategy(mut self, strategy: Box<dyn Suppressor>) -> Self {
        self.strategies.push(strategy);
        self.reset();
        self
    }

    /// Returns the names of all candidate strategies, in table index order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Returns the strategies left out by the last `init`.
    pub fn unavailable(&self) -> &[NmsError] {
        &self.unavailable
    }

    /// Returns the routing table once calibrated.
    pub fn routing_table(&self) -> Option<&RoutingTable> {
        self.table.as_ref()
    }

    /// Returns the maximum size the table was built for, or `0`.
    pub fn max_boxes(&self) -> usize {
        self.max_boxes
    }

    /// Returns `true` after a successful `init`.
    pub fn is_initialized(&self) -> bool {
        self.table.is_some()
    }

    /// Returns the name of the strategy that would serve `size` boxes.
    pub fn strategy_for(&self, size: usize) -> Option<&'static str> {
        let table = self.table.as_ref()?;
        self.strategies
            .get(table.lookup(size))
            .map(|strategy| strategy.name())
    }

    fn reset(&mut self) {
        self.table = None;
        self.max_boxes = 0;
    }

    /// Initializes every strategy and calibrates the routing table.
    ///
    /// Strategies whose `init` fails are left out and reported through
    /// [`unavailable`](Self::unavailable). Fails when `max_boxes` is below
    /// the configured minimum or when no strategy is left. On failure the
    /// dispatcher stays uninitialized.
    pub fn init(&mut self, max_boxes: usize) -> NmsResult<()> {
        self.reset();
        self.unavailable.clear();

        if self.cfg.sweep_divisor == 0 {
            return Err(NmsError::InvalidInput("sweep divisor must be at least 1"));
        }
        if self.cfg.sweep_step == 0 {
            return Err(NmsError::InvalidInput("sweep step must be at least 1"));
        }
        if max_boxes < self.cfg.min_max_boxes {
            return Err(NmsError::InitializationTooSmall {
                requested: max_boxes,
                minimum: self.cfg.min_max_boxes,
            });
        }
        let generator = BoxGenerator::new(self.cfg.screen_width, self.cfg.screen_height)?;

        let _span = trace_span!("calibrate", max_boxes = max_boxes).entered();

        let mut available = Vec::with_capacity(self.strategies.len());
        for (idx, strategy) in self.strategies.iter_mut().enumerate() {
            match strategy.init(max_boxes) {
                Ok(()) => available.push(idx),
                Err(err) => {
                    let name = strategy.name();
                    let reason = err.to_string();
                    trace_warn!("strategy_unavailable", strategy = name, reason = reason.as_str());
                    self.unavailable
                        .push(NmsError::StrategyUnavailable { name, reason });
                }
            }
        }
        if available.is_empty() {
            trace_warn!("no_strategy_available");
            return Err(NmsError::NoStrategyAvailable);
        }

        let mut rng = match self.cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let start = (max_boxes / self.cfg.sweep_divisor).max(1);
        let capacity = max_boxes.saturating_sub(start) / self.cfg.sweep_step + 1;
        let mut samples = Vec::with_capacity(capacity);
        let mut size = start;
        while size <= max_boxes {
            let (boxes, scores) = generator.workload(size, &mut rng);
            let timings = self.time_available(&mut available, &boxes, &scores)?;
            samples.push((size, timings));
            size += self.cfg.sweep_step;
        }

        // Winners are picked only after the sweep, so a strategy that failed
        // at a larger size never keeps the breakpoints it won before failing.
        let pairs = samples
            .into_iter()
            .map(|(size, timings)| {
                fastest_of(&timings, &available)
                    .map(|winner| (size, winner))
                    .ok_or(NmsError::NoStrategyAvailable)
            })
            .collect::<NmsResult<Vec<_>>>()?;

        let table = RoutingTable::from_breakpoints(pairs)?;
        trace_event!(
            "routing_table",
            breakpoints = table.len(),
            ranges = table.ranges().len()
        );
        self.table = Some(table);
        self.max_boxes = max_boxes;
        Ok(())
    }

    /// Times each strategy in `available` once, in candidate order.
    ///
    /// A strategy that errors is removed from `available` and recorded as
    /// unavailable; fails only when no strategy is left.
    fn time_available(
        &mut self,
        available: &mut Vec<usize>,
        boxes: &[BBox],
        scores: &[f32],
    ) -> NmsResult<Vec<(usize, Duration)>> {
        let threshold = self.cfg.calibration_threshold;
        let mut timings = Vec::with_capacity(available.len());
        let mut last_err = None;

        let mut pos = 0;
        while pos < available.len() {
            let idx = available[pos];
            let strategy = &self.strategies[idx];
            let started = Instant::now();
            match strategy.suppress(boxes, scores, threshold) {
                Ok(_) => {
                    timings.push((idx, started.elapsed()));
                    pos += 1;
                }
                Err(err) => {
                    let name = strategy.name();
                    let reason = err.to_string();
                    trace_warn!("strategy_failed", strategy = name, reason = reason.as_str());
                    self.unavailable
                        .push(NmsError::StrategyUnavailable { name, reason });
                    available.remove(pos);
                    last_err = Some(err);
                }
            }
        }

        if timings.is_empty() {
            return Err(last_err.unwrap_or(NmsError::NoStrategyAvailable));
        }
        Ok(timings)
    }

    /// Suppresses with the strategy calibrated for `boxes.len()`.
    ///
    /// Fails on mismatched lengths, before `init`, or when the input is
    /// larger than the size passed to `init`. Empty input succeeds without
    /// touching any strategy.
    pub fn suppress(&self, boxes: &[BBox], scores: &[f32], threshold: f32) -> NmsResult<Suppressed> {
        check_lengths(boxes.len(), scores.len())?;
        let table = self.table.as_ref().ok_or(NmsError::NotInitialized)?;
        let size = boxes.len();
        if size > self.max_boxes {
            return Err(NmsError::SizeExceeded {
                size,
                max: self.max_boxes,
            });
        }
        if size == 0 {
            trace_event!("empty_input");
            return Ok(Suppressed::default());
        }

        let strategy = &self.strategies[table.lookup(size)];
        trace_event!("dispatch", boxes = size, strategy = strategy.name());
        strategy.suppress(boxes, scores, threshold)
    }
}

/// Returns the fastest timed strategy that is still in `available`; ties go
/// to the earlier candidate.
fn fastest_of(timings: &[(usize, Duration)], available: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, Duration)> = None;
    for &(idx, elapsed) in timings {
        if !available.contains(&idx) {
            continue;
        }
        if best.map_or(true, |(_, time)| elapsed < time) {
            best = Some((idx, elapsed));
        }
    }
    best.map(|(idx, _)| idx)
}

impl Default for AdaptiveNms {
    fn default() -> Self {
        Self::new()
    }
}

impl Suppressor for AdaptiveNms {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn init(&mut self, max_boxes: usize) -> NmsResult<()> {
        AdaptiveNms::init(self, max_boxes)
    }

    fn suppress(&self, boxes: &[BBox], scores: &[f32], threshold: f32) -> NmsResult<Suppressed> {
        AdaptiveNms::suppress(self, boxes, scores, threshold)
    }
}
