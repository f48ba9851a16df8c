use adaptnms::lowlevel::BoxGenerator;
use adaptnms::{
    AdaptiveNms, ConcurrentConfig, ConcurrentNms, DispatchConfig, SequentialNms, Suppressed,
    Suppressor,
};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "adaptnms benchmark harness (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file; built-in defaults when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for calibration and dispatch.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ScreenJson {
    width: i32,
    height: i32,
}

impl Default for ScreenJson {
    fn default() -> Self {
        let cfg = DispatchConfig::default();
        Self {
            width: cfg.screen_width,
            height: cfg.screen_height,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DispatchJson {
    max_size: usize,
    sweep_divisor: usize,
    sweep_step: usize,
}

impl Default for DispatchJson {
    fn default() -> Self {
        let cfg = DispatchConfig::default();
        Self {
            max_size: 3000,
            sweep_divisor: cfg.sweep_divisor,
            sweep_step: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    box_count: usize,
    threshold: f32,
    seed: Option<u64>,
    workers: Option<usize>,
    screen: ScreenJson,
    dispatch: DispatchJson,
    output_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            box_count: 3000,
            threshold: 0.7,
            seed: None,
            workers: None,
            screen: ScreenJson::default(),
            dispatch: DispatchJson::default(),
            output_path: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct StrategyRecord {
    name: &'static str,
    kept: usize,
    seconds: f64,
    matches_sequential: bool,
}

#[derive(Debug, Serialize)]
struct RangeRecord {
    from: usize,
    strategy: &'static str,
}

#[derive(Debug, Serialize)]
struct DispatchRecord {
    calibration_seconds: f64,
    chosen: Option<&'static str>,
    kept: usize,
    seconds: f64,
    matches_sequential: bool,
    ranges: Vec<RangeRecord>,
    unavailable: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Output {
    box_count: usize,
    threshold: f32,
    strategies: Vec<StrategyRecord>,
    dispatch: DispatchRecord,
}

fn timed(
    nms: &dyn Suppressor,
    boxes: &[adaptnms::BBox],
    scores: &[f32],
    threshold: f32,
) -> Result<(Suppressed, f64), adaptnms::NmsError> {
    let started = Instant::now();
    let out = nms.suppress(boxes, scores, threshold)?;
    Ok((out, started.elapsed().as_secs_f64()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("adaptnms=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config: Config = match &cli.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    if config.box_count > config.dispatch.max_size {
        return Err("dispatch.max_size must be at least box_count".into());
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let generator = BoxGenerator::new(config.screen.width, config.screen.height)?;
    let (boxes, scores) = generator.workload(config.box_count, &mut rng);

    let mut candidates: Vec<Box<dyn Suppressor>> = vec![
        Box::new(SequentialNms::new()),
        Box::new(ConcurrentNms::new().with_config(ConcurrentConfig {
            workers: config.workers,
        })),
    ];
    #[cfg(feature = "rayon")]
    candidates.push(Box::new(adaptnms::RayonNms::new()));

    let mut strategies = Vec::with_capacity(candidates.len());
    let mut reference: Option<Suppressed> = None;
    for nms in candidates.iter_mut() {
        nms.init(config.box_count)?;
        let (out, seconds) = timed(nms.as_ref(), &boxes, &scores, config.threshold)?;
        let matches_sequential = reference.as_ref().map_or(true, |r| *r == out);
        strategies.push(StrategyRecord {
            name: nms.name(),
            kept: out.len(),
            seconds,
            matches_sequential,
        });
        if reference.is_none() {
            reference = Some(out);
        }
    }

    let mut adaptive = AdaptiveNms::with_strategies(candidates).with_config(DispatchConfig {
        sweep_divisor: config.dispatch.sweep_divisor,
        sweep_step: config.dispatch.sweep_step,
        seed: config.seed,
        screen_width: config.screen.width,
        screen_height: config.screen.height,
        ..DispatchConfig::default()
    });
    let started = Instant::now();
    adaptive.init(config.dispatch.max_size)?;
    let calibration_seconds = started.elapsed().as_secs_f64();
    tracing::info!(seconds = calibration_seconds, "calibration finished");

    let (out, seconds) = timed(&adaptive, &boxes, &scores, config.threshold)?;
    let names = adaptive.strategy_names();
    let ranges = adaptive
        .routing_table()
        .map(|table| {
            table
                .ranges()
                .into_iter()
                .map(|(from, idx)| RangeRecord {
                    from,
                    strategy: names[idx],
                })
                .collect()
        })
        .unwrap_or_default();

    let dispatch = DispatchRecord {
        calibration_seconds,
        chosen: adaptive.strategy_for(config.box_count),
        kept: out.len(),
        seconds,
        matches_sequential: reference.as_ref().map_or(true, |r| *r == out),
        ranges,
        unavailable: adaptive.unavailable().iter().map(|e| e.to_string()).collect(),
    };

    let output = Output {
        box_count: config.box_count,
        threshold: config.threshold,
        strategies,
        dispatch,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
