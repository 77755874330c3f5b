use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use pulsetouch::config::{Config, PenModeSwitch};
use pulsetouch::engine::{NOMINAL_SAMPLING_INTERVAL, Settings};
use pulsetouch::synth::{self, PenStrokeBuilder};
use pulsetouch::trace::Trace;
use pulsetouch::util::{Point, Vector};
use pulsetouch::{
    Classification, LineId, LineIncrements, PenModeHypothesis, PulsedTouchAnalyzer,
    PulsedTouchCore, PulsedTouchRecognizer, TouchPoint,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("PULSETOUCH_GIT_HASH"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "pulsetouch")]
#[command(
    version,
    long_version = LONG_VERSION,
    about = "Pen, finger and palm classification for pulsed active styli"
)]
struct Cli {
    /// Config file to use instead of ~/.config/pulsetouch/config.toml
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Write the documented default config file and exit
    #[arg(long, action = ArgAction::SetTrue)]
    init_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a recorded TOML or JSON trace and print the resulting lines
    Replay {
        /// Trace file (.toml or .json)
        trace: PathBuf,

        /// Delivery style; defaults to the config's replay.delivery
        #[arg(long, value_enum)]
        delivery: Option<Delivery>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print a synthetic pulsed pen stroke as a JSON trace
    Simulate {
        /// Number of pen modes (1, 2 or 3)
        #[arg(long, default_value_t = 2)]
        modes: u8,

        /// Pen mode to pulse (1-based)
        #[arg(long, default_value_t = 1)]
        pen_mode: u8,

        /// Number of on-phases of each stroke
        #[arg(long, default_value_t = 8)]
        cycles: u32,

        /// Stroke speed in px/s
        #[arg(long, default_value_t = 300.0)]
        speed: f64,

        /// Controller sampling rate in Hz
        #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
        rate: u32,

        /// Number of strokes, each below the previous one
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        strokes: u32,

        /// Pause between strokes in seconds
        #[arg(long, default_value_t = 0.5)]
        gap: f64,

        /// Add a slow finger drag away from the stroke
        #[arg(long, action = ArgAction::SetTrue)]
        with_finger: bool,

        /// Write the trace to a file instead of stdout
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Delivery {
    /// Gesture adapter, increments pulled once the trace ends
    Pull,
    /// Analyzer adapter, increments pushed to a delegate after every frame
    Push,
}

impl Delivery {
    fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("push") {
            Delivery::Push
        } else {
            Delivery::Pull
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if cli.init_config {
        let config_path = match cli.config {
            Some(path) => path,
            None => Config::get_config_path()?,
        };
        Config::create_default_file(&config_path)?;
        println!("Wrote default config to {}", config_path.display());
        return Ok(());
    }

    match cli.command {
        Some(Command::Replay {
            trace,
            delivery,
            format,
        }) => {
            let config = match &cli.config {
                Some(path) => Config::load_from(path)?,
                None => Config::load()?,
            };
            let delivery =
                delivery.unwrap_or_else(|| Delivery::from_config(&config.replay.delivery));
            replay(&config, &trace, delivery, format)
        }
        Some(Command::Simulate {
            modes,
            pen_mode,
            cycles,
            speed,
            rate,
            strokes,
            gap,
            with_finger,
            output,
        }) => {
            let modes = PenModeSwitch::try_from(modes)?;
            let stroke = PenStrokeBuilder::new()
                .mode(modes, pen_mode)?
                .cycles(cycles)
                .velocity(Vector::new(speed, 0.0))
                .interval(1.0 / f64::from(rate));
            let plan = SimulationPlan {
                stroke,
                contacts_per_stroke: cycles,
                strokes,
                gap,
                with_finger,
            };
            simulate(&plan, output.as_deref())
        }
        None => {
            println!("pulsetouch: pen, finger and palm classification for pulsed active styli");
            println!();
            println!("Usage:");
            println!("  pulsetouch simulate --pen-mode 2 -o stroke.json  Synthesise a stroke");
            println!("  pulsetouch replay stroke.json                    Classify a trace");
            println!("  pulsetouch --init-config                         Write the config");
            println!("  pulsetouch --help                                Show help");
            Ok(())
        }
    }
}

// ============================================================================
// Replay
// ============================================================================

#[derive(Debug, Serialize)]
struct ReplayLine {
    line_id: LineId,
    classification: Classification,
    classification_code: u8,
    closed: bool,
    points: Vec<TouchPoint>,
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    lines: Vec<ReplayLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pen_mode: Option<PenModeHypothesis>,
}

fn replay(config: &Config, path: &Path, delivery: Delivery, format: OutputFormat) -> Result<()> {
    let trace = Trace::load(path)
        .with_context(|| format!("Failed to load trace {}", path.display()))?;
    let batches = trace.batches();
    let tuning = config.tuning.clone();

    // Let every line time out after the last frame so closures are reported.
    let settings = Settings::resolve(&tuning);
    let tail = trace
        .end_time()
        .map(|end| end + settings.max_off_time + NOMINAL_SAMPLING_INTERVAL);

    let mut deliveries: Vec<LineIncrements> = Vec::new();
    let (core, pen_mode) = match delivery {
        Delivery::Pull => {
            let mut recognizer = PulsedTouchRecognizer::new(tuning);
            for batch in &batches {
                recognizer.process(batch);
            }
            if let Some(tail) = tail {
                recognizer.advance_to(tail);
            }
            deliveries.push(recognizer.line_increments());
            log::info!("Recognizer finished in state {}", recognizer.state());
            (recognizer.core().clone(), recognizer.pen_mode())
        }
        Delivery::Push => {
            let mut analyzer = PulsedTouchAnalyzer::new(tuning, |increments: &LineIncrements| {
                deliveries.push(increments.clone());
            });
            for batch in &batches {
                analyzer.process(batch);
            }
            if let Some(tail) = tail {
                analyzer.advance_to(tail);
            }
            (analyzer.core().clone(), analyzer.pen_mode())
        }
    };

    let report = build_report(&deliveries, &core, pen_mode, config.replay.report_pen_mode);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }
    Ok(())
}

fn build_report(
    deliveries: &[LineIncrements],
    core: &PulsedTouchCore,
    pen_mode: PenModeHypothesis,
    report_pen_mode: bool,
) -> ReplayReport {
    let mut lines: BTreeMap<LineId, (Classification, Vec<TouchPoint>)> = BTreeMap::new();
    for delivery in deliveries {
        for (id, increment) in delivery {
            let entry = lines.entry(*id).or_default();
            entry.0 = increment.classification;
            entry.1.extend(increment.touches.iter().copied());
        }
    }
    let lines = lines
        .into_iter()
        .map(|(line_id, (delivered, points))| {
            // Open lines may have been reclassified after their last delivery.
            let open = core.line(line_id);
            let classification = open.map_or(delivered, |line| line.classification);
            ReplayLine {
                line_id,
                classification,
                classification_code: classification.code(),
                closed: open.is_none(),
                points,
            }
        })
        .collect();
    ReplayReport {
        lines,
        pen_mode: report_pen_mode.then_some(pen_mode),
    }
}

fn print_report(report: &ReplayReport) {
    for line in &report.lines {
        let first = line.points.first().map_or(0.0, |p| p.timestamp);
        let last = line.points.last().map_or(0.0, |p| p.timestamp);
        println!(
            "{} {} {} points {:.3}s-{:.3}s{}",
            line.line_id,
            line.classification,
            line.points.len(),
            first,
            last,
            if line.closed { " closed" } else { "" }
        );
    }
    if let Some(hypothesis) = &report.pen_mode {
        if hypothesis.is_final {
            println!(
                "pen mode {} of {} (final, error {:.3}, {} cycles)",
                hypothesis.mode, hypothesis.modes, hypothesis.error, hypothesis.cycles
            );
        } else {
            println!(
                "pen mode provisional (best {} of {}, error {:.3}, {} cycles)",
                hypothesis.best_mode, hypothesis.modes, hypothesis.error, hypothesis.cycles
            );
        }
    }
}

// ============================================================================
// Simulate
// ============================================================================

struct SimulationPlan {
    stroke: PenStrokeBuilder,
    contacts_per_stroke: u32,
    strokes: u32,
    gap: f64,
    with_finger: bool,
}

fn simulate(plan: &SimulationPlan, output: Option<&Path>) -> Result<()> {
    let mut batches = Vec::new();
    let mut stroke = plan.stroke.clone();
    for index in 0..plan.strokes {
        stroke = stroke
            .start(Point::new(100.0, 100.0 + 150.0 * f64::from(index)))
            .first_touch_id(1 + u64::from(index) * u64::from(plan.contacts_per_stroke));
        batches = synth::merge(batches, stroke.frames());
        let next_start = stroke.end_time() + plan.gap.max(0.0);
        stroke = stroke.start_time(next_start);
    }

    if plan.with_finger {
        let end = batches.last().map_or(0.0, |batch| batch.timestamp);
        let frames = (end / NOMINAL_SAMPLING_INTERVAL).round() as u32;
        let finger = synth::finger_drag(
            0,
            Point::new(600.0, 400.0),
            Vector::new(60.0, 0.0),
            0.0,
            frames.max(1),
        );
        batches = synth::merge(batches, finger);
    }

    let rendered = serde_json::to_string_pretty(&Trace::from_batches(&batches))?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered + "\n")
                .with_context(|| format!("Failed to write trace to {}", path.display()))?;
            log::info!("Wrote {} frames to {}", batches.len(), path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
