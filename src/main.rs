//! Zeno's paradoxes entry point
//!
//! Runs a scenario headless at a fixed frame rate, or prints the console
//! tables for one.

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use zeno_paradoxes::analysis::{self, Race};
use zeno_paradoxes::consts::{FRAME_DT, MAX_FRAME_DT, REFERENCE_FPS};
use zeno_paradoxes::sim::{
    Command, Engine, EngineConfig, EngineEvent, Overlay, Presenter, ScenarioKind, Snapshot, TickInput,
};
use zeno_paradoxes::{QualityPreset, Settings};

#[derive(Parser)]
#[command(name = "zeno-paradoxes")]
#[command(about = "Real-time simulations of Zeno's motion paradoxes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario headless at a fixed frame delta (60 Hz by default)
    Run {
        /// pursuit (achilles), dichotomy or arrow
        #[arg(value_parser = parse_scenario)]
        scenario: ScenarioKind,

        /// Wall-clock seconds to simulate
        #[arg(long, default_value = "20")]
        seconds: f32,

        /// Raw frame delta in seconds (capped at 0.1 like a hitching frame)
        #[arg(long, default_value_t = FRAME_DT, value_parser = parse_frame_dt)]
        frame_dt: f32,

        /// Simulation speed multiplier (clamped to the scenario bounds)
        #[arg(long)]
        speed: Option<f32>,

        /// Number of mode changes spread evenly over the run
        #[arg(long, default_value = "0")]
        mode_cycles: usize,

        /// Overlays to flip at start (trajectories, graph, steps, series, uncertainty)
        #[arg(long, value_delimiter = ',', value_parser = parse_overlay)]
        overlay: Vec<Overlay>,

        /// Take manual Zeno steps, one per second, instead of timer steps
        #[arg(long)]
        manual: bool,

        /// RNG seed for effects
        #[arg(long)]
        seed: Option<u64>,

        /// Engine configuration JSON (overrides the scenario defaults)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Settings JSON (quality preset, particles, overlays)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Quality preset: low, medium or high
        #[arg(long, value_parser = parse_quality)]
        quality: Option<QualityPreset>,

        /// Stop as soon as the scenario completes
        #[arg(long)]
        stop_on_complete: bool,

        /// Emit one JSON snapshot per frame on stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the non-interactive tables for a scenario
    Console {
        #[arg(value_parser = parse_scenario)]
        scenario: ScenarioKind,
    },
}

fn parse_scenario(s: &str) -> Result<ScenarioKind, String> {
    ScenarioKind::from_str(s).ok_or_else(|| format!("unknown scenario '{}'", s))
}

fn parse_overlay(s: &str) -> Result<Overlay, String> {
    Overlay::from_str(s).ok_or_else(|| format!("unknown overlay '{}'", s))
}

fn parse_frame_dt(s: &str) -> Result<f32, String> {
    let dt: f32 = s.parse().map_err(|e| format!("invalid frame delta '{}': {}", s, e))?;
    if dt.is_finite() && dt > 0.0 {
        Ok(dt)
    } else {
        Err(format!("frame delta must be positive, got {}", s))
    }
}

fn parse_quality(s: &str) -> Result<QualityPreset, String> {
    QualityPreset::from_str(s).ok_or_else(|| format!("unknown quality preset '{}'", s))
}

/// Logs events as they happen and a status line every 60 frames
struct LogPresenter;

impl Presenter for LogPresenter {
    fn present(&mut self, snapshot: &Snapshot<'_>, events: &[EngineEvent]) {
        for event in events {
            match event {
                EngineEvent::Step(step) => log::info!(
                    "Step {}: position {:.3}, remaining {:.3}",
                    step.index,
                    step.position,
                    step.remaining
                ),
                EngineEvent::Completed { time, position } => {
                    log::info!("Completed at t={:.3}s, position {:.3}", time, position)
                }
                other => log::debug!("{:?}", other),
            }
        }
        if snapshot.tick % REFERENCE_FPS as u64 == 0 {
            let positions: Vec<String> = snapshot
                .bodies
                .iter()
                .map(|b| format!("{}={:.2}", b.label.as_deref().unwrap_or("body"), b.position))
                .collect();
            log::info!(
                "t={:.2}s x{:.1} [{}] {} particles={} samples={}",
                snapshot.elapsed,
                snapshot.clock.speed_multiplier,
                snapshot.mode.as_str(),
                positions.join(" "),
                snapshot.particles.len(),
                snapshot.history.len()
            );
        }
    }
}

#[derive(Serialize)]
struct Frame<'a> {
    snapshot: &'a Snapshot<'a>,
    events: &'a [EngineEvent],
}

/// One JSON object per frame on stdout
struct JsonPresenter;

impl Presenter for JsonPresenter {
    fn present(&mut self, snapshot: &Snapshot<'_>, events: &[EngineEvent]) {
        match serde_json::to_string(&Frame { snapshot, events }) {
            Ok(line) => println!("{}", line),
            Err(e) => log::warn!("Failed to encode frame: {}", e),
        }
    }
}

struct RunOptions {
    seconds: f32,
    frame_dt: f32,
    speed: Option<f32>,
    mode_cycles: usize,
    overlays: Vec<Overlay>,
    manual: bool,
    stop_on_complete: bool,
}

/// Scripted session: press start, then feed the scheduled commands
fn run(engine: &mut Engine, opts: &RunOptions, presenter: &mut dyn Presenter) {
    let raw_dt = frame_delta(opts.frame_dt);
    let frames = (opts.seconds.max(0.0) / raw_dt).round() as usize;
    let cycle_every = if opts.mode_cycles > 0 {
        (frames / (opts.mode_cycles + 1)).max(1)
    } else {
        usize::MAX
    };
    let step_every = ((1.0 / raw_dt).round() as usize).max(1);

    let mut opening = vec![Command::TogglePause];
    if let Some(speed) = opts.speed {
        opening.push(Command::SetSpeed(speed));
    }
    if opts.manual {
        opening.push(Command::ToggleAutoStep);
    }
    opening.extend(opts.overlays.iter().map(|o| Command::ToggleOverlay(*o)));

    let mut cycles = 0;
    for frame in 0..frames {
        let mut input = TickInput::default();
        if frame == 0 {
            input.commands.append(&mut opening);
        }
        if frame > 0 && frame % cycle_every == 0 && cycles < opts.mode_cycles {
            input.commands.push(Command::CycleMode);
            cycles += 1;
        }
        if opts.manual && frame % step_every == 0 {
            input.commands.push(Command::ManualStep);
        }

        let outcome = engine.frame(&input, raw_dt, presenter);
        if outcome.quit {
            break;
        }
        let completed = outcome
            .events
            .iter()
            .any(|e| matches!(e, EngineEvent::Completed { .. }));
        if completed && opts.stop_on_complete {
            break;
        }
    }
}

/// Hitch clamp applied before the engine sees a frame delta
fn frame_delta(raw: f32) -> f32 {
    if raw.is_finite() && raw > 0.0 {
        raw.min(MAX_FRAME_DT)
    } else {
        FRAME_DT
    }
}

fn print_pursuit() {
    let race = Race::default();
    println!("=== ACHILLES AND THE TORTOISE ===");
    println!(
        "Achilles {} m/s vs tortoise {} m/s, {} m lead\n",
        race.pursuer_speed,
        race.target_speed,
        race.target_start - race.pursuer_start
    );
    println!("{:>6} | {:>8} | {:>8} | {:>9}", "Time", "Achilles", "Tortoise", "Gap");
    println!("{}", "-".repeat(45));
    for row in race.table(1.0) {
        println!(
            "{:6.1} | {:8.2} | {:8.2} | {:9.2}",
            row.time, row.pursuer, row.target, row.gap
        );
    }
    if let (Some(t), Some(x)) = (race.catch_time(), race.catch_position()) {
        println!("\nClosed form: caught at t = {:.4}s, x = {:.4}m", t, x);
    }

    println!("\n=== ZENO'S SERIES ===");
    for step in race.zeno_series(10) {
        println!(
            "Stage {}: +{:.3}s, total {:.3}s, position {:.3}m",
            step.index, step.step_time, step.total_time, step.position
        );
    }
}

fn print_dichotomy() {
    const DISTANCE: f64 = 8.0;
    println!("=== THE DICHOTOMY ===");
    println!("Distance to the tree: {}m\n", DISTANCE);
    println!("{:>5} | {:>10} | {:>10} | {:>10}", "Step", "Position", "Remaining", "Half");
    println!("{}", "-".repeat(50));
    for row in analysis::dichotomy_table(DISTANCE, 0.001) {
        println!(
            "{:5} | {:10.6} | {:10.6} | {:10.6}",
            row.step, row.position, row.remaining, row.half
        );
    }

    let first = DISTANCE / 2.0;
    if let Some(limit) = analysis::geometric_limit(first, 0.5) {
        println!("\nGeometric series {} + {} + ... = {}", first, first / 2.0, limit);
    }
    for (i, row) in analysis::geometric_series(first, 0.5, 15).iter().enumerate() {
        println!(
            "Term {:2}: {:.6}, sum {:.6}, rest {:.6}",
            i + 1,
            row.term,
            row.partial_sum,
            row.rest
        );
    }

    println!("\n=== CONVERGENCE ===");
    for (i, fraction) in analysis::step_ladder(10).iter().enumerate() {
        let length = fraction * 2.0 * DISTANCE;
        println!("Step {:2}: {:8.4}m |{}", i, length, "#".repeat((length * 5.0) as usize));
    }
}

fn print_arrow() {
    const SPEED: f64 = 25.0;
    const TARGET: f64 = 50.0;
    println!("=== THE ARROW ===");
    println!("Target {}m, speed {} m/s", TARGET, SPEED);
    for dt in [1.0, 0.5, 0.1, 0.01, 0.001, 0.0001] {
        println!("\n--- dt = {}s ---", dt);
        println!(
            "{:>8} | {:>10} | {:>12} | {:>12}",
            "Instant", "Position", "Displacement", "Mean speed"
        );
        for row in analysis::instant_table(SPEED, TARGET, dt) {
            println!(
                "{:8.4} | {:10.4} | {:12.6} | {:12.2}",
                row.time, row.position, row.displacement, row.mean_speed
            );
        }
    }

    println!("\n=== INSTANTANEOUS SPEED AT t = 1s ===");
    println!("{:>10} | {:>10} | {:>10}", "dt", "dx", "dx/dt");
    let deltas = [1.0, 0.1, 0.01, 0.001, 0.0001, 0.00001];
    for row in analysis::difference_quotients(SPEED, 1.0, &deltas) {
        println!("{:10.5} | {:10.5} | {:10.3}", row.delta_t, row.delta_x, row.quotient);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scenario,
            seconds,
            frame_dt,
            speed,
            mode_cycles,
            overlay,
            manual,
            seed,
            config,
            settings,
            quality,
            stop_on_complete,
            json,
        } => {
            let mut engine_config = match config {
                Some(path) => EngineConfig::load(path)?,
                None => EngineConfig::for_kind(scenario),
            };
            if engine_config.scenario.kind() != scenario {
                log::warn!(
                    "Config file describes {}, running it instead of {}",
                    engine_config.scenario.kind().as_str(),
                    scenario.as_str()
                );
            }
            if let Some(seed) = seed {
                engine_config.seed = seed;
            }

            let mut prefs = settings.map(Settings::load).unwrap_or_default();
            if let Some(quality) = quality {
                prefs.quality = quality;
            }
            prefs.apply_to(&mut engine_config);

            let mut engine = Engine::new(engine_config)?;
            engine.set_overlays(prefs.overlays);
            if frame_dt > MAX_FRAME_DT {
                log::warn!("Frame delta {}s capped at {}s", frame_dt, MAX_FRAME_DT);
            }
            log::info!("Zeno's paradoxes: {} for {:.1}s", scenario.as_str(), seconds);

            let opts = RunOptions {
                seconds,
                frame_dt,
                speed,
                mode_cycles,
                overlays: overlay,
                manual,
                stop_on_complete,
            };
            if json {
                run(&mut engine, &opts, &mut JsonPresenter);
            } else {
                run(&mut engine, &opts, &mut LogPresenter);
            }
            if !engine.completed() {
                log::info!("Run ended before completion");
            }
        }
        Commands::Console { scenario } => match scenario {
            ScenarioKind::Pursuit => print_pursuit(),
            ScenarioKind::Dichotomy => print_dichotomy(),
            ScenarioKind::Arrow => print_arrow(),
        },
    }
    Ok(())
}
