//! RDW Application
//!
//! Command-line front end for the redirected walking controller.
//!
//! # Usage
//!
//! ```bash
//! # Walk two laps of the virtual hexagon with a scripted headset
//! rdw simulate --laps 2
//!
//! # Same run, one JSON telemetry line per event
//! rdw simulate --json
//!
//! # Where the way pointers go in a 4m x 3.5m play area
//! rdw boundary --width 4 --depth 3.5
//!
//! # Print a configuration file to start from
//! rdw config --preset gentle
//! ```

mod sim;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use rdw_controller::{
    PoseSource, RedirectionConfig, RedirectionController, RedirectionPreset, StaticWaypoints, WorldTransform,
};
use rdw_core::boundary::{BoundaryParams, PlayArea};
use rdw_core::loops::{PhysicalLoop, VirtualLoop, VIRTUAL_CORNERS};
use rdw_core::types::Vec3;

use crate::sim::{excursion_outside_square, step_frame, SimulatedWalker};

/// RDW Application
#[derive(Parser, Debug)]
#[command(name = "rdw")]
#[command(author, version, about = "Redirected walking controller", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive a scripted headset around the virtual loop (default)
    Simulate {
        /// Virtual laps to walk
        #[arg(long, default_value = "1")]
        laps: u32,

        /// Frame rate
        #[arg(long, default_value = "90")]
        hz: f32,

        /// Walking speed (m/s)
        #[arg(long, default_value = "1.0")]
        speed: f32,

        /// Turning speed (deg/s)
        #[arg(long, default_value = "90")]
        turn_rate: f32,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print telemetry as JSON lines
        #[arg(long)]
        json: bool,

        /// Hold the suspend button for one second every N seconds
        #[arg(long)]
        suspend_every: Option<f32>,
    },

    /// Place way pointers for a rectangular play area
    Boundary {
        /// Play area width along X (m)
        #[arg(long, default_value = "4.0")]
        width: f32,

        /// Play area depth along Z (m)
        #[arg(long, default_value = "4.0")]
        depth: f32,
    },

    /// Print a configuration as JSON
    Config {
        /// Preset: standard, gentle, or without-translation
        #[arg(short, long, default_value = "standard")]
        preset: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("RDW v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        None => run_simulation(SimulationArgs::default())?,
        Some(Commands::Simulate {
            laps,
            hz,
            speed,
            turn_rate,
            config,
            json,
            suspend_every,
        }) => {
            run_simulation(SimulationArgs {
                laps,
                hz,
                speed,
                turn_rate,
                config,
                json,
                suspend_every,
            })?;
        }
        Some(Commands::Boundary { width, depth }) => {
            print_boundary(width, depth)?;
        }
        Some(Commands::Config { preset }) => {
            print_config(&preset)?;
        }
    }

    Ok(())
}

#[derive(Debug)]
struct SimulationArgs {
    laps: u32,
    hz: f32,
    speed: f32,
    turn_rate: f32,
    config: Option<PathBuf>,
    json: bool,
    suspend_every: Option<f32>,
}

impl Default for SimulationArgs {
    fn default() -> Self {
        Self {
            laps: 1,
            hz: 90.0,
            speed: 1.0,
            turn_rate: 90.0,
            config: None,
            json: false,
            suspend_every: None,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<RedirectionConfig> {
    let Some(path) = path else {
        return Ok(RedirectionConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: RedirectionConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    config.validate().with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Walk the virtual hexagon with a scripted headset
fn run_simulation(args: SimulationArgs) -> anyhow::Result<()> {
    if !(args.hz.is_finite() && args.hz > 0.0) {
        anyhow::bail!("frame rate must be positive, got {}", args.hz);
    }
    if !(args.speed.is_finite() && args.speed > 0.0) {
        anyhow::bail!("walking speed must be positive, got {}", args.speed);
    }

    let config = load_config(args.config.as_ref())?;
    let side = config.path_length_m;
    let center = Vec3::zeros();
    let physical = PhysicalLoop::square(center, side);
    let provider = StaticWaypoints::new(physical, 0);

    let walker = SimulatedWalker::new(physical.corner(0), physical.segment(0), args.speed, args.turn_rate);
    let mut rdw = RedirectionController::new(
        config,
        VirtualLoop::hexagon(Vec3::zeros(), side),
        walker,
        WorldTransform::identity(),
        provider,
    )?;

    let dt = 1.0 / args.hz;
    let corners_to_reach = args.laps as usize * VIRTUAL_CORNERS;
    // Generous cap: a lap is six paths plus six turns
    let max_frames = (args.laps.max(1) as f32 * 120.0 * args.hz) as u64;

    info!(laps = args.laps, hz = args.hz, speed = args.speed, "Starting simulation");

    let mut reached = 0;
    let mut transitions = 0;
    let mut max_excursion = 0.0_f32;
    let mut last = None;
    for frame in 0..max_frames {
        let elapsed = frame as f32 * dt;
        let suspend = args
            .suspend_every
            .filter(|every| *every > 0.0)
            .is_some_and(|every| elapsed % every > every - 1.0);

        rdw.source_mut().set_suspend(suspend);
        let Some(telemetry) = step_frame(&mut rdw, dt) else {
            continue;
        };

        let head = rdw.source().head_pose().position;
        max_excursion = max_excursion.max(excursion_outside_square(&head, &center, side));

        let eventful = telemetry.transition.is_some() || telemetry.virtual_reached.is_some();
        if let Some(transition) = telemetry.transition {
            transitions += 1;
            info!(
                frame = telemetry.frame,
                kind = transition.kind.name(),
                corner = transition.corner,
                lack_deg = telemetry.lack_deg,
                "Corner transition"
            );
        }
        if let Some(corner) = telemetry.virtual_reached {
            reached += 1;
            info!(frame = telemetry.frame, corner, "Virtual corner reached");
        }
        if args.json && eventful {
            println!("{}", serde_json::to_string(&telemetry)?);
        }

        last = Some(telemetry);
        if rdw.source().arrivals() >= corners_to_reach {
            break;
        }
    }

    let arrivals = rdw.source().arrivals();
    if arrivals < corners_to_reach {
        warn!(arrivals, wanted = corners_to_reach, "Simulation stopped before finishing the laps");
    }

    match last {
        Some(telemetry) if args.json => println!("{}", serde_json::to_string(&telemetry)?),
        Some(telemetry) => {
            println!("{telemetry}");
            println!("virtual corners walked: {arrivals}");
            println!("virtual corners reached (controller): {reached}");
            println!("corner transitions: {transitions}");
            println!("physical distance walked: {:.2} m", rdw.source().walked_m());
            println!("max excursion outside the {side} m square: {max_excursion:.3} m");
        }
        None => warn!("Redirection never armed"),
    }

    Ok(())
}

/// Print way pointer placement for a rectangular play area
fn print_boundary(width: f32, depth: f32) -> anyhow::Result<()> {
    let area = PlayArea::rectangle(width, depth);
    let params = BoundaryParams::default();
    let points = area.turning_points(&params);

    println!("play area {width} m x {depth} m, path length {} m", params.segment_length);
    for corner in 0..rdw_core::PHYSICAL_CORNERS {
        match points.get(corner) {
            Some(pointer) => println!(
                "  corner {corner}: position ({:.3}, {:.3}), heading ({:.3}, {:.3})",
                pointer.position.x, pointer.position.z, pointer.heading.x, pointer.heading.z
            ),
            None => println!("  corner {corner}: skipped"),
        }
    }
    for error in points.skipped() {
        warn!("{}", error);
    }

    let physical = points.to_physical_loop()?;
    for corner in 0..rdw_core::PHYSICAL_CORNERS {
        println!("  segment {corner}: {:.3} m", physical.segment(corner).norm());
    }

    Ok(())
}

/// Print a preset configuration
fn print_config(preset: &str) -> anyhow::Result<()> {
    let preset = match preset.to_lowercase().as_str() {
        "standard" => RedirectionPreset::Standard,
        "gentle" => RedirectionPreset::Gentle,
        "without-translation" | "without_translation" => RedirectionPreset::WithoutTranslation,
        other => anyhow::bail!("unknown preset '{}', expected standard, gentle or without-translation", other),
    };
    let config = RedirectionConfig::from_preset(preset);
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
