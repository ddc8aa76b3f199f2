mod app;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use notch_delta_lattice::config::AppConfig;
use notch_delta_lattice::simulation::Simulation;

#[derive(Parser)]
#[command(name = "notch-delta-lattice")]
#[command(version)]
#[command(about = "Lateral inhibition by Notch-Delta signaling on a hexagonal lattice")]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed, overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Run without a window and log statistics
    #[arg(long)]
    headless: bool,

    /// Frames to run in headless mode
    #[arg(long, default_value = "500")]
    frames: usize,

    /// Pause between headless frames in milliseconds
    #[arg(long, default_value = "0")]
    interval_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };
    if cli.seed.is_some() {
        config.run.seed = cli.seed;
    }

    let geometry = config.lattice.geometry().context("invalid lattice")?;
    let simulation = Simulation::new(
        geometry,
        config.params,
        config.run.steps_per_frame,
        config.run.seed,
    );

    if cli.headless {
        run_headless(simulation, cli.frames, Duration::from_millis(cli.interval_ms));
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 760.0])
            .with_min_inner_size([900.0, 620.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Notch-Delta Lattice",
        options,
        Box::new(|cc| Ok(Box::new(app::LatticeApp::new(cc, simulation)))),
    )
    .map_err(|err| anyhow::anyhow!("window closed with error: {err}"))
}

fn run_headless(mut simulation: Simulation, frames: usize, interval: Duration) {
    info!(
        frames,
        seed = simulation.seed(),
        cells = simulation.field().len(),
        "headless run"
    );

    simulation.start();
    for _ in 0..frames {
        if simulation.frame().is_none() {
            break;
        }
        if !interval.is_zero() {
            std::thread::sleep(interval);
        }
    }
    simulation.stop();

    let features = simulation.features();
    info!(
        steps = simulation.field().steps(),
        time = simulation.field().time(),
        mean_delta = features.mean_delta,
        delta_variance = features.delta_variance,
        mean_signal = features.mean_signal,
        sender_fraction = features.sender_fraction,
        lateral_contrast = features.lateral_contrast,
        "headless run finished"
    );
}
