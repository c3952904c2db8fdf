//! Replay driver for the IPD measurement pipeline.
//!
//! Feeds a recorded sequence of detection bundles through the controller,
//! standing in for the live camera/detector frame source.

use anyhow::{Context, Result};
use clap::Parser;
use ipd_measurement::config::{Config, EXAMPLE_CONFIG};
use ipd_measurement::controller::{
    MeasurementController, MeasurementObserver, MeasurementResult, MeasurementState,
};
use ipd_measurement::detection::DetectionBundle;
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Path to a YAML file with a list of detection bundles to replay
    #[arg(short, long)]
    frames: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_example_config: bool,
}

/// Logs lifecycle events as they happen
struct LoggingObserver;

impl MeasurementObserver for LoggingObserver {
    fn on_state_changed(&mut self, old: MeasurementState, new: MeasurementState) {
        info!("state {old} -> {new}");
    }

    fn on_result(&mut self, result: &MeasurementResult) {
        info!(
            "result: {:.2} mm (confidence {:.2}) at {} ms",
            result.ipd_mm, result.confidence, result.timestamp_ms
        );
    }

    fn on_error(&mut self, error: &ipd_measurement::Error) {
        warn!("pipeline error: {error}");
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_example_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    // Load configuration if provided
    let config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {config_path}");
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    config
        .validate()
        .context("configuration failed validation")?;

    let frames_path = args
        .frames
        .context("no frames file given; use --frames <file> or --print-example-config")?;
    let content = std::fs::read_to_string(&frames_path)
        .with_context(|| format!("cannot read frames file {frames_path}"))?;
    let bundles: Vec<DetectionBundle> =
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {frames_path}"))?;
    info!("replaying {} frames from {frames_path}", bundles.len());

    let mut controller = MeasurementController::new(config);
    controller.add_observer(Box::new(LoggingObserver));
    controller.initialize();
    controller.start_measurement()?;

    for bundle in &bundles {
        // Malformed frames are reported and skipped; the replay continues
        let _ = controller.process_frame(bundle);
    }

    let debug_info = controller.debug_info();
    println!("final state: {}", controller.state());
    println!("guidance:    {}", controller.guidance());
    match controller.latest_result() {
        Some(result) => println!(
            "ipd:         {:.2} mm (confidence {:.2})",
            result.ipd_mm, result.confidence
        ),
        None => println!("ipd:         no measurement produced"),
    }
    println!(
        "last frame:  face={} eyes={} card={} eye_px={:.1} card_px={:.1}",
        debug_info.face_detected,
        debug_info.eye_detected,
        debug_info.card_detected,
        debug_info.pixel_distance,
        debug_info.card_pixel_width
    );

    Ok(())
}
