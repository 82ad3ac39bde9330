use handmotion::adapters::{list_ports, SerialAdapter, SharedCursor, SharedSerial};
use handmotion::calibration::calibrate_pinch_distance;
use handmotion::config::{Config, DEFAULT_CONFIG_PATH};
use handmotion::interfaces::{
    Context, LedInterface, LightInterface, MotorInterface, MouseInterface, ESP32_SERIAL_ADAPTER,
    MOUSE_CONTROLLER,
};
use handmotion::pipeline::{run_pipeline, shutdown};
use handmotion::source::{open_input, DetectionSource, JsonLinesSource};
use handmotion::stats::FrameStats;
use handmotion::time_controller::frame_interval_secs;

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "handmotion", about = "Control devices with hand gestures")]
struct Cli {
    /// Config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// JSON-lines detection input, `-` for stdin
    #[arg(long, default_value = "-")]
    input: String,

    /// Detector command to spawn instead of reading --input (e.g. "python3 detect.py")
    #[arg(long)]
    detector: Option<String>,

    /// Interfaces to activate, overriding the config (e.g. led,motor)
    #[arg(long, value_delimiter = ',')]
    active: Option<Vec<String>>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the frame loop (default)
    Run,
    /// Measure your pinch distance and suggest a threshold
    Calibrate {
        /// Sampling window in seconds, overriding the config
        #[arg(long)]
        duration: Option<f64>,
    },
    /// List available interfaces
    List,
    /// List serial ports the OS reports
    Ports,
}

const INTERFACES: [(&str, &str, &str); 4] = [
    (MouseInterface::ID, MouseInterface::NAME, "cursor"),
    (LedInterface::ID, LedInterface::NAME, "serial"),
    (LightInterface::ID, LightInterface::NAME, "serial"),
    (MotorInterface::ID, MotorInterface::NAME, "serial"),
];

#[hotpath::main]
fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config);

    let level = if cli.verbose || config.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))?;

    match cli.command.as_ref().unwrap_or(&Command::Run) {
        Command::List => {
            list_interfaces();
            Ok(())
        }
        Command::Ports => {
            println!("Available serial ports:\n");
            for port in list_ports()? {
                println!("  {}", port);
            }
            Ok(())
        }
        Command::Calibrate { duration } => {
            let mut source = detection_source(&cli)?;
            run_calibrate(&config, source.as_mut(), *duration, &running)
        }
        Command::Run => {
            let active = cli.active.clone().unwrap_or_else(|| config.active.clone());
            let mut source = detection_source(&cli)?;
            run(&config, &active, source.as_mut(), &running)
        }
    }
}

fn list_interfaces() {
    println!("Available interfaces:\n");
    for (id, name, adapter) in INTERFACES {
        println!("  {:<8} {:<20} ({})", id, name, adapter);
    }
}

fn detection_source(cli: &Cli) -> Result<Box<dyn DetectionSource>> {
    match &cli.detector {
        Some(command) => {
            let mut parts = command.split_whitespace().map(String::from);
            let program = parts.next().context("--detector is empty")?;
            let args: Vec<String> = parts.collect();
            Ok(Box::new(JsonLinesSource::spawn(&program, &args)?))
        }
        None => open_input(&cli.input),
    }
}

fn run(
    config: &Config,
    active: &[String],
    source: &mut dyn DetectionSource,
    running: &AtomicBool,
) -> Result<()> {
    for id in active {
        if !INTERFACES.iter().any(|(known, _, _)| *known == id.as_str()) {
            bail!("Unknown interface '{}' (see `handmotion list`)", id);
        }
    }

    let needs = |kind: &str| {
        INTERFACES
            .iter()
            .any(|(id, _, adapter)| *adapter == kind && active.iter().any(|a| a.as_str() == *id))
    };

    let mut context = Context::new();
    if needs("cursor") {
        context.insert_cursor(MOUSE_CONTROLLER, cursor_adapter()?);
    }
    let serial = if needs("serial") {
        let serial = serial_adapter(config)?;
        context.insert_serial(ESP32_SERIAL_ADAPTER, serial.clone());
        Some(serial)
    } else {
        None
    };

    let mut manager = config.build_manager(&context)?;
    manager.set_active(active);

    let mut stats = FrameStats::new();
    let result = run_pipeline(source, &mut manager, config.target_fps, running, &mut stats);

    let result = shutdown(serial.as_ref(), result);
    println!("\n{}", stats.summary());
    result
}

fn run_calibrate(
    config: &Config,
    source: &mut dyn DetectionSource,
    duration: Option<f64>,
    running: &AtomicBool,
) -> Result<()> {
    let calibration = &config.calibration;
    let duration = duration.unwrap_or(calibration.duration_secs);

    println!(
        "Calibrating for {:.1}s: pinch repeatedly with one hand in view.",
        duration
    );
    let result = calibrate_pinch_distance(
        source,
        calibration.first_landmark,
        calibration.second_landmark,
        duration,
        frame_interval_secs(config.target_fps),
        running,
    )?;

    if result.samples == 0 {
        bail!("No usable frames: keep exactly one hand in view");
    }
    println!(
        "Average distance: {:.4} over {} frames ({:.1}s)",
        result.average_distance, result.samples, result.elapsed_secs
    );
    println!(
        "Suggested config:\n\n[gestures]\npinch_threshold = {:.4}",
        result.suggested_threshold()
    );
    Ok(())
}

fn serial_adapter(config: &Config) -> Result<SharedSerial> {
    let settings = &config.serial;
    let mut serial = SerialAdapter::new(
        &settings.name,
        &settings.port,
        settings.baud,
        settings.read_timeout(),
    );
    serial
        .open()
        .with_context(|| format!("Failed to open serial port {}", settings.port))?;
    if settings.handshake {
        serial.establish_connection(settings.handshake_attempts)?;
    }
    info!("[main] Serial adapter '{}' ready on {}", settings.name, settings.port);
    Ok(serial.shared())
}

#[cfg(feature = "cursor")]
fn cursor_adapter() -> Result<SharedCursor> {
    use handmotion::adapters::{CursorAdapter, EnigoPointer};

    let cursor = CursorAdapter::new(Box::new(EnigoPointer::new()?))?;
    let (width, height) = cursor.screen_size();
    info!("[main] Cursor adapter ready ({}x{})", width, height);
    Ok(cursor.shared())
}

#[cfg(not(feature = "cursor"))]
fn cursor_adapter() -> Result<SharedCursor> {
    bail!("The cursor interface requires building with --features cursor")
}
