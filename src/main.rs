//! # VTX Control
//!
//! Host runner for the VTX control loop.
//!
//! Loads the configuration, restores the persisted VTX settings, binds an
//! RTC6705 whose register writes are logged, and ticks the control loop at
//! the configured rate against simulated flight-controller inputs.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release -- config/default.toml
//! ```
//!
//! Expected output:
//! ```text
//! INFO vtx_control: VTX Control v0.1.0 starting...
//! INFO vtx_control::control: Registered VTX device Rtc6705
//! INFO vtx_control: Starting control loop at 100Hz
//! INFO vtx_control::control: VTX configured at 350 ms
//! ```

use anyhow::{Context, Result};
use tokio::time::{interval, Duration, Instant};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use vtx_control::config::{Config, LoggingConfig, SimulationConfig};
use vtx_control::control::inputs::RcSnapshot;
use vtx_control::control::VtxControl;
use vtx_control::vtx::rtc6705::{Rtc6705, TracingDriver, RTC6705_POWER_LEVEL_COUNT};
use vtx_control::vtx::settings::TomlFileStore;

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Number of ticks between status log messages
const STATUS_INTERVAL_TICKS: u64 = 1000;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let _log_guard = init_logging(&config.logging);

    info!("VTX Control v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_path);

    let store = TomlFileStore::new(&config.storage.path);
    info!("Settings store: {}", store.path().display());

    let mut control = VtxControl::new(store, config.activation.clone())
        .context("Failed to read persisted VTX settings")?;

    if control.features().vtx {
        let device = Rtc6705::with_options(TracingDriver::new(), config.rtc6705.options());
        control.register_device(Box::new(device), RTC6705_POWER_LEVEL_COUNT)?;
    } else {
        info!("VTX feature disabled, no device registered");
    }

    let mut inputs = simulated_inputs(&config.simulation);
    let mut ticker = interval(Duration::from_millis(config.tick_period_ms()));
    let start = Instant::now();

    info!("Starting control loop at {}Hz", config.control.tick_rate_hz);
    info!("Press Ctrl+C to exit");

    let mut tick_count: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now_ms = start.elapsed().as_millis() as u64;
                inputs.armed = is_armed(&config.simulation, now_ms);
                control.tick(now_ms, &inputs);

                tick_count += 1;
                if tick_count % STATUS_INTERVAL_TICKS == 0 {
                    let runtime = control.runtime();
                    info!(
                        "Tick {}: band {:?} channel {:?} power index {:?} locked {}",
                        tick_count,
                        runtime.band(),
                        runtime.channel(),
                        runtime.power_index(),
                        runtime.locked()
                    );
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total ticks: {}", tick_count);
                break;
            }
        }
    }

    Ok(())
}

/// Installs the stdout subscriber and, when a directory is configured, a
/// daily-rolling file sink. The returned guard flushes the file on drop.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = match &logging.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// AUX channels from the simulation config, everything else centered.
fn simulated_inputs(simulation: &SimulationConfig) -> RcSnapshot {
    let mut inputs = RcSnapshot::default();
    for (aux_index, &value) in simulation.aux_values.iter().enumerate() {
        inputs.set_aux(aux_index as u8, value);
    }
    inputs
}

fn is_armed(simulation: &SimulationConfig, now_ms: u64) -> bool {
    simulation.arm_after_ms.is_some_and(|arm_ms| now_ms >= arm_ms)
}
