//! # Configuration Module
//!
//! Handles loading and validating the host configuration from TOML files.
//!
//! Every section is optional; missing sections and fields take their
//! defaults. The channel-activation table is given as an array of
//! `[[activation]]` tables:
//!
//! ```toml
//! [[activation]]
//! aux_channel_index = 0
//! range = { low = 1700, high = 2100 }
//! band = 5
//! channel = 1
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::control::activation::{ActivationConditions, CHANNEL_RANGE_MAX, CHANNEL_RANGE_MIN};
use crate::error::{Result, VtxError};
use crate::vtx::rtc6705::Rtc6705Options;

/// Number of AUX channels an activation condition can refer to.
pub const MAX_AUX_CHANNEL_COUNT: u8 = 14;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub rtc6705: Rtc6705Config,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub activation: ActivationConditions,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,
}

/// RTC6705 driver configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Rtc6705Config {
    #[serde(default = "default_boot_delay_ms")]
    pub boot_delay_ms: u64,

    /// Whether the module's supply can be switched off
    #[serde(default = "default_power_switch")]
    pub power_switch: bool,
}

/// Persistent settings storage
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: String,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Directory for daily log files; stdout only when unset
    #[serde(default)]
    pub dir: Option<String>,

    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
}

/// Simulated flight-controller inputs for the host binary
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SimulationConfig {
    /// AUX channel values in microseconds, AUX1 first
    #[serde(default)]
    pub aux_values: Vec<u16>,

    /// Arm the simulated craft after this many milliseconds
    #[serde(default)]
    pub arm_after_ms: Option<u64>,
}

// Default value functions
fn default_tick_rate_hz() -> u32 { 100 }

fn default_boot_delay_ms() -> u64 { crate::vtx::rtc6705::RTC6705_BOOT_DELAY_MS }
fn default_power_switch() -> bool { true }

fn default_storage_path() -> String { "./vtx_settings.toml".to_string() }

fn default_log_file_prefix() -> String { "vtx-control.log".to_string() }

impl Default for ControlConfig {
    fn default() -> Self {
        Self { tick_rate_hz: default_tick_rate_hz() }
    }
}

impl Default for Rtc6705Config {
    fn default() -> Self {
        Self {
            boot_delay_ms: default_boot_delay_ms(),
            power_switch: default_power_switch(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { path: default_storage_path() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { dir: None, file_prefix: default_log_file_prefix() }
    }
}

impl Rtc6705Config {
    pub fn options(&self) -> Rtc6705Options {
        Rtc6705Options {
            boot_delay_ms: self.boot_delay_ms,
            power_switch: self.power_switch,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails (including more than 10 activation conditions)
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vtx_control::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but falls back to defaults when the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns error if an existing file is unreadable or invalid.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Milliseconds between control-loop ticks
    pub fn tick_period_ms(&self) -> u64 {
        (1000 / self.control.tick_rate_hz.max(1)).max(1) as u64
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.control.tick_rate_hz == 0 || self.control.tick_rate_hz > 1000 {
            return Err(invalid("tick_rate_hz must be between 1 and 1000"));
        }

        if self.rtc6705.boot_delay_ms > 10_000 {
            return Err(invalid("boot_delay_ms must be at most 10000"));
        }

        if self.storage.path.is_empty() {
            return Err(invalid("storage path cannot be empty"));
        }

        if self.logging.dir.as_deref().is_some_and(str::is_empty) {
            return Err(invalid("logging dir cannot be empty when set"));
        }

        if self.logging.file_prefix.is_empty() {
            return Err(invalid("logging file_prefix cannot be empty"));
        }

        for (index, condition) in self.activation.iter().enumerate() {
            if condition.aux_channel_index >= MAX_AUX_CHANNEL_COUNT {
                return Err(invalid(format!(
                    "activation {} aux_channel_index {} is out of bounds (must be 0-{})",
                    index,
                    condition.aux_channel_index,
                    MAX_AUX_CHANNEL_COUNT - 1
                )));
            }

            let range = condition.range;
            if !range.is_usable()
                || range.low < CHANNEL_RANGE_MIN
                || range.high > CHANNEL_RANGE_MAX
            {
                return Err(invalid(format!(
                    "activation {} range {}-{} must satisfy {} <= low <= high <= {}",
                    index, range.low, range.high, CHANNEL_RANGE_MIN, CHANNEL_RANGE_MAX
                )));
            }
        }

        if self.simulation.aux_values.len() > MAX_AUX_CHANNEL_COUNT as usize {
            return Err(invalid(format!(
                "simulation aux_values has more than {} entries",
                MAX_AUX_CHANNEL_COUNT
            )));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> VtxError {
    VtxError::InvalidConfig(message.into())
}
