//! # VTX Settings
//!
//! The persisted VTX configuration record and the storage it lives in.
//!
//! Settings are stored as one versioned block (`PersistedConfig`) holding the
//! feature flags and the VTX settings. A missing block or a block written by
//! a different layout version is replaced by the declared defaults:
//!
//! | Field | Default |
//! |-------|---------|
//! | `band` | 4 (Fatshark) |
//! | `channel` | 1 |
//! | `rf_power` | 0 |
//! | `enabled` | true |

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::types::{Band, Channel};
use crate::error::Result;

/// Layout version of the persisted block.
pub const CONFIG_VERSION: u8 = 1;

/// Persisted VTX settings.
///
/// `band` and `channel` are always valid 1-based values; deserializing
/// anything else fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VtxSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_band")]
    pub band: Band,

    #[serde(default = "default_channel")]
    pub channel: Channel,

    /// 0-based RF power level (device power index minus one)
    #[serde(default)]
    pub rf_power: u8,
}

fn default_enabled() -> bool { true }
fn default_band() -> Band { Band::Fatshark }
fn default_channel() -> Channel { Channel::FIRST }

impl Default for VtxSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            band: default_band(),
            channel: default_channel(),
            rf_power: 0,
        }
    }
}

/// System feature toggles stored next to the VTX settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default = "default_feature_vtx")]
    pub vtx: bool,
}

fn default_feature_vtx() -> bool { true }

impl Default for FeatureFlags {
    fn default() -> Self {
        Self { vtx: default_feature_vtx() }
    }
}

/// Versioned configuration block written to persistent storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedConfig {
    pub version: u8,

    #[serde(default)]
    pub features: FeatureFlags,

    #[serde(default)]
    pub vtx: VtxSettings,
}

impl Default for PersistedConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            features: FeatureFlags::default(),
            vtx: VtxSettings::default(),
        }
    }
}

/// Persistent storage for the configuration block.
///
/// `load` and `commit` are atomic from the caller's point of view.
pub trait SettingsStore {
    /// Loads the stored block, or the defaults if nothing valid is stored.
    fn load(&self) -> Result<PersistedConfig>;

    /// Writes the block to storage.
    fn commit(&mut self, config: &PersistedConfig) -> Result<()>;
}

/// Stores the configuration block as a TOML file.
#[derive(Debug, Clone)]
pub struct TomlFileStore {
    path: PathBuf,
}

impl TomlFileStore {
    /// Creates a store backed by the file at `path`. The file need not exist.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlFileStore {
    fn load(&self) -> Result<PersistedConfig> {
        if !self.path.exists() {
            info!("No stored configuration at {}, using defaults", self.path.display());
            return Ok(PersistedConfig::default());
        }

        let contents = fs::read_to_string(&self.path)?;
        let config: PersistedConfig = toml::from_str(&contents)?;

        if config.version != CONFIG_VERSION {
            warn!(
                "Stored configuration version {} does not match {}, resetting to defaults",
                config.version, CONFIG_VERSION
            );
            return Ok(PersistedConfig::default());
        }

        debug!("Loaded configuration from {}", self.path.display());
        Ok(config)
    }

    fn commit(&mut self, config: &PersistedConfig) -> Result<()> {
        let contents = toml::to_string(config)?;

        // Write to a sibling file then rename so a crash never leaves a torn block
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Committed configuration to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store, used by tests and hosts without persistent storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    stored: Option<PersistedConfig>,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `config`.
    pub fn with_config(config: PersistedConfig) -> Self {
        Self { stored: Some(config), commits: 0 }
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// Last committed block, if any.
    pub fn stored(&self) -> Option<&PersistedConfig> {
        self.stored.as_ref()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<PersistedConfig> {
        Ok(self.stored.unwrap_or_default())
    }

    fn commit(&mut self, config: &PersistedConfig) -> Result<()> {
        self.stored = Some(*config);
        self.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_settings() -> VtxSettings {
        VtxSettings {
            enabled: true,
            band: Band::BoscamE,
            channel: Channel::new(5).unwrap(),
            rf_power: 1,
        }
    }

    // ==================== Default Tests ====================

    #[test]
    fn test_default_settings() {
        let settings = VtxSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.band, Band::Fatshark);
        assert_eq!(settings.channel.number(), 1);
        assert_eq!(settings.rf_power, 0);
    }

    #[test]
    fn test_default_persisted_config() {
        let config = PersistedConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.features.vtx);
        assert_eq!(config.vtx, VtxSettings::default());
    }

    // ==================== Deserialization Tests ====================

    #[test]
    fn test_settings_reject_invalid_band() {
        let result: std::result::Result<VtxSettings, _> = toml::from_str("band = 0\nchannel = 1");
        assert!(result.is_err());

        let result: std::result::Result<VtxSettings, _> = toml::from_str("band = 6\nchannel = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_reject_invalid_channel() {
        let result: std::result::Result<VtxSettings, _> = toml::from_str("band = 1\nchannel = 9");
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_missing_fields_use_defaults() {
        let settings: VtxSettings = toml::from_str("channel = 3").unwrap();
        assert_eq!(settings.band, Band::Fatshark);
        assert_eq!(settings.channel.number(), 3);
        assert!(settings.enabled);
    }

    // ==================== TomlFileStore Tests ====================

    #[test]
    fn test_file_store_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let store = TomlFileStore::new(dir.path().join("vtx.toml"));
        assert_eq!(store.load().unwrap(), PersistedConfig::default());
    }

    #[test]
    fn test_file_store_commit_then_load() {
        let dir = TempDir::new().unwrap();
        let mut store = TomlFileStore::new(dir.path().join("vtx.toml"));

        let mut config = PersistedConfig::default();
        config.vtx = sample_settings();
        config.features.vtx = false;
        store.commit(&config).unwrap();

        let reopened = TomlFileStore::new(store.path());
        assert_eq!(reopened.load().unwrap(), config);
    }

    #[test]
    fn test_file_store_version_mismatch_resets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vtx.toml");
        fs::write(
            &path,
            "version = 99\n[vtx]\nband = 1\nchannel = 2\nrf_power = 1\nenabled = false\n",
        )
        .unwrap();

        let store = TomlFileStore::new(&path);
        assert_eq!(store.load().unwrap(), PersistedConfig::default());
    }

    #[test]
    fn test_file_store_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vtx.toml");
        fs::write(&path, "version = 1\n[vtx]\nband = 9\n").unwrap();

        let store = TomlFileStore::new(&path);
        assert!(store.load().is_err());
    }

    // ==================== MemoryStore Tests ====================

    #[test]
    fn test_memory_store_counts_commits() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), PersistedConfig::default());
        assert_eq!(store.commit_count(), 0);

        let mut config = PersistedConfig::default();
        config.vtx = sample_settings();
        store.commit(&config).unwrap();

        assert_eq!(store.commit_count(), 1);
        assert_eq!(store.load().unwrap().vtx, sample_settings());
    }
}
