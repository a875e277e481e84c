//! # VTX Menu Adapter
//!
//! Bridges the on-screen configuration menu and the VTX settings.
//!
//! The menu edits shadow copies of the settings, never the settings
//! themselves:
//!
//! - **on_enter** snapshots the VTX feature flag and the settings. The band
//!   is shown as a 0-based tab index into [`BAND_NAMES`].
//! - **on_exit** writes the shadow settings back (band re-based to 1) and
//!   commits them.
//! - **on_global_exit** writes the feature flag back and commits it.
//!
//! Each snapshot is written back at most once; re-entering the menu takes a
//! fresh snapshot.

use tracing::{debug, info};

use crate::control::VtxControl;
use crate::error::Result;
use crate::vtx::settings::{SettingsStore, VtxSettings};
use crate::vtx::types::{Band, Channel, BAND_COUNT, BAND_NAMES, CHANNEL_COUNT};

/// Widget type of a menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Label,
    Bool,
    /// Pick one of a fixed list of names
    Tab { names: &'static [&'static str] },
    /// Bounded integer
    UInt8 { min: u8, max: u8, step: u8 },
    Back,
}

/// One row of the VTX menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    pub kind: EntryKind,
}

/// Menu-editable copy of the VTX settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsShadow {
    pub enabled: bool,
    /// 0-based band tab index
    pub band_tab: u8,
    pub channel: u8,
    pub rf_power: u8,
}

impl SettingsShadow {
    fn from_settings(settings: &VtxSettings) -> Self {
        Self {
            enabled: settings.enabled,
            band_tab: settings.band.tab_index(),
            channel: settings.channel.number(),
            rf_power: settings.rf_power,
        }
    }

    fn to_settings(self) -> Result<VtxSettings> {
        Ok(VtxSettings {
            enabled: self.enabled,
            band: Band::from_tab_index(self.band_tab)?,
            channel: Channel::new(self.channel)?,
            rf_power: self.rf_power,
        })
    }
}

/// VTX settings menu.
#[derive(Debug)]
pub struct VtxMenu {
    power_names: &'static [&'static str],
    settings: Option<SettingsShadow>,
    feature_vtx: Option<bool>,
}

impl VtxMenu {
    /// Creates the menu for a device whose power indexes are named by
    /// `power_names` (index 0 = off).
    pub fn new(power_names: &'static [&'static str]) -> Self {
        Self {
            power_names,
            settings: None,
            feature_vtx: None,
        }
    }

    /// Highest selectable RF power level.
    fn max_rf_power(&self) -> u8 {
        (self.power_names.len() as u8).saturating_sub(2)
    }

    /// The menu layout.
    pub fn entries(&self) -> [MenuEntry; 7] {
        [
            MenuEntry { label: "--- VTX ---", kind: EntryKind::Label },
            MenuEntry { label: "FEATURE", kind: EntryKind::Bool },
            MenuEntry { label: "ENABLED", kind: EntryKind::Bool },
            MenuEntry { label: "BAND", kind: EntryKind::Tab { names: &BAND_NAMES } },
            MenuEntry {
                label: "CHANNEL",
                kind: EntryKind::UInt8 { min: 1, max: CHANNEL_COUNT, step: 1 },
            },
            MenuEntry {
                label: "RF POWER",
                kind: EntryKind::UInt8 { min: 0, max: self.max_rf_power(), step: 1 },
            },
            MenuEntry { label: "BACK", kind: EntryKind::Back },
        ]
    }

    /// Snapshots the feature flag and settings into the shadow state.
    pub fn on_enter<S: SettingsStore>(&mut self, control: &VtxControl<S>) {
        let mut shadow = SettingsShadow::from_settings(control.settings());
        shadow.rf_power = shadow.rf_power.min(self.max_rf_power());

        self.feature_vtx = Some(control.features().vtx);
        self.settings = Some(shadow);
        debug!("VTX menu entered: {:?}", self.settings);
    }

    /// Writes the shadow settings back and commits them.
    ///
    /// Returns `Ok(false)` if there was nothing to write back.
    ///
    /// # Errors
    ///
    /// Returns error if the store write fails.
    pub fn on_exit<S: SettingsStore>(&mut self, control: &mut VtxControl<S>) -> Result<bool> {
        let Some(shadow) = self.settings.take() else {
            return Ok(false);
        };
        control.write_settings(shadow.to_settings()?);
        control.commit()?;
        info!("VTX menu settings saved");
        Ok(true)
    }

    /// Writes the feature flag back and commits it.
    ///
    /// # Errors
    ///
    /// Returns error if the store write fails.
    pub fn on_global_exit<S: SettingsStore>(
        &mut self,
        control: &mut VtxControl<S>,
    ) -> Result<bool> {
        let Some(feature_vtx) = self.feature_vtx.take() else {
            return Ok(false);
        };
        control.write_feature_vtx(feature_vtx);
        control.commit()?;
        info!("VTX feature {}", if feature_vtx { "enabled" } else { "disabled" });
        Ok(true)
    }

    /// Current shadow settings, if the menu is open.
    pub fn shadow(&self) -> Option<&SettingsShadow> {
        self.settings.as_ref()
    }

    /// Current shadow feature flag, if the menu is open.
    pub fn feature_vtx(&self) -> Option<bool> {
        self.feature_vtx
    }

    pub fn set_feature_vtx(&mut self, on: bool) {
        if let Some(feature) = self.feature_vtx.as_mut() {
            *feature = on;
        }
    }

    pub fn set_enabled(&mut self, on: bool) {
        if let Some(shadow) = self.settings.as_mut() {
            shadow.enabled = on;
        }
    }

    pub fn set_band_tab(&mut self, tab: u8) {
        if let Some(shadow) = self.settings.as_mut() {
            shadow.band_tab = tab.min(BAND_COUNT - 1);
        }
    }

    pub fn set_channel(&mut self, channel: u8) {
        if let Some(shadow) = self.settings.as_mut() {
            shadow.channel = channel.clamp(1, CHANNEL_COUNT);
        }
    }

    pub fn set_rf_power(&mut self, rf_power: u8) {
        let max = self.max_rf_power();
        if let Some(shadow) = self.settings.as_mut() {
            shadow.rf_power = rf_power.min(max);
        }
    }

    /// Display name for the shadow band.
    pub fn band_name(&self) -> Option<&'static str> {
        self.settings.map(|shadow| BAND_NAMES[shadow.band_tab as usize])
    }

    /// Display name for the shadow RF power.
    pub fn power_name(&self) -> Option<&'static str> {
        self.settings
            .and_then(|shadow| self.power_names.get(shadow.rf_power as usize + 1).copied())
    }

    /// Pushes the shadow settings straight to the device so edits take effect
    /// before the menu closes.
    ///
    /// Returns false when locked, without a ready device, or outside the menu.
    ///
    /// # Errors
    ///
    /// Returns error if the shadow holds an invalid band or channel.
    pub fn apply_to_device<S: SettingsStore>(
        &self,
        control: &mut VtxControl<S>,
    ) -> Result<bool> {
        let Some(shadow) = self.settings else {
            return Ok(false);
        };
        Ok(control.apply_settings(&shadow.to_settings()?))
    }
}
