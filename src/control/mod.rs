//! # Control Module
//!
//! The VTX control loop.
//!
//! [`VtxControl`] is the single context object owning everything the loop
//! touches: the registered device, the persisted configuration and its
//! store, the activation table and the runtime state. It is built once at
//! startup and driven by [`VtxControl::tick`] from a fixed-period scheduler.
//!
//! ## Tick
//!
//! 1. Forward the tick to the device. The first tick applies the persisted
//!    settings to the hardware; the device reports ready once done.
//! 2. On the first tick the device reports ready, mirror its commanded state
//!    into [`VtxRuntimeState`] and mark it configured.
//! 3. Run the channel-activation matcher, unless changes are locked.
//!
//! ## Arming Lock
//!
//! Seeing the craft armed once locks every VTX change from the matcher and
//! from the increment/cycle operations until reboot. Locked calls are silent
//! no-ops.

pub mod activation;
pub mod button;
pub mod inputs;
pub mod lock;

use tracing::{debug, info, warn};

use crate::error::{Result, VtxError};
use crate::vtx::device::{VtxDevice, POWER_INDEX_OFF};
use crate::vtx::settings::{FeatureFlags, PersistedConfig, SettingsStore, VtxSettings};
use crate::vtx::types::{frequency_mhz, Band, Channel};

use activation::{ActivationConditions, ActivationMatcher};
use button::ButtonAction;
use inputs::FlightInputs;
use lock::ArmingLock;

/// State derived at runtime and never persisted.
#[derive(Debug, Default)]
pub struct VtxRuntimeState {
    band: Option<Band>,
    channel: Option<Channel>,
    power_index: Option<u8>,
    enabled: bool,
    configured_once: bool,
    lock: ArmingLock,
}

impl VtxRuntimeState {
    /// Last band pushed to the device.
    pub fn band(&self) -> Option<Band> {
        self.band
    }

    /// Last channel pushed to the device.
    pub fn channel(&self) -> Option<Channel> {
        self.channel
    }

    pub fn power_index(&self) -> Option<u8> {
        self.power_index
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// True once the persisted settings have been applied.
    pub fn configured_once(&self) -> bool {
        self.configured_once
    }

    /// True once the craft has been armed since boot.
    pub fn locked(&self) -> bool {
        self.lock.is_locked()
    }

    fn refresh(&mut self, device: &dyn VtxDevice) {
        if let Some((band, channel)) = device.band_chan() {
            self.band = Some(band);
            self.channel = Some(channel);
        }
        self.power_index = device.power_index();
        self.enabled = self.power_index.is_some_and(|index| index != POWER_INDEX_OFF);
    }
}

/// VTX control context.
pub struct VtxControl<S: SettingsStore> {
    store: S,
    config: PersistedConfig,
    conditions: ActivationConditions,
    device: Option<Box<dyn VtxDevice>>,
    power_level_count: u8,
    runtime: VtxRuntimeState,
    matcher: ActivationMatcher,
}

impl<S: SettingsStore> std::fmt::Debug for VtxControl<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VtxControl")
            .field("config", &self.config)
            .field("conditions", &self.conditions)
            .field("runtime", &self.runtime)
            .finish_non_exhaustive()
    }
}

impl<S: SettingsStore> VtxControl<S> {
    /// Loads the persisted configuration from `store` and builds the context.
    ///
    /// No device is bound yet; ticks are no-ops until
    /// [`register_device`](Self::register_device) is called.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    pub fn new(store: S, conditions: ActivationConditions) -> Result<Self> {
        let config = store.load()?;
        info!(
            "VTX settings: {} CH{} power {} {}",
            config.vtx.band.name(),
            config.vtx.channel.number(),
            config.vtx.rf_power,
            if config.vtx.enabled { "enabled" } else { "disabled" }
        );

        Ok(Self {
            store,
            config,
            conditions,
            device: None,
            power_level_count: 0,
            runtime: VtxRuntimeState::default(),
            matcher: ActivationMatcher::new(),
        })
    }

    /// Binds the VTX device. Only one device can ever be registered.
    ///
    /// `power_level_count` is the number of non-zero power levels the device
    /// exposes.
    ///
    /// # Errors
    ///
    /// Returns [`VtxError::DeviceAlreadyRegistered`] on a second call.
    pub fn register_device(
        &mut self,
        device: Box<dyn VtxDevice>,
        power_level_count: u8,
    ) -> Result<()> {
        if self.device.is_some() {
            return Err(VtxError::DeviceAlreadyRegistered);
        }
        info!("Registered VTX device {:?}", device.device_type());
        self.device = Some(device);
        self.power_level_count = power_level_count;
        self.clamp_rf_power();
        Ok(())
    }

    pub fn device(&self) -> Option<&dyn VtxDevice> {
        self.device.as_deref()
    }

    pub fn settings(&self) -> &VtxSettings {
        &self.config.vtx
    }

    pub fn features(&self) -> &FeatureFlags {
        &self.config.features
    }

    pub fn runtime(&self) -> &VtxRuntimeState {
        &self.runtime
    }

    pub fn conditions(&self) -> &ActivationConditions {
        &self.conditions
    }

    pub fn power_level_count(&self) -> u8 {
        self.power_level_count
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replaces the in-memory VTX settings. Call [`commit`](Self::commit) to persist.
    pub fn write_settings(&mut self, settings: VtxSettings) {
        self.config.vtx = settings;
    }

    /// Sets the VTX feature flag. Call [`commit`](Self::commit) to persist.
    pub fn write_feature_vtx(&mut self, enabled: bool) {
        self.config.features.vtx = enabled;
    }

    /// Writes the configuration block to the store.
    ///
    /// # Errors
    ///
    /// Returns error if the store write fails.
    pub fn commit(&mut self) -> Result<()> {
        self.store.commit(&self.config)
    }

    /// Re-reads the configuration block from the store.
    ///
    /// Already-applied hardware state is not touched.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    pub fn reload(&mut self) -> Result<()> {
        self.config = self.store.load()?;
        self.clamp_rf_power();
        Ok(())
    }

    /// Keeps the stored RF power within the registered device's levels.
    fn clamp_rf_power(&mut self) {
        if self.device.is_none() {
            return;
        }
        let max = self.power_level_count.saturating_sub(1);
        if self.config.vtx.rf_power > max {
            warn!("Stored RF power {} out of range, using {}", self.config.vtx.rf_power, max);
            self.config.vtx.rf_power = max;
        }
    }

    /// Pushes `settings` to the device without persisting them.
    ///
    /// Returns false when locked or without a ready device.
    pub fn apply_settings(&mut self, settings: &VtxSettings) -> bool {
        if self.runtime.locked() {
            return false;
        }
        let Some(device) = self.device.as_deref_mut() else {
            return false;
        };
        if !device.is_ready() {
            return false;
        }

        device.set_band_chan(Some(settings.band), Some(settings.channel));
        device.set_power_by_index(power_index_for(settings));
        self.runtime.refresh(device);
        true
    }

    /// Runs one control-loop iteration.
    pub fn tick(&mut self, now_ms: u64, inputs: &dyn FlightInputs) {
        let Some(device) = self.device.as_deref_mut() else {
            return;
        };

        device.process(now_ms, &self.config.vtx);

        if !self.runtime.configured_once && device.is_ready() {
            self.runtime.configured_once = true;
            self.runtime.refresh(device);
            info!("VTX configured at {} ms", now_ms);
        }

        self.update_activated_channel(inputs);
    }

    /// Applies the activation condition matching the current AUX values.
    ///
    /// Skipped while locked or while the device is not ready.
    pub fn update_activated_channel(&mut self, inputs: &dyn FlightInputs) {
        if self.runtime.lock.observe(inputs.is_armed()) {
            return;
        }
        let Some(device) = self.device.as_deref_mut() else {
            return;
        };
        if !device.is_ready() {
            return;
        }

        if let Some((index, condition)) = self.matcher.update(&self.conditions, inputs) {
            device.set_band_chan(Some(condition.band), Some(condition.channel));
            self.runtime.refresh(device);
            info!(
                "Activation condition {} selected {} CH{} ({} MHz)",
                index,
                condition.band.name(),
                condition.channel.number(),
                frequency_mhz(condition.band, condition.channel)
            );
        }
    }

    pub fn increment_band(&mut self, inputs: &dyn FlightInputs) -> Result<bool> {
        self.change_and_save(inputs, |s| s.band = s.band.saturating_next())
    }

    pub fn decrement_band(&mut self, inputs: &dyn FlightInputs) -> Result<bool> {
        self.change_and_save(inputs, |s| s.band = s.band.saturating_prev())
    }

    pub fn increment_channel(&mut self, inputs: &dyn FlightInputs) -> Result<bool> {
        self.change_and_save(inputs, |s| s.channel = s.channel.saturating_next())
    }

    pub fn decrement_channel(&mut self, inputs: &dyn FlightInputs) -> Result<bool> {
        self.change_and_save(inputs, |s| s.channel = s.channel.saturating_prev())
    }

    pub fn cycle_band(&mut self, inputs: &dyn FlightInputs) -> Result<bool> {
        self.change_and_save(inputs, |s| s.band = s.band.wrapping_next())
    }

    pub fn cycle_channel(&mut self, inputs: &dyn FlightInputs) -> Result<bool> {
        self.change_and_save(inputs, |s| s.channel = s.channel.wrapping_next())
    }

    pub fn cycle_rf_power(&mut self, inputs: &dyn FlightInputs) -> Result<bool> {
        let levels = self.power_level_count.max(1);
        self.change_and_save(inputs, |s| s.rf_power = s.rf_power.saturating_add(1) % levels)
    }

    pub fn toggle_power(&mut self, inputs: &dyn FlightInputs) -> Result<bool> {
        self.change_and_save(inputs, |s| s.enabled = !s.enabled)
    }

    /// Persists the currently commanded state.
    pub fn save_state(&mut self, inputs: &dyn FlightInputs) -> Result<bool> {
        self.change_and_save(inputs, |_| {})
    }

    /// Performs the action selected by a button press.
    pub fn handle_button(
        &mut self,
        action: ButtonAction,
        inputs: &dyn FlightInputs,
    ) -> Result<bool> {
        debug!("VTX button action {:?}", action);
        match action {
            ButtonAction::CycleChannel => self.cycle_channel(inputs),
            ButtonAction::CycleBand => self.cycle_band(inputs),
            ButtonAction::CycleRfPower => self.cycle_rf_power(inputs),
            ButtonAction::TogglePower => self.toggle_power(inputs),
            ButtonAction::SaveState => self.save_state(inputs),
        }
    }

    /// Applies `change` to the commanded state, pushes the difference to the
    /// device and commits the result.
    ///
    /// Returns `Ok(false)` without touching device or store when locked or
    /// when the device is not ready, and without committing when the device
    /// does not end up in the requested state.
    fn change_and_save<F>(&mut self, inputs: &dyn FlightInputs, change: F) -> Result<bool>
    where
        F: FnOnce(&mut VtxSettings),
    {
        if self.runtime.lock.observe(inputs.is_armed()) {
            debug!("VTX change ignored, locked");
            return Ok(false);
        }
        let device = self.device.as_deref_mut().ok_or(VtxError::NoDevice)?;
        if !device.is_ready() {
            warn!("VTX not ready, change deferred");
            return Ok(false);
        }

        let current = commanded_settings(device, &self.config.vtx);
        let mut next = current;
        change(&mut next);

        if next.band != current.band || next.channel != current.channel {
            device.set_band_chan(Some(next.band), Some(next.channel));
        }
        if next.enabled != current.enabled || next.rf_power != current.rf_power {
            device.set_power_by_index(power_index_for(&next));
        }
        self.runtime.refresh(device);

        if commanded_settings(device, &next) != next {
            warn!("VTX did not accept change, not saved");
            return Ok(false);
        }

        self.config.vtx = next;
        self.store.commit(&self.config)?;
        info!(
            "VTX saved: {} CH{} power {} {}",
            next.band.name(),
            next.channel.number(),
            next.rf_power,
            if next.enabled { "enabled" } else { "disabled" }
        );
        Ok(true)
    }
}

/// Power index commanding `settings`.
fn power_index_for(settings: &VtxSettings) -> u8 {
    if settings.enabled {
        settings.rf_power.saturating_add(1)
    } else {
        POWER_INDEX_OFF
    }
}

/// Overlays what the device reports as commanded onto the stored settings.
fn commanded_settings(device: &dyn VtxDevice, stored: &VtxSettings) -> VtxSettings {
    let mut settings = *stored;
    if let Some((band, channel)) = device.band_chan() {
        settings.band = band;
        settings.channel = channel;
    }
    match device.power_index() {
        Some(POWER_INDEX_OFF) => settings.enabled = false,
        Some(index) => {
            settings.enabled = true;
            settings.rf_power = index - 1;
        }
        None => {}
    }
    settings
}
