//! # RTC6705 Backend
//!
//! [`VtxDevice`] implementation for RTC6705-based transmitters.
//!
//! The RTC6705 is programmed over a write-only SPI link, so everything the
//! getters return is the last commanded value.
//!
//! ## Boot Sequence
//!
//! ```text
//! Unconfigured --process, enabled--> EnablePending(deadline) --deadline--> Configured
//!      |                                                                      ^
//!      +--------------------------process, disabled---------------------------+
//! ```
//!
//! After the chip is enabled the PLL needs a settle delay before power and
//! frequency registers latch reliably. Instead of blocking the tick, the
//! device waits in `EnablePending` and finishes the sequence on the first
//! tick at or past the deadline. [`VtxDevice::is_ready`] is false until then.
//!
//! ## Power Indexes
//!
//! | Index | Name | Effect |
//! |-------|------|--------|
//! | 0 | `---` | Transmitter off (requires a power switch) |
//! | 1 | `25` | RF level 0 |
//! | 2 | `200` | RF level 1 |

use tracing::{debug, info};

use super::device::{VtxDevice, POWER_INDEX_OFF};
use super::settings::VtxSettings;
use super::types::{frequency_mhz, Band, Channel, DeviceType};

/// Default PLL settle time after enabling the chip, in milliseconds.
pub const RTC6705_BOOT_DELAY_MS: u64 = 350;

/// Number of non-zero RF power levels.
pub const RTC6705_POWER_LEVEL_COUNT: u8 = 2;

/// Menu names for each power index.
pub const RTC6705_POWER_NAMES: [&str; RTC6705_POWER_LEVEL_COUNT as usize + 1] =
    ["---", "25", "200"];

/// Register-level primitives for the RTC6705 chip.
///
/// Writes are fire-and-forget; the bus has no failure channel.
pub trait Rtc6705Driver {
    /// Powers up the transmitter.
    fn enable(&mut self);

    /// Powers down the transmitter.
    fn disable(&mut self);

    /// Programs the synthesizer. Both indexes are 0-based.
    fn set_channel(&mut self, band_index: u8, channel_index: u8);

    /// Programs the 0-based RF power level.
    fn set_rf_power(&mut self, level: u8);
}

/// Driver that logs every register write instead of touching hardware.
///
/// Used by the host binary.
#[derive(Debug, Default)]
pub struct TracingDriver {
    writes: u64,
}

impl TracingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of primitive calls issued so far.
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl Rtc6705Driver for TracingDriver {
    fn enable(&mut self) {
        self.writes += 1;
        debug!("RTC6705: enable");
    }

    fn disable(&mut self) {
        self.writes += 1;
        debug!("RTC6705: disable");
    }

    fn set_channel(&mut self, band_index: u8, channel_index: u8) {
        self.writes += 1;
        match (
            Band::try_from(band_index.saturating_add(1)),
            Channel::new(channel_index.saturating_add(1)),
        ) {
            (Ok(band), Ok(channel)) => debug!(
                "RTC6705: set channel {}:{} ({} MHz)",
                band.name(),
                channel.number(),
                frequency_mhz(band, channel)
            ),
            _ => debug!("RTC6705: set channel {}:{}", band_index, channel_index),
        }
    }

    fn set_rf_power(&mut self, level: u8) {
        self.writes += 1;
        debug!("RTC6705: set RF power level {}", level);
    }
}

/// Hardware options for an RTC6705 module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rtc6705Options {
    /// PLL settle delay after enable
    pub boot_delay_ms: u64,
    /// Whether the board can cut power to the transmitter
    pub power_switch: bool,
}

impl Default for Rtc6705Options {
    fn default() -> Self {
        Self {
            boot_delay_ms: RTC6705_BOOT_DELAY_MS,
            power_switch: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unconfigured,
    EnablePending { deadline_ms: u64 },
    Configured,
}

/// RTC6705 video transmitter.
#[derive(Debug)]
pub struct Rtc6705<D: Rtc6705Driver> {
    driver: D,
    options: Rtc6705Options,
    phase: Phase,
    band: Band,
    channel: Channel,
    /// 0-based RF level
    rf_power: u8,
    enabled: bool,
    now_ms: u64,
}

impl<D: Rtc6705Driver> Rtc6705<D> {
    /// Creates an unconfigured device with default options.
    pub fn new(driver: D) -> Self {
        Self::with_options(driver, Rtc6705Options::default())
    }

    pub fn with_options(driver: D, options: Rtc6705Options) -> Self {
        Self {
            driver,
            options,
            phase: Phase::Unconfigured,
            band: Band::Fatshark,
            channel: Channel::FIRST,
            rf_power: 0,
            enabled: false,
            now_ms: 0,
        }
    }

    /// Access to the underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn begin_enable(&mut self) {
        self.driver.enable();
        let deadline_ms = self.now_ms.saturating_add(self.options.boot_delay_ms);
        self.phase = Phase::EnablePending { deadline_ms };
        debug!("RTC6705 enabled, settling until {} ms", deadline_ms);
    }

    fn finish_enable(&mut self) {
        self.driver.set_rf_power(self.rf_power);
        self.driver.set_channel(self.band.tab_index(), self.channel.number() - 1);
        self.enabled = true;
        self.phase = Phase::Configured;
        info!(
            "RTC6705 on: {} CH{} ({} MHz), power {}",
            self.band.name(),
            self.channel.number(),
            frequency_mhz(self.band, self.channel),
            RTC6705_POWER_NAMES[self.rf_power as usize + 1]
        );
    }

    fn poll_enable(&mut self) {
        if let Phase::EnablePending { deadline_ms } = self.phase {
            if self.now_ms >= deadline_ms {
                self.finish_enable();
            }
        }
    }

    fn is_pending(&self) -> bool {
        matches!(self.phase, Phase::EnablePending { .. })
    }
}

impl<D: Rtc6705Driver> VtxDevice for Rtc6705<D> {
    fn process(&mut self, now_ms: u64, settings: &VtxSettings) {
        self.now_ms = now_ms;

        if self.phase == Phase::Unconfigured {
            self.band = settings.band;
            self.channel = settings.channel;
            self.rf_power = settings.rf_power.min(RTC6705_POWER_LEVEL_COUNT - 1);

            if settings.enabled {
                self.begin_enable();
            } else {
                self.driver.disable();
                self.enabled = false;
                self.phase = Phase::Configured;
                info!("RTC6705 configured off");
            }
        }

        self.poll_enable();
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::Rtc6705
    }

    fn is_ready(&self) -> bool {
        self.phase == Phase::Configured
    }

    fn set_band_chan(&mut self, band: Option<Band>, channel: Option<Channel>) {
        let (Some(band), Some(channel)) = (band, channel) else {
            return;
        };
        if self.phase == Phase::Unconfigured {
            debug!("RTC6705 not configured yet, ignoring band/channel change");
            return;
        }

        self.band = band;
        self.channel = channel;

        // Pending or powered-off devices pick this up when enable completes
        if self.phase == Phase::Configured && self.enabled {
            self.driver.set_channel(self.band.tab_index(), self.channel.number() - 1);
        }
    }

    fn set_power_by_index(&mut self, index: u8) {
        if self.phase == Phase::Unconfigured {
            debug!("RTC6705 not configured yet, ignoring power change");
            return;
        }

        let index = index.min(RTC6705_POWER_LEVEL_COUNT);
        if self.power_index() == Some(index) {
            return;
        }

        if index == POWER_INDEX_OFF {
            if !self.options.power_switch {
                debug!("RTC6705 has no power switch, ignoring power off");
                return;
            }
            self.driver.disable();
            self.enabled = false;
            self.phase = Phase::Configured;
            return;
        }

        self.rf_power = index - 1;
        if self.is_pending() {
            return;
        }
        if self.enabled {
            self.driver.set_rf_power(self.rf_power);
        } else {
            self.begin_enable();
            self.poll_enable();
        }
    }

    fn set_pitmode(&mut self, on: bool) {
        debug!("RTC6705 has no pit mode, ignoring request ({})", on);
    }

    fn band_chan(&self) -> Option<(Band, Channel)> {
        match self.phase {
            Phase::Unconfigured => None,
            _ => Some((self.band, self.channel)),
        }
    }

    fn power_index(&self) -> Option<u8> {
        match self.phase {
            Phase::Unconfigured => None,
            _ if self.enabled || self.is_pending() => Some(self.rf_power + 1),
            _ => Some(POWER_INDEX_OFF),
        }
    }

    fn pitmode(&self) -> Option<bool> {
        None
    }
}
