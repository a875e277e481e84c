//! # VTX Device Interface
//!
//! The contract every VTX backend implements. The control loop and the menu
//! only ever talk to a `dyn VtxDevice`; adding a backend means implementing
//! this trait, nothing else.
//!
//! Getters return the last *commanded* state. Write-only hardware such as the
//! RTC6705 cannot be read back, so callers must not treat it as confirmed.

use super::settings::VtxSettings;
use super::types::{Band, Channel, DeviceType};

/// Power index meaning "transmitter off".
pub const POWER_INDEX_OFF: u8 = 0;

/// Uniform control surface over a VTX backend.
#[cfg_attr(test, mockall::automock)]
pub trait VtxDevice {
    /// Periodic tick.
    ///
    /// The first call on an unconfigured device applies `settings` to the
    /// hardware. Later calls only advance backend-specific timers.
    fn process(&mut self, now_ms: u64, settings: &VtxSettings);

    /// Identifies the backend.
    fn device_type(&self) -> DeviceType;

    /// True once the backend accepts commands.
    fn is_ready(&self) -> bool;

    /// Programs band and channel.
    ///
    /// Both must be given; if either is `None` the call is a no-op.
    fn set_band_chan(&mut self, band: Option<Band>, channel: Option<Channel>);

    /// Selects an RF power index. Index 0 is off, index `n` selects power
    /// level `n - 1`. Repeating the current index has no effect.
    fn set_power_by_index(&mut self, index: u8);

    /// Enters or leaves pit mode. Backends without pit mode ignore the call.
    fn set_pitmode(&mut self, on: bool);

    /// Last commanded band and channel.
    fn band_chan(&self) -> Option<(Band, Channel)>;

    /// Last commanded power index, 0 when the transmitter is off.
    fn power_index(&self) -> Option<u8>;

    /// Last commanded pit mode, `None` if unsupported.
    fn pitmode(&self) -> Option<bool>;
}
