//! # VTX Module
//!
//! Video transmitter abstraction.
//!
//! This module handles:
//! - Band/channel value types and the 5.8 GHz frequency lookup
//! - The persisted VTX settings record and its storage
//! - The [`VtxDevice`](device::VtxDevice) trait every backend implements
//! - The RTC6705 backend

pub mod device;
pub mod rtc6705;
pub mod settings;
pub mod types;

pub use device::VtxDevice;
pub use settings::{FeatureFlags, PersistedConfig, SettingsStore, VtxSettings};
pub use types::{Band, Channel, DeviceType};
