//! # VTX Control Library
//!
//! Video transmitter control for FPV flight controllers.
//!
//! This library provides a uniform device interface over VTX hardware, an
//! RTC6705 implementation with a non-blocking boot sequence, persisted VTX
//! settings, and the control loop that applies them, switches channels from
//! AUX switches and locks changes once the craft has armed.

pub mod config;
pub mod control;
pub mod error;
pub mod menu;
pub mod vtx;
