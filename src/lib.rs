//! DHT11 / DHT22 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the DHT11 and DHT22 (AM2302)
//! temperature and humidity sensors, built on top of the [`embedded-hal`] traits.
//!
//! # Features
//! - Blocking synchronous API
//! - Every wait on the data line is bounded. An absent sensor yields an error instead of a hang
//! - Two data line backends: open-drain pins and direction-switching pins
//! - Designed for `no_std` environments
//! - Optional logging support via `defmt` or `log`
//!
//! # Usage
//!
//! ```ignore
//! use dhtxx_sensor::{DelayTiming, OpenDrainLine, ProtocolEngine, SensorHandle, SensorVariant};
//!
//! let mut sensor = SensorHandle::new(OpenDrainLine::new(pin), SensorVariant::Dht22);
//! let mut engine = ProtocolEngine::new(DelayTiming::new(delay));
//!
//! match engine.read_sensor(&mut sensor) {
//!     Ok(reading) => last = reading,
//!     Err(err) if err.is_transient() => { /* retry on the next poll */ }
//!     Err(_) => { /* sensor missing, back off */ }
//! }
//! ```
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`InputPin`] and [`OutputPin`] for GPIO access
//! - [`DelayNs`] for accurate timing
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and logs through `defmt`
//! - `log`: Logs through the `log` facade
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

// This must go first so the macros are visible to the other modules
mod fmt;

pub mod dhtxx;
pub mod error;
pub mod frame;
pub mod handle;
pub mod line;
pub mod timing;

#[cfg(test)]
mod sim;

pub use dhtxx::ProtocolEngine;
pub use error::DhtError;
pub use frame::{FrameEncoding, RawFrame, Reading};
pub use handle::{SensorHandle, SensorVariant};
pub use line::{DataLine, DirectionalLine, Level, OpenDrainLine, PinMode, SwitchDirection};
pub use timing::{ClockTiming, DelayTiming, MicroClock, Microseconds, TimingSource};
