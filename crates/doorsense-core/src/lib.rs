//! Hardware-independent core library for doorsense
//!
//! This crate contains the platform-agnostic half of the door/window sensor
//! firmware: the BTHome payload encoder, the battery sampler, the binary input
//! monitor, the broadcast scheduler and the deferred worker that ties them
//! together. Radio, GPIO and ADC access are expressed as traits in
//! [`platform`] and implemented by the firmware and simulator crates.
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-S3) and
//! desktop hosts (for the simulator and tests).

#![no_std]

#[cfg(test)]
extern crate std;

pub mod advertisement;
pub mod battery;
pub mod bthome;
pub mod config;
pub mod device;
pub mod error;
pub mod monitor;
pub mod payload;
pub mod platform;
pub mod scheduler;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use device::DeviceState;
pub use error::{AdvertisementError, BroadcastError, ConfigError, SampleError};
