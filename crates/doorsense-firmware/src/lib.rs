#![no_std]

pub mod config;
pub mod hardware;

use doorsense_core::DeviceState;

pub use config::CONFIG;

/// The one device instance, shared by the GPIO interrupt and the worker task.
pub static DEVICE: DeviceState = DeviceState::new(CONFIG.layout());
