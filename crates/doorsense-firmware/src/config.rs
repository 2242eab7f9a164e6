//! Build-time device configuration

use doorsense_core::config::DeviceConfig;

/// Advertised name, baked in by the build script from `DOORSENSE_DEVICE_NAME`.
pub const DEVICE_NAME: &str = env!("DOORSENSE_DEVICE_NAME");

pub const CONFIG: DeviceConfig<'static> = DeviceConfig {
    name: DEVICE_NAME,
    ..DeviceConfig::DEFAULT
};
