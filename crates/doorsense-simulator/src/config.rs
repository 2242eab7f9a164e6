//! Simulator configuration, optionally loaded from a TOML file

use std::path::Path;

use doorsense_core::bthome::{self, SensorKind};
use doorsense_core::config::{BatteryConfig, DeviceConfig};
use doorsense_core::payload::INPUT_COUNT;
use log::info;
use serde::Deserialize;

/// Owned counterpart of [`DeviceConfig`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub name: String,
    pub info: u8,
    pub inputs: [SensorKind; INPUT_COUNT],
    pub battery: BatteryConfig,
    /// Supply voltage at start, in millivolts.
    pub initial_millivolts: u16,
    /// Supply drop per battery period, in millivolts.
    pub drain_millivolts: u16,
}

impl Default for SimConfig {
    fn default() -> Self {
        let device = DeviceConfig::DEFAULT;
        Self {
            name: device.name.to_string(),
            info: bthome::DEFAULT_INFO,
            inputs: device.inputs,
            battery: BatteryConfig {
                // Twelve hours is a long wait at a desk
                period_secs: 30,
                ..BatteryConfig::DEFAULT
            },
            initial_millivolts: 3200,
            drain_millivolts: 25,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Longest battery period accepted, 30 days.
pub const MAX_PERIOD_SECS: u64 = 30 * 24 * 60 * 60;

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigLoadError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let battery = &self.battery;
        if battery.millivolts_per_percent <= 0 {
            return Err(ConfigLoadError::Invalid {
                field: "battery.millivolts_per_percent",
                reason: "must be greater than 0",
            });
        }
        if battery.period_secs == 0 || battery.period_secs > MAX_PERIOD_SECS {
            return Err(ConfigLoadError::Invalid {
                field: "battery.period_secs",
                reason: "must be between 1 and 30 days in seconds",
            });
        }
        if !(0..=i32::from(u16::MAX)).contains(&battery.empty_millivolts) {
            return Err(ConfigLoadError::Invalid {
                field: "battery.empty_millivolts",
                reason: "must be between 0 and 65535",
            });
        }
        Ok(())
    }

    pub fn device(&self) -> DeviceConfig<'_> {
        DeviceConfig {
            name: &self.name,
            info: self.info,
            inputs: self.inputs,
            battery: self.battery,
        }
    }
}
