use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::bthome::{self, SensorKind};
use crate::payload::{INPUT_COUNT, PayloadLayout};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct BatteryConfig {
    /// Time between supply voltage samples.
    pub period_secs: u64,
    /// Consecutive failed samples tolerated before reporting the sentinel.
    pub failure_threshold: u32,
    /// Battery value reported once the threshold is exceeded.
    pub error_sentinel: u8,
    /// Supply voltage reported as 0%.
    pub empty_millivolts: i32,
    pub millivolts_per_percent: i32,
}

impl BatteryConfig {
    /// 12 hour period, 2.5 V empty, 3.3 V full.
    pub const DEFAULT: Self = Self {
        period_secs: 12 * 60 * 60,
        failure_threshold: 10,
        error_sentinel: bthome::BATTERY_ERROR,
        empty_millivolts: 2500,
        millivolts_per_percent: 8,
    };

    pub const fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct DeviceConfig<'a> {
    /// Advertised local name.
    pub name: &'a str,
    /// BTHome info byte.
    pub info: u8,
    pub inputs: [SensorKind; INPUT_COUNT],
    pub battery: BatteryConfig,
}

impl DeviceConfig<'static> {
    pub const DEFAULT: Self = Self {
        name: "Door Sensor",
        info: bthome::DEFAULT_INFO,
        inputs: [SensorKind::Window; INPUT_COUNT],
        battery: BatteryConfig::DEFAULT,
    };
}

impl DeviceConfig<'_> {
    pub const fn layout(&self) -> PayloadLayout {
        PayloadLayout::new(self.info, self.inputs)
    }
}

impl Default for DeviceConfig<'_> {
    fn default() -> Self {
        DeviceConfig::DEFAULT
    }
}
