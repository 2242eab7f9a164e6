//! Supply voltage sampling.
//!
//! The sampler runs on the deferred worker once per [`BatteryConfig::period`].
//! A single failed conversion keeps the last reported percentage; only when
//! more than [`BatteryConfig::failure_threshold`] conversions fail in a row
//! is the battery field replaced with the error sentinel, so receivers can
//! tell a dead measurement path from an empty battery.

use log::{debug, error, info, warn};

use crate::config::BatteryConfig;
use crate::device::DeviceState;
use crate::error::SampleError;
use crate::platform::AnalogInput;

/// Map a supply voltage onto 0-100%.
///
/// Linear between `empty_millivolts` and `empty_millivolts + 100 *
/// millivolts_per_percent` (2.5 V and 3.3 V by default). This is not a
/// battery discharge curve.
///
/// A non-positive `millivolts_per_percent` has no meaningful scale and maps
/// every voltage to 0%.
pub fn millivolts_to_percent(millivolts: i32, config: &BatteryConfig) -> u8 {
    if config.millivolts_per_percent <= 0 {
        return 0;
    }

    let above_empty = millivolts.saturating_sub(config.empty_millivolts);
    above_empty
        .checked_div(config.millivolts_per_percent)
        .unwrap_or(0)
        .clamp(0, 100) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryState {
    /// Last reported value: 0-100, or the sentinel after sustained failure.
    pub percent: u8,
    /// Failed conversions since the last successful one.
    pub consecutive_failures: u32,
}

/// Result of one sampling attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Conversion succeeded and the percentage was written.
    Updated(u8),
    /// Conversion failed; the last value stays in place.
    Retained,
    /// Conversion failed once too often; the sentinel was written.
    Sentinel,
}

pub struct BatterySampler {
    config: BatteryConfig,
    state: BatteryState,
}

impl BatterySampler {
    pub const fn new(config: BatteryConfig) -> Self {
        Self {
            config,
            state: BatteryState {
                percent: 0,
                consecutive_failures: 0,
            },
        }
    }

    pub fn config(&self) -> &BatteryConfig {
        &self.config
    }

    pub fn state(&self) -> BatteryState {
        self.state
    }

    /// Attempt one conversion and update the payload.
    pub async fn sample<A: AnalogInput>(
        &mut self,
        analog: &mut A,
        device: &DeviceState,
    ) -> SampleOutcome {
        debug!("Reading ADC");

        let raw = match analog.sample().await {
            Ok(raw) => raw,
            Err(e) => return self.record_failure(e, device),
        };

        self.state.consecutive_failures = 0;
        debug!("Raw value: {}", raw);

        let millivolts = analog.raw_to_millivolts(raw);
        let percent = millivolts_to_percent(millivolts, &self.config);
        info!("New battery value: {}% ({} mV)", percent, millivolts);

        self.state.percent = percent;
        device.encoder().set_battery_field(percent);
        device.scheduler().request_broadcast();

        SampleOutcome::Updated(percent)
    }

    fn record_failure(&mut self, e: SampleError, device: &DeviceState) -> SampleOutcome {
        self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
        warn!(
            "Could not read ADC ({}), {} consecutive failures",
            e, self.state.consecutive_failures
        );

        if self.state.consecutive_failures <= self.config.failure_threshold {
            return SampleOutcome::Retained;
        }

        error!("Battery voltage unavailable, reporting error value");
        self.state.percent = self.config.error_sentinel;
        device.encoder().set_battery_field(self.config.error_sentinel);
        device.scheduler().request_broadcast();

        SampleOutcome::Sentinel
    }
}
