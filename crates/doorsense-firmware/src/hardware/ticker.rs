use doorsense_core::platform::PeriodicTimer;
use embassy_time::{Duration, Ticker};

/// Battery sampling period, driven by the embassy time driver.
pub struct BatteryTicker(Ticker);

impl BatteryTicker {
    pub fn every(period: Duration) -> Self {
        Self(Ticker::every(period))
    }
}

impl PeriodicTimer for BatteryTicker {
    async fn next(&mut self) {
        self.0.next().await
    }
}
