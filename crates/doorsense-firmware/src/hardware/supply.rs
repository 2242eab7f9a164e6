//! Supply voltage measurement on ADC1
//!
//! The supply is fed through a 1:2 resistor divider into GPIO1 (ADC1 channel
//! 0) at 11 dB attenuation. Curve calibration makes each conversion come back
//! in millivolts at the pin.

use doorsense_core::SampleError;
use doorsense_core::platform::AnalogInput;
use embassy_time::{Duration, Instant, Timer};
use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcCalCurve, AdcConfig, AdcPin, Attenuation};
use esp_hal::peripherals::{ADC1, GPIO1};
use log::info;

/// Ratio of the external divider between the supply and the ADC pin.
const DIVIDER_RATIO: i32 = 2;

/// Longest a single conversion may take before it counts as failed.
const CONVERSION_TIMEOUT: Duration = Duration::from_millis(10);

type SupplyPin = AdcPin<GPIO1<'static>, ADC1<'static>, AdcCalCurve<ADC1<'static>>>;

pub struct SupplyVoltage {
    adc: Adc<'static, ADC1<'static>, Blocking>,
    pin: SupplyPin,
}

impl SupplyVoltage {
    /// Set up the channel. Conversion failures, including the first one, are
    /// left to the battery sampler's failure count.
    pub fn configure(adc: ADC1<'static>, pin: GPIO1<'static>) -> Self {
        let mut config = AdcConfig::new();
        let pin =
            config.enable_pin_with_cal::<_, AdcCalCurve<ADC1<'static>>>(pin, Attenuation::_11dB);
        let adc = Adc::new(adc, config);

        info!("Configured supply voltage channel");
        Self { adc, pin }
    }
}

impl AnalogInput for SupplyVoltage {
    async fn sample(&mut self) -> Result<u16, SampleError> {
        let deadline = Instant::now() + CONVERSION_TIMEOUT;
        loop {
            match self.adc.read_oneshot(&mut self.pin) {
                Ok(millivolts) => return Ok(millivolts),
                Err(nb::Error::WouldBlock) if Instant::now() < deadline => {
                    Timer::after_micros(50).await;
                }
                Err(nb::Error::WouldBlock) => return Err(SampleError::Timeout),
                Err(nb::Error::Other(())) => return Err(SampleError::ReadFailed),
            }
        }
    }

    fn raw_to_millivolts(&self, raw: u16) -> i32 {
        i32::from(raw) * DIVIDER_RATIO
    }
}
