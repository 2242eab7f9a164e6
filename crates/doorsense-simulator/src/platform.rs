//! In-memory stand-ins for the sensor hardware

use core::convert::Infallible;
use core::future::poll_fn;
use core::task::Poll;
use std::time::{Duration, Instant};

use doorsense_core::SampleError;
use doorsense_core::platform::{AnalogInput, PeriodicTimer, Radio};
use embedded_hal::digital::{ErrorType, InputPin};
use log::info;

/// Reed contact with a settable level. High means closed.
#[derive(Debug, Clone, Copy)]
pub struct SimPin {
    pub level: bool,
}

impl SimPin {
    pub fn toggle(&mut self) {
        self.level = !self.level;
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level)
    }
}

/// Supply voltage that drops a little with every conversion.
///
/// Raw counts are millivolts.
#[derive(Debug)]
pub struct DrainingSupply {
    millivolts: u16,
    drain: u16,
    pub failing: bool,
}

impl DrainingSupply {
    pub fn new(millivolts: u16, drain: u16) -> Self {
        Self {
            millivolts,
            drain,
            failing: false,
        }
    }
}

impl AnalogInput for DrainingSupply {
    async fn sample(&mut self) -> Result<u16, SampleError> {
        if self.failing {
            return Err(SampleError::ReadFailed);
        }

        let sample = self.millivolts;
        self.millivolts = self.millivolts.saturating_sub(self.drain);
        Ok(sample)
    }

    fn raw_to_millivolts(&self, raw: u16) -> i32 {
        i32::from(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("simulated radio fault")]
pub struct RadioFault;

/// Radio that prints every advertising data update.
#[derive(Debug, Default)]
pub struct LoggingRadio {
    pub failing: bool,
    pub updates: u32,
}

impl LoggingRadio {
    fn emit(&mut self, what: &str, adv_data: &[u8]) -> Result<(), RadioFault> {
        if self.failing {
            return Err(RadioFault);
        }

        self.updates += 1;
        info!("{} [{}]: {}", what, adv_data.len(), hex(adv_data));
        Ok(())
    }
}

impl Radio for LoggingRadio {
    type Error = RadioFault;

    async fn start_advertising(&mut self, adv_data: &[u8]) -> Result<(), Self::Error> {
        self.emit("Advertising", adv_data)
    }

    async fn replace_advertising_data(&mut self, adv_data: &[u8]) -> Result<(), Self::Error> {
        self.emit("Update", adv_data)
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wall-clock period that only resolves when polled after its deadline.
///
/// The simulator polls the worker once per frame, so no waker is needed.
#[derive(Debug)]
pub struct FrameTimer {
    period: Duration,
    deadline: Instant,
}

impl FrameTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: Instant::now() + period,
        }
    }
}

impl PeriodicTimer for FrameTimer {
    async fn next(&mut self) {
        poll_fn(|_| {
            let now = Instant::now();
            if now < self.deadline {
                return Poll::Pending;
            }
            self.deadline = now + self.period;
            Poll::Ready(())
        })
        .await
    }
}
