//! Test doubles for the platform traits.

use core::convert::Infallible;
use core::future::poll_fn;
use core::task::Poll;
use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};

use crate::error::SampleError;
use crate::payload::{PAYLOAD_LEN, Payload};
use crate::platform::{AnalogInput, PeriodicTimer, Radio};

/// Returns scripted results, then fails once the script runs out.
/// Raw counts are treated as millivolts.
pub struct FakeAnalog {
    results: VecDeque<Result<u16, SampleError>>,
    pub calls: usize,
}

impl FakeAnalog {
    pub fn new(results: &[Result<u16, SampleError>]) -> Self {
        Self {
            results: results.iter().copied().collect(),
            calls: 0,
        }
    }

    pub fn failing() -> Self {
        Self::new(&[])
    }
}

impl AnalogInput for FakeAnalog {
    async fn sample(&mut self) -> Result<u16, SampleError> {
        self.calls += 1;
        self.results.pop_front().unwrap_or(Err(SampleError::ReadFailed))
    }

    fn raw_to_millivolts(&self, raw: u16) -> i32 {
        raw as i32
    }
}

#[derive(Debug)]
pub struct RadioFault;

/// Records every advertising data submission.
#[derive(Default)]
pub struct RecordingRadio {
    pub started: Option<Vec<u8>>,
    pub updates: Vec<Vec<u8>>,
    pub attempts: usize,
    pub fail_start: bool,
    pub fail_updates: bool,
}

impl RecordingRadio {
    /// Service data carried by the most recent update.
    pub fn last_payload(&self) -> Payload {
        let adv_data = self.updates.last().expect("no advertising data submitted");
        let mut bytes = [0u8; PAYLOAD_LEN];
        bytes.copy_from_slice(&adv_data[adv_data.len() - PAYLOAD_LEN..]);
        Payload::from_bytes(bytes)
    }
}

impl Radio for RecordingRadio {
    type Error = RadioFault;

    async fn start_advertising(&mut self, adv_data: &[u8]) -> Result<(), RadioFault> {
        if self.fail_start {
            return Err(RadioFault);
        }
        self.started = Some(adv_data.to_vec());
        Ok(())
    }

    async fn replace_advertising_data(&mut self, adv_data: &[u8]) -> Result<(), RadioFault> {
        self.attempts += 1;
        if self.fail_updates {
            return Err(RadioFault);
        }
        self.updates.push(adv_data.to_vec());
        Ok(())
    }
}

pub struct FakePin {
    pub level: bool,
}

impl FakePin {
    pub fn high() -> Self {
        Self { level: true }
    }

    pub fn low() -> Self {
        Self { level: false }
    }
}

impl ErrorType for FakePin {
    type Error = Infallible;
}

impl InputPin for FakePin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level)
    }
}

/// A pin whose reads always fail.
pub struct BrokenPin;

impl ErrorType for BrokenPin {
    type Error = ErrorKind;
}

impl InputPin for BrokenPin {
    fn is_high(&mut self) -> Result<bool, ErrorKind> {
        Err(ErrorKind::Other)
    }

    fn is_low(&mut self) -> Result<bool, ErrorKind> {
        Err(ErrorKind::Other)
    }
}

/// Timer that fires once per queued tick and otherwise never.
#[derive(Default)]
pub struct ManualTimer {
    pub ticks: usize,
}

impl PeriodicTimer for ManualTimer {
    async fn next(&mut self) {
        poll_fn(|_| {
            if self.ticks > 0 {
                self.ticks -= 1;
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }
}
