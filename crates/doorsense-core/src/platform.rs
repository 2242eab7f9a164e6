//! Capabilities the pipeline needs from the platform.
//!
//! The firmware implements these on top of esp-hal and esp-radio, the
//! simulator with in-memory stand-ins. Binary inputs are read through
//! [`embedded_hal::digital::InputPin`] directly; [`EdgeLatch`] is only needed
//! where an interrupt handler services them.

use core::fmt::Debug;

use crate::error::SampleError;

/// BLE advertiser.
pub trait Radio {
    type Error: Debug;

    /// Start advertising `adv_data`. Called once, at start-up.
    fn start_advertising(
        &mut self,
        adv_data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Replace the data of the running advertising set.
    fn replace_advertising_data(
        &mut self,
        adv_data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>>;
}

/// Input whose edge interrupt latches a pending flag until cleared.
pub trait EdgeLatch {
    /// Clear the latched edge, returning whether one was pending.
    fn take_edge(&mut self) -> bool;
}

/// Supply voltage measurement channel.
///
/// The platform is responsible for bounding the conversion time; a
/// conversion that does not complete reports [`SampleError::Timeout`].
pub trait AnalogInput {
    /// Trigger one conversion and return the raw counts.
    fn sample(&mut self) -> impl Future<Output = Result<u16, SampleError>>;

    /// Convert raw counts to millivolts using the channel's calibration.
    fn raw_to_millivolts(&self, raw: u16) -> i32;
}

/// Source of the battery sampling period.
pub trait PeriodicTimer {
    /// Resolve at the next period boundary.
    fn next(&mut self) -> impl Future<Output = ()>;
}
