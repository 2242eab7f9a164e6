//! Error types shared by the pipeline and the platform layers

use thiserror_no_std::Error;

/// Fatal start-up errors. Any of these aborts start-up before the worker is
/// spawned; there is no partially configured mode.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("input {index} is not ready")]
    InputNotReady { index: usize },
    #[error("edge interrupt rejected on input {index}")]
    InterruptRejected { index: usize },
    #[error("analog controller is not ready")]
    AnalogNotReady,
    #[error("analog channel setup rejected")]
    ChannelRejected,
    #[error("radio initialization failed")]
    RadioInit,
}

/// A single failed analog conversion. Absorbed by the battery sampler.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    #[error("analog read failed")]
    ReadFailed,
    #[error("analog read timed out")]
    Timeout,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisementError {
    #[error("advertising data needs {needed} bytes, only {available} available")]
    TooLong { needed: usize, available: usize },
}

/// Failure to hand the current payload to the radio. Logged and dropped; the
/// next broadcast request tries again.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("radio rejected advertising data")]
    Radio,
    #[error("advertisement framing failed: {0}")]
    Advertisement(AdvertisementError),
}

impl From<AdvertisementError> for BroadcastError {
    fn from(value: AdvertisementError) -> Self {
        Self::Advertisement(value)
    }
}
