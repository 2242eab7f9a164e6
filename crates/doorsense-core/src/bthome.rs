//! BTHome v2 constants used by the sensor payload.
//!
//! See <https://bthome.io/format/> for the full object table. Only the
//! objects this device reports are listed here.

use serde::{Deserialize, Serialize};

/// 16-bit service UUID assigned to BTHome.
pub const SERVICE_UUID: u16 = 0xFCD2;

pub const INFO_VERSION: u8 = 0x40;
pub const INFO_REGULAR_INTERVAL: u8 = 0x00;
pub const INFO_IRREGULAR_INTERVAL: u8 = 0x04;
pub const INFO_ENCRYPTED_DATA: u8 = 0x01;
pub const INFO_UNENCRYPTED_DATA: u8 = 0x00;

/// Info byte for an unencrypted, event-driven (irregular interval) device.
pub const DEFAULT_INFO: u8 = INFO_VERSION | INFO_IRREGULAR_INTERVAL | INFO_UNENCRYPTED_DATA;

pub const OBJECT_BATTERY: u8 = 0x01;
pub const OBJECT_BINARY_BATTERY: u8 = 0x15;
pub const OBJECT_BINARY_DOOR: u8 = 0x1A;
pub const OBJECT_BINARY_WINDOW: u8 = 0x2D;

pub const VALUE_CLOSED: u8 = 0x00;
pub const VALUE_OPEN: u8 = 0x01;

/// Reported in the battery object when the supply voltage cannot be read.
///
/// BTHome does not define an error value for the battery percentage. 0xFF is
/// outside the 0-100 range but has not been confirmed against receivers yet,
/// so it is only the default for [`crate::config::BatteryConfig::error_sentinel`].
pub const BATTERY_ERROR: u8 = 0xFF;

/// The kind of binary contact wired to an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Door,
    Window,
}

impl SensorKind {
    /// BTHome object id reported for this kind of sensor.
    pub const fn object_id(self) -> u8 {
        match self {
            Self::Door => OBJECT_BINARY_DOOR,
            Self::Window => OBJECT_BINARY_WINDOW,
        }
    }
}
