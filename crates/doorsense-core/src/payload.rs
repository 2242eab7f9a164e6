//! Fixed-layout BTHome service data buffer.
//!
//! Binary format (little-endian):
//! - service UUID: 2 bytes
//! - info byte: 1 byte
//! - one `(object id, value)` pair per input
//! - `(battery object id, percent)` when the `battery` feature is enabled
//!
//! The layout is written once at construction. Afterwards only value bytes
//! change, in place, so the buffer never needs re-framing. Every value byte
//! has exactly one writer (an input's edge handler or the battery sampler),
//! which is what lets the buffer be shared with interrupt context without a
//! lock: stores use release ordering and [`PayloadEncoder::snapshot`] loads
//! with acquire ordering.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::bthome::{self, SensorKind};

/// Number of binary inputs monitored by the device.
pub const INPUT_COUNT: usize = 2;

const HEADER_LEN: usize = 3;
const OBJECT_LEN: usize = 2;

#[cfg(feature = "battery")]
const OBJECT_COUNT: usize = INPUT_COUNT + 1;
#[cfg(not(feature = "battery"))]
const OBJECT_COUNT: usize = INPUT_COUNT;

/// Total length of the service data, UUID included.
pub const PAYLOAD_LEN: usize = HEADER_LEN + OBJECT_COUNT * OBJECT_LEN;

#[cfg(feature = "battery")]
pub const BATTERY_OBJECT_OFFSET: usize = HEADER_LEN + INPUT_COUNT * OBJECT_LEN;
#[cfg(feature = "battery")]
pub const BATTERY_VALUE_OFFSET: usize = BATTERY_OBJECT_OFFSET + 1;

/// Identifies one of the monitored inputs and, through it, its fixed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSlot {
    First,
    Second,
}

impl InputSlot {
    pub const ALL: [InputSlot; INPUT_COUNT] = [Self::First, Self::Second];

    pub const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    pub const fn object_offset(self) -> usize {
        HEADER_LEN + self.index() * OBJECT_LEN
    }

    pub const fn value_offset(self) -> usize {
        self.object_offset() + 1
    }
}

/// Static description of the payload: info flags and the kind of each input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadLayout {
    pub info: u8,
    pub inputs: [SensorKind; INPUT_COUNT],
}

impl PayloadLayout {
    pub const fn new(info: u8, inputs: [SensorKind; INPUT_COUNT]) -> Self {
        Self { info, inputs }
    }

    /// Bytes of a freshly built payload: every input closed, battery at 0.
    pub const fn initial_bytes(&self) -> [u8; PAYLOAD_LEN] {
        let mut bytes = [0u8; PAYLOAD_LEN];

        let uuid = bthome::SERVICE_UUID.to_le_bytes();
        bytes[0] = uuid[0];
        bytes[1] = uuid[1];
        bytes[2] = self.info;

        let mut i = 0;
        while i < INPUT_COUNT {
            let offset = HEADER_LEN + i * OBJECT_LEN;
            bytes[offset] = self.inputs[i].object_id();
            bytes[offset + 1] = bthome::VALUE_CLOSED;
            i += 1;
        }

        #[cfg(feature = "battery")]
        {
            bytes[BATTERY_OBJECT_OFFSET] = bthome::OBJECT_BATTERY;
        }

        bytes
    }
}

impl Default for PayloadLayout {
    fn default() -> Self {
        Self::new(bthome::DEFAULT_INFO, [SensorKind::Window; INPUT_COUNT])
    }
}

/// Logical state stored for a raw pin level.
///
/// The contacts are normally closed and pull the input high while the magnet
/// is present, so a high level is reported as closed and a low level as open.
pub const fn logical_value(level: bool) -> u8 {
    if level {
        bthome::VALUE_CLOSED
    } else {
        bthome::VALUE_OPEN
    }
}

/// A copy of the payload bytes taken at one point in time.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Payload([u8; PAYLOAD_LEN]);

impl Payload {
    pub const fn from_bytes(bytes: [u8; PAYLOAD_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Stored logical state of an input (0 closed, 1 open).
    pub fn input_value(&self, slot: InputSlot) -> u8 {
        self.0[slot.value_offset()]
    }

    #[cfg(feature = "battery")]
    pub fn battery_value(&self) -> u8 {
        self.0[BATTERY_VALUE_OFFSET]
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Payload[")?;
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        f.write_str("]")
    }
}

/// Owner of the advertised payload bytes.
///
/// Setters are O(1), never fail and never block, so they may be called from
/// an interrupt handler.
pub struct PayloadEncoder {
    layout: PayloadLayout,
    bytes: [AtomicU8; PAYLOAD_LEN],
    dirty: AtomicBool,
}

impl PayloadEncoder {
    pub const fn new(layout: PayloadLayout) -> Self {
        let initial = layout.initial_bytes();
        let mut bytes = [const { AtomicU8::new(0) }; PAYLOAD_LEN];

        let mut i = 0;
        while i < PAYLOAD_LEN {
            bytes[i] = AtomicU8::new(initial[i]);
            i += 1;
        }

        Self {
            layout,
            bytes,
            dirty: AtomicBool::new(false),
        }
    }

    pub fn layout(&self) -> &PayloadLayout {
        &self.layout
    }

    /// Store the logical state for the raw `level` read from an input.
    pub fn set_binary_field(&self, slot: InputSlot, level: bool) {
        self.store(slot.value_offset(), logical_value(level));
    }

    /// Store a battery percentage (0-100) or the error sentinel.
    #[cfg(feature = "battery")]
    pub fn set_battery_field(&self, value: u8) {
        self.store(BATTERY_VALUE_OFFSET, value);
    }

    #[cfg(not(feature = "battery"))]
    pub fn set_battery_field(&self, value: u8) {
        log::debug!("Battery field not present, dropping value {}", value);
    }

    /// Copy the current payload contents.
    pub fn snapshot(&self) -> Payload {
        let mut bytes = [0u8; PAYLOAD_LEN];
        for (dst, src) in bytes.iter_mut().zip(self.bytes.iter()) {
            *dst = src.load(Ordering::Acquire);
        }
        Payload(bytes)
    }

    /// Returns whether any field was written since the last call.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    fn store(&self, offset: usize, value: u8) {
        self.bytes[offset].store(value, Ordering::Release);
        self.dirty.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_layout() {
        let encoder = PayloadEncoder::new(PayloadLayout::default());
        let payload = encoder.snapshot();

        #[cfg(feature = "battery")]
        assert_eq!(
            payload.as_bytes(),
            &[0xD2, 0xFC, 0x44, 0x2D, 0x00, 0x2D, 0x00, 0x01, 0x00]
        );
        #[cfg(not(feature = "battery"))]
        assert_eq!(payload.as_bytes(), &[0xD2, 0xFC, 0x44, 0x2D, 0x00, 0x2D, 0x00]);

        assert!(!encoder.take_dirty());
    }

    #[test]
    fn test_mixed_sensor_kinds() {
        let layout = PayloadLayout::new(
            bthome::DEFAULT_INFO,
            [SensorKind::Door, SensorKind::Window],
        );
        let payload = PayloadEncoder::new(layout).snapshot();
        assert_eq!(payload.as_bytes()[InputSlot::First.object_offset()], 0x1A);
        assert_eq!(payload.as_bytes()[InputSlot::Second.object_offset()], 0x2D);
    }

    #[test]
    fn test_binary_field_is_inverted_level() {
        let encoder = PayloadEncoder::new(PayloadLayout::default());

        for level in [true, false] {
            encoder.set_binary_field(InputSlot::First, level);
            let stored = encoder.snapshot().input_value(InputSlot::First);
            assert_eq!(stored, 1 - level as u8);
        }
    }

    #[test]
    fn test_fields_are_independent() {
        let encoder = PayloadEncoder::new(PayloadLayout::default());
        let before = encoder.snapshot();

        encoder.set_binary_field(InputSlot::Second, false);
        let after = encoder.snapshot();

        assert_eq!(after.input_value(InputSlot::First), 0);
        assert_eq!(after.input_value(InputSlot::Second), 1);
        // Only the written value byte differs
        let changed = before
            .as_bytes()
            .iter()
            .zip(after.as_bytes())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(changed, 1);
        assert_eq!(after.as_bytes().len(), PAYLOAD_LEN);
    }

    #[cfg(feature = "battery")]
    #[test]
    fn test_battery_field() {
        let encoder = PayloadEncoder::new(PayloadLayout::default());
        encoder.set_battery_field(87);
        assert_eq!(encoder.snapshot().battery_value(), 87);
        assert_eq!(encoder.snapshot().as_bytes()[BATTERY_OBJECT_OFFSET], 0x01);

        encoder.set_battery_field(bthome::BATTERY_ERROR);
        assert_eq!(encoder.snapshot().battery_value(), 0xFF);
    }

    #[test]
    fn test_dirty_flag() {
        let encoder = PayloadEncoder::new(PayloadLayout::default());
        encoder.set_binary_field(InputSlot::First, true);
        assert!(encoder.take_dirty());
        assert!(!encoder.take_dirty());
    }
}
