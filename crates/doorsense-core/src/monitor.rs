//! Edge handling for the binary contact inputs.
//!
//! The platform registers [`InputMonitor::on_edge`] as the handler for both
//! edges of an input. The handler runs in interrupt context: it reads the
//! pin once, writes the logical state into the payload and signals the
//! scheduler. It never blocks and takes no lock. The level is read as-is;
//! the contacts are stable by the time the interrupt fires so there is no
//! software debounce.

use embedded_hal::digital::InputPin;
use log::{debug, warn};

use crate::bthome::SensorKind;
use crate::device::DeviceState;
use crate::payload::InputSlot;
use crate::platform::EdgeLatch;

/// Raw state of one input as last read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    pub id: SensorKind,
    /// Raw pin level, high when the magnet is present.
    pub level: bool,
}

impl SensorReading {
    pub const fn is_open(&self) -> bool {
        !self.level
    }
}

#[derive(Clone, Copy)]
pub struct InputMonitor<'a> {
    slot: InputSlot,
    device: &'a DeviceState,
}

impl<'a> InputMonitor<'a> {
    pub const fn new(slot: InputSlot, device: &'a DeviceState) -> Self {
        Self { slot, device }
    }

    pub fn slot(&self) -> InputSlot {
        self.slot
    }

    pub fn kind(&self) -> SensorKind {
        self.device.encoder().layout().inputs[self.slot.index()]
    }

    /// Read the pin and store its logical state without requesting a
    /// broadcast. Used for the start-up poll.
    ///
    /// Returns `None` if the pin could not be read; the stored value is left
    /// untouched in that case.
    pub fn poll<P: InputPin>(&self, pin: &mut P) -> Option<SensorReading> {
        let level = match pin.is_high() {
            Ok(level) => level,
            Err(e) => {
                warn!("Failed to read input {}: {:?}", self.slot.index(), e);
                return None;
            }
        };

        self.device.encoder().set_binary_field(self.slot, level);
        debug!(
            "Input {} ({:?}) level {}",
            self.slot.index(),
            self.kind(),
            level
        );

        Some(SensorReading {
            id: self.kind(),
            level,
        })
    }

    /// Edge handler: store the settled level and request a broadcast.
    pub fn on_edge<P: InputPin>(&self, pin: &mut P) -> Option<SensorReading> {
        let reading = self.poll(pin)?;
        self.device.scheduler().request_broadcast();
        Some(reading)
    }

    /// Interrupt entry point: handle a latched edge on `pin`, if any.
    ///
    /// The latch is cleared before the pin is read. An edge arriving during
    /// the read latches again and is serviced on the next interrupt, so the
    /// stored level always catches up with the contact.
    pub fn service<P: InputPin + EdgeLatch>(&self, pin: &mut P) -> Option<SensorReading> {
        if !pin.take_edge() {
            return None;
        }
        self.on_edge(pin)
    }
}
