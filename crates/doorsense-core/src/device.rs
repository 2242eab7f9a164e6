//! Device-wide state shared between interrupt and worker context
//!
//! [`DeviceState`] owns the payload encoder and the broadcast scheduler. It is
//! `const`-constructible so the firmware can keep it in a `static` that its
//! GPIO interrupt handler can reach. Everything else borrows it.

use embedded_hal::digital::InputPin;
use log::info;

use crate::advertisement;
use crate::battery::BatterySampler;
use crate::error::BroadcastError;
use crate::monitor::InputMonitor;
use crate::payload::{INPUT_COUNT, InputSlot, Payload, PayloadEncoder, PayloadLayout};
use crate::platform::{AnalogInput, Radio};
use crate::scheduler::BroadcastScheduler;

pub struct DeviceState {
    encoder: PayloadEncoder,
    scheduler: BroadcastScheduler,
}

impl DeviceState {
    pub const fn new(layout: PayloadLayout) -> Self {
        Self {
            encoder: PayloadEncoder::new(layout),
            scheduler: BroadcastScheduler::new(),
        }
    }

    pub fn encoder(&self) -> &PayloadEncoder {
        &self.encoder
    }

    pub fn scheduler(&self) -> &BroadcastScheduler {
        &self.scheduler
    }

    /// Edge handler for the input in `slot`.
    pub fn monitor(&self, slot: InputSlot) -> InputMonitor<'_> {
        InputMonitor::new(slot, self)
    }

    /// Initial full sample of every field, run before the radio is enabled.
    ///
    /// Inputs are polled in slot order, then one battery conversion is made.
    pub async fn populate<P: InputPin, A: AnalogInput>(
        &self,
        pins: [&mut P; INPUT_COUNT],
        sampler: &mut BatterySampler,
        analog: &mut A,
    ) -> Payload {
        self.populate_inputs(pins);
        sampler.sample(analog, self).await;

        let payload = self.encoder.snapshot();
        info!("Initial payload: {:?}", payload);
        payload
    }

    /// Poll every input once, in slot order, without requesting a broadcast.
    ///
    /// Split out of [`populate`](Self::populate) for platforms that must read
    /// the pins while holding them in interrupt-shared storage.
    pub fn populate_inputs<P: InputPin>(&self, pins: [&mut P; INPUT_COUNT]) {
        for (slot, pin) in InputSlot::ALL.into_iter().zip(pins) {
            self.monitor(slot).poll(pin);
        }
    }

    /// Start advertising the current payload.
    ///
    /// Requests made during population are consumed first: the advertised
    /// data already carries them. A request arriving after this point still
    /// gets its own broadcast.
    pub async fn start_advertising<R: Radio>(
        &self,
        radio: &mut R,
        name: &str,
    ) -> Result<(), BroadcastError> {
        self.scheduler.take_pending();
        let adv_data = advertisement::build(name, self.encoder.snapshot().as_bytes())?;

        radio.start_advertising(&adv_data).await.map_err(|e| {
            log::error!("Advertising failed to start: {:?}", e);
            BroadcastError::Radio
        })?;

        info!("Advertising started");
        Ok(())
    }
}
