//! Magnetic contact inputs on GPIO, serviced from the GPIO interrupt
//!
//! Pins live in a critical-section cell so the interrupt handler can reach
//! them. The handler itself only touches the pin that fired, writes the new
//! level into the payload and raises the broadcast flag.

use core::cell::RefCell;
use core::convert::Infallible;

use critical_section::Mutex;
use doorsense_core::payload::{INPUT_COUNT, InputSlot};
use doorsense_core::platform::EdgeLatch;
use embedded_hal::digital::{ErrorType, InputPin};
use esp_hal::gpio::{self, Event, Input, InputConfig, Io, Pull};
use esp_hal::handler;
use log::info;

use crate::DEVICE;

static PINS: Mutex<RefCell<[Option<ContactPin>; INPUT_COUNT]>> =
    Mutex::new(RefCell::new([None, None]));

/// A contact input together with its GPIO interrupt status.
struct ContactPin(Input<'static>);

impl ErrorType for ContactPin {
    type Error = Infallible;
}

impl InputPin for ContactPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.is_low())
    }
}

impl EdgeLatch for ContactPin {
    fn take_edge(&mut self) -> bool {
        if !self.0.is_interrupt_set() {
            return false;
        }
        self.0.clear_interrupt();
        true
    }
}

/// Handle to the installed inputs.
pub struct SensorInputs {
    _private: (),
}

impl SensorInputs {
    /// Configure both contacts for any-edge interrupts and install the handler.
    ///
    /// Contacts are open-drain reed switches with an external pull-up, so no
    /// internal pull is enabled.
    pub fn configure(
        io: &mut Io<'static>,
        first: impl gpio::InputPin + 'static,
        second: impl gpio::InputPin + 'static,
    ) -> Self {
        let config = InputConfig::default().with_pull(Pull::None);
        let pins = [Input::new(first, config), Input::new(second, config)];

        io.set_interrupt_handler(on_gpio_interrupt);

        critical_section::with(|cs| {
            let mut installed = PINS.borrow_ref_mut(cs);
            for (slot, mut pin) in pins.into_iter().enumerate() {
                pin.listen(Event::AnyEdge);
                installed[slot] = Some(ContactPin(pin));
            }
        });

        info!("Configured {} contact inputs", INPUT_COUNT);
        Self { _private: () }
    }

    /// Read every contact into the payload without requesting a broadcast.
    ///
    /// Runs with interrupts masked, so an edge during the read is serviced
    /// right after and cannot be lost.
    pub fn populate(&self) {
        critical_section::with(|cs| {
            let mut installed = PINS.borrow_ref_mut(cs);
            if let [Some(first), Some(second)] = &mut *installed {
                DEVICE.populate_inputs([first, second]);
            }
        });
    }
}

#[handler]
fn on_gpio_interrupt() {
    critical_section::with(|cs| {
        let mut installed = PINS.borrow_ref_mut(cs);
        for (slot, pin) in InputSlot::ALL.into_iter().zip(installed.iter_mut()) {
            if let Some(pin) = pin {
                DEVICE.monitor(slot).service(pin);
            }
        }
    });
}
