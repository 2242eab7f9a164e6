//! The deferred worker: one sequential context for every non-interrupt job.
//!
//! Two jobs exist, the periodic battery sample and the broadcast. The worker
//! runs exactly one of them at a time, to completion, so neither needs to
//! guard against the other. When both are due the battery job runs first;
//! its own broadcast request then folds into the pending one.

use embassy_futures::select::{Either, select};
use log::debug;

use crate::battery::{BatterySampler, SampleOutcome};
use crate::device::DeviceState;
use crate::error::BroadcastError;
use crate::platform::{AnalogInput, PeriodicTimer, Radio};

/// The job a worker step ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Battery(SampleOutcome),
    Broadcast(Result<(), BroadcastError>),
}

pub struct DeferredWorker<'a, A, R, T> {
    device: &'a DeviceState,
    name: &'a str,
    sampler: BatterySampler,
    analog: A,
    radio: R,
    timer: T,
}

impl<'a, A, R, T> DeferredWorker<'a, A, R, T>
where
    A: AnalogInput,
    R: Radio,
    T: PeriodicTimer,
{
    /// `timer` must already be running with the battery period; the initial
    /// sample is taken by [`DeviceState::populate`], not by the worker.
    pub fn new(
        device: &'a DeviceState,
        name: &'a str,
        sampler: BatterySampler,
        analog: A,
        radio: R,
        timer: T,
    ) -> Self {
        Self {
            device,
            name,
            sampler,
            analog,
            radio,
            timer,
        }
    }

    pub fn sampler(&self) -> &BatterySampler {
        &self.sampler
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn analog_mut(&mut self) -> &mut A {
        &mut self.analog
    }

    /// Wait for the next due job and run it.
    pub async fn step(&mut self) -> Job {
        let tick = self.timer.next();
        let request = self.device.scheduler().wait();

        let due = select(tick, request).await;
        match due {
            Either::First(()) => Job::Battery(self.run_battery_job().await),
            Either::Second(()) => Job::Broadcast(self.run_broadcast_job().await),
        }
    }

    /// Run jobs forever.
    pub async fn run(&mut self) -> ! {
        loop {
            let job = self.step().await;
            debug!("Worker ran {:?}", job);
        }
    }

    pub async fn run_battery_job(&mut self) -> SampleOutcome {
        self.sampler.sample(&mut self.analog, self.device).await
    }

    /// Broadcast the current payload. The caller has already taken the
    /// pending request.
    pub async fn run_broadcast_job(&mut self) -> Result<(), BroadcastError> {
        self.device
            .scheduler()
            .broadcast(self.device.encoder(), &mut self.radio, self.name)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BatteryConfig;
    use crate::payload::{InputSlot, PAYLOAD_LEN, PayloadLayout};
    use crate::testing::{FakeAnalog, FakePin, ManualTimer, RadioFault, RecordingRadio};
    use embassy_futures::block_on;

    type TestWorker<'a> = DeferredWorker<'a, FakeAnalog, RecordingRadio, ManualTimer>;

    fn worker<'a>(device: &'a DeviceState, analog: FakeAnalog) -> TestWorker<'a> {
        DeferredWorker::new(
            device,
            "Door",
            BatterySampler::new(BatteryConfig::DEFAULT),
            analog,
            RecordingRadio::default(),
            ManualTimer::default(),
        )
    }

    #[test]
    fn test_many_requests_one_broadcast() {
        let device = DeviceState::new(PayloadLayout::default());
        let mut worker = worker(&device, FakeAnalog::failing());

        for _ in 0..7 {
            device.scheduler().request_broadcast();
        }
        // Written after the requests, still part of the broadcast
        device.encoder().set_binary_field(InputSlot::Second, false);

        assert_eq!(block_on(worker.step()), Job::Broadcast(Ok(())));
        assert_eq!(worker.radio().updates.len(), 1);
        assert_eq!(worker.radio().last_payload().input_value(InputSlot::Second), 1);
        assert!(!device.scheduler().is_pending());
    }

    #[test]
    fn test_final_state_wins() {
        let device = DeviceState::new(PayloadLayout::default());
        let mut worker = worker(&device, FakeAnalog::failing());
        let monitor = device.monitor(InputSlot::First);

        block_on(device.populate(
            [&mut FakePin::high(), &mut FakePin::high()],
            &mut BatterySampler::new(BatteryConfig::DEFAULT),
            &mut FakeAnalog::new(&[Ok(3300)]),
        ));
        block_on(worker.step());
        assert_eq!(worker.radio().last_payload().input_value(InputSlot::First), 0);

        // high -> low opens the window
        monitor.on_edge(&mut FakePin::low());
        assert_eq!(device.encoder().snapshot().input_value(InputSlot::First), 1);
        block_on(worker.step());
        assert_eq!(worker.radio().updates.len(), 2);
        assert_eq!(worker.radio().last_payload().input_value(InputSlot::First), 1);

        // Open and closed again before the worker runs
        monitor.on_edge(&mut FakePin::low());
        monitor.on_edge(&mut FakePin::high());
        block_on(worker.step());
        assert_eq!(worker.radio().updates.len(), 3);
        assert_eq!(worker.radio().last_payload().input_value(InputSlot::First), 0);
        assert!(!device.scheduler().is_pending());
    }

    #[test]
    fn test_battery_tick_runs_before_broadcast() {
        let device = DeviceState::new(PayloadLayout::default());
        let mut worker = worker(&device, FakeAnalog::new(&[Ok(2900)]));
        worker.timer.ticks = 1;
        device.scheduler().request_broadcast();

        assert_eq!(
            block_on(worker.step()),
            Job::Battery(SampleOutcome::Updated(50))
        );
        assert!(worker.radio().updates.is_empty());

        assert_eq!(block_on(worker.step()), Job::Broadcast(Ok(())));
        #[cfg(feature = "battery")]
        assert_eq!(worker.radio().last_payload().battery_value(), 50);
        assert!(!device.scheduler().is_pending());
    }

    #[test]
    fn test_failed_battery_tick_does_not_broadcast() {
        let device = DeviceState::new(PayloadLayout::default());
        let mut worker = worker(&device, FakeAnalog::failing());
        worker.timer.ticks = 3;

        for _ in 0..3 {
            assert_eq!(block_on(worker.step()), Job::Battery(SampleOutcome::Retained));
        }
        assert!(!device.scheduler().is_pending());
        assert_eq!(worker.sampler().state().consecutive_failures, 3);
        assert_eq!(worker.analog.calls, 3);
    }

    #[test]
    fn test_radio_failure_recovers_on_next_request() {
        let device = DeviceState::new(PayloadLayout::default());
        let mut worker = worker(&device, FakeAnalog::failing());
        worker.radio.fail_updates = true;

        device.scheduler().request_broadcast();
        assert_eq!(
            block_on(worker.step()),
            Job::Broadcast(Err(BroadcastError::Radio))
        );
        assert!(!device.scheduler().is_pending());

        worker.radio.fail_updates = false;
        device.scheduler().request_broadcast();
        assert_eq!(block_on(worker.step()), Job::Broadcast(Ok(())));
        assert_eq!(worker.radio().attempts, 2);
        assert_eq!(device.scheduler().stats().failed, 1);
    }

    /// Requests another broadcast while the first one is being sent.
    struct ReentrantRadio<'a> {
        device: &'a DeviceState,
        inner: RecordingRadio,
    }

    impl Radio for ReentrantRadio<'_> {
        type Error = RadioFault;

        async fn start_advertising(&mut self, adv_data: &[u8]) -> Result<(), RadioFault> {
            self.inner.start_advertising(adv_data).await
        }

        async fn replace_advertising_data(&mut self, adv_data: &[u8]) -> Result<(), RadioFault> {
            if self.inner.updates.is_empty() {
                self.device.encoder().set_binary_field(InputSlot::First, false);
                self.device.scheduler().request_broadcast();
            }
            self.inner.replace_advertising_data(adv_data).await
        }
    }

    #[test]
    fn test_request_during_broadcast_yields_one_more() {
        let device = DeviceState::new(PayloadLayout::default());
        let radio = ReentrantRadio {
            device: &device,
            inner: RecordingRadio::default(),
        };
        let mut worker = DeferredWorker::new(
            &device,
            "Door",
            BatterySampler::new(BatteryConfig::DEFAULT),
            FakeAnalog::failing(),
            radio,
            ManualTimer::default(),
        );

        device.scheduler().request_broadcast();
        block_on(worker.step());
        assert!(device.scheduler().is_pending());

        block_on(worker.step());
        let updates = &worker.radio().inner.updates;
        assert_eq!(updates.len(), 2);
        let service_data = &updates[1][updates[1].len() - PAYLOAD_LEN..];
        assert_eq!(service_data[InputSlot::First.value_offset()], 0x01);
        assert!(!device.scheduler().is_pending());
    }
}
