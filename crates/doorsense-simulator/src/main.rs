//! Desktop simulator for the doorsense sensor-to-advertisement pipeline.
//!
//! Runs doorsense-core against simulated reed contacts, a draining supply and
//! a radio that logs every advertising data update. Commands are read from
//! stdin, one per line.
//!
//! # Commands
//!
//! | Command | Action                              |
//! |---------|-------------------------------------|
//! | 1       | Toggle the first contact            |
//! | 2       | Toggle the second contact           |
//! | b       | Sample the battery now              |
//! | f       | Toggle supply read failures         |
//! | r       | Toggle radio failures               |
//! | s       | Print broadcast statistics          |
//! | q       | Quit                                |
//!
//! Run with `RUST_LOG=debug` to see edges and payload bytes.

mod config;
mod platform;

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};

use clap::Parser;
use doorsense_core::DeviceState;
use doorsense_core::battery::BatterySampler;
use doorsense_core::payload::{INPUT_COUNT, InputSlot};
use doorsense_core::worker::DeferredWorker;
use embassy_futures::{block_on, poll_once};
use log::{error, info, warn};

use crate::config::SimConfig;
use crate::platform::{DrainingSupply, FrameTimer, LoggingRadio, SimPin};

/// Main loop pacing.
const FRAME_DURATION: Duration = Duration::from_millis(50);

/// Runs the door sensor pipeline without hardware.
#[derive(Parser)]
struct Cli {
    /// TOML file with the device name, input kinds and battery settings
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Toggle(InputSlot),
    SampleBattery,
    ToggleSupplyFailure,
    ToggleRadioFailure,
    Stats,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "1" => Some(Self::Toggle(InputSlot::First)),
            "2" => Some(Self::Toggle(InputSlot::Second)),
            "b" => Some(Self::SampleBattery),
            "f" => Some(Self::ToggleSupplyFailure),
            "r" => Some(Self::ToggleRadioFailure),
            "s" => Some(Self::Stats),
            "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Forward stdin lines as commands. End of input quits.
fn spawn_stdin_reader() -> Receiver<Command> {
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match Command::parse(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
                None if line.trim().is_empty() => {}
                None => warn!("Unknown command {:?}", line.trim()),
            }
        }
        let _ = tx.send(Command::Quit);
    });

    rx
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match SimConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => SimConfig::default(),
    };
    let device_config = config.device();

    info!("Starting doorsense simulator as {:?}", device_config.name);
    info!("Inputs: {:?}", device_config.inputs);
    info!("Commands: 1/2=toggle contact  b=sample  f=supply fault  r=radio fault  s=stats  q=quit");

    // Start-up: inputs, supply, populate, radio
    let device = DeviceState::new(device_config.layout());
    let mut pins = [SimPin { level: true }; INPUT_COUNT];
    let mut supply = DrainingSupply::new(config.initial_millivolts, config.drain_millivolts);
    let mut sampler = BatterySampler::new(device_config.battery);

    let [first, second] = &mut pins;
    block_on(device.populate([first, second], &mut sampler, &mut supply));

    let mut radio = LoggingRadio::default();
    if let Err(e) = block_on(device.start_advertising(&mut radio, device_config.name)) {
        error!("Start-up failed: {}", e);
        return ExitCode::FAILURE;
    }

    let mut worker = DeferredWorker::new(
        &device,
        device_config.name,
        sampler,
        supply,
        radio,
        FrameTimer::new(Duration::from_secs(device_config.battery.period_secs)),
    );
    let commands = spawn_stdin_reader();

    'running: loop {
        let frame_start = Instant::now();

        // --- Commands -----------------------------------------------------
        loop {
            let command = match commands.try_recv() {
                Ok(command) => command,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'running,
            };

            match command {
                Command::Toggle(slot) => {
                    let pin = &mut pins[slot.index()];
                    pin.toggle();
                    // Stands in for the edge interrupt
                    if let Some(reading) = device.monitor(slot).on_edge(pin) {
                        info!(
                            "{:?} {}",
                            reading.id,
                            if reading.is_open() { "opened" } else { "closed" }
                        );
                    }
                }
                Command::SampleBattery => {
                    let outcome = block_on(worker.run_battery_job());
                    info!("Battery sample: {:?}", outcome);
                }
                Command::ToggleSupplyFailure => {
                    let supply = worker.analog_mut();
                    supply.failing = !supply.failing;
                    info!("Supply failures {}", on_off(supply.failing));
                }
                Command::ToggleRadioFailure => {
                    let radio = worker.radio_mut();
                    radio.failing = !radio.failing;
                    info!("Radio failures {}", on_off(radio.failing));
                }
                Command::Stats => {
                    info!(
                        "{:?}, battery {:?}, radio updates {}",
                        device.scheduler().stats(),
                        worker.sampler().state(),
                        worker.radio().updates
                    );
                }
                Command::Quit => break 'running,
            }
        }

        // --- Worker -------------------------------------------------------
        // At most one job per frame, same as the firmware's worker task
        if let core::task::Poll::Ready(job) = poll_once(worker.step()) {
            log::debug!("Worker ran {:?}", job);
        }

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!("Final stats: {:?}", device.scheduler().stats());
    info!("Simulator exiting");
    ExitCode::SUCCESS
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
