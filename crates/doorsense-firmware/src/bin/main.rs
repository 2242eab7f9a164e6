#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use doorsense_core::ConfigError;
use doorsense_core::battery::BatterySampler;
use doorsense_core::worker::DeferredWorker;
use doorsense_firmware::hardware::{BatteryTicker, BleAdvertiser, SensorInputs, SupplyVoltage};
use doorsense_firmware::{CONFIG, DEVICE};
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::Io;
use esp_hal::peripherals::Peripherals;
use esp_hal::timer::timg::TimerGroup;
use log::{error, info};
use static_cell::StaticCell;

type Worker = DeferredWorker<'static, SupplyVoltage, BleAdvertiser, BatteryTicker>;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // The BLE controller allocates its buffers from this heap
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Starting {}", CONFIG.name);

    let worker = match start(peripherals).await {
        Ok(worker) => worker,
        Err(e) => panic!("Start-up failed: {}", e),
    };

    match worker_task(worker) {
        Ok(token) => spawner.spawn(token),
        Err(e) => panic!("Failed to spawn worker: {:?}", e),
    }

    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}

/// Bring the device up: inputs, supply channel, initial payload, then radio.
async fn start(peripherals: Peripherals) -> Result<Worker, ConfigError> {
    let mut io = Io::new(peripherals.IO_MUX);
    let inputs = SensorInputs::configure(&mut io, peripherals.GPIO4, peripherals.GPIO5);
    let mut supply = SupplyVoltage::configure(peripherals.ADC1, peripherals.GPIO1);

    let mut sampler = BatterySampler::new(CONFIG.battery);
    inputs.populate();
    sampler.sample(&mut supply, &DEVICE).await;
    info!("Initial payload: {:?}", DEVICE.encoder().snapshot());

    let radio = esp_radio::init().map_err(|e| {
        error!("Radio init failed: {:?}", e);
        ConfigError::RadioInit
    })?;
    let radio = RADIO.init(radio);
    let mut advertiser = BleAdvertiser::new(radio, peripherals.BT)?;

    DEVICE
        .start_advertising(&mut advertiser, CONFIG.name)
        .await
        .map_err(|_| ConfigError::RadioInit)?;

    Ok(DeferredWorker::new(
        &DEVICE,
        CONFIG.name,
        sampler,
        supply,
        advertiser,
        BatteryTicker::every(CONFIG.battery.period()),
    ))
}

#[embassy_executor::task]
async fn worker_task(mut worker: Worker) {
    worker.run().await
}
