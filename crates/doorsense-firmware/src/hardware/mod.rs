//! ESP32-S3 implementations of the platform seams

pub mod inputs;
pub mod radio;
pub mod supply;
pub mod ticker;

pub use inputs::SensorInputs;
pub use radio::BleAdvertiser;
pub use supply::SupplyVoltage;
pub use ticker::BatteryTicker;
