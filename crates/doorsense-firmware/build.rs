//! Bakes the advertised device name into the firmware.
//!
//! The name is read from `DOORSENSE_DEVICE_NAME`, either from the environment
//! or from a `.env` file next to this crate's `Cargo.toml`.

const DEFAULT_DEVICE_NAME: &str = "Door Sensor";

fn main() {
    println!("cargo:rerun-if-changed=.env");
    println!("cargo:rerun-if-env-changed=DOORSENSE_DEVICE_NAME");

    // A missing .env file is fine, the default name is used
    let _ = dotenvy::dotenv();

    let name = std::env::var("DOORSENSE_DEVICE_NAME")
        .unwrap_or_else(|_| DEFAULT_DEVICE_NAME.to_string());
    println!("cargo:rustc-env=DOORSENSE_DEVICE_NAME={name}");

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
