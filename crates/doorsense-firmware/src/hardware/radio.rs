//! Legacy BLE advertising over the ESP32-S3 controller
//!
//! esp-radio exposes the controller as an HCI transport. Advertising is
//! driven directly with HCI LE commands: non-connectable undirected legacy
//! advertising from the identity address, with an interval between half the
//! maximum and the maximum the controller allows.

use bt_hci::cmd;
use bt_hci::cmd::controller_baseband::Reset;
use bt_hci::cmd::le::{LeSetAdvData, LeSetAdvEnable, LeSetAdvParams};
use bt_hci::controller::{ControllerCmdSync, ExternalController};
use bt_hci::param::{
    AddrKind, AdvChannelMap, AdvFilterPolicy, AdvKind, BdAddr, Duration as HciDuration,
};
use doorsense_core::ConfigError;
use doorsense_core::advertisement::MAX_ADV_DATA_LEN;
use doorsense_core::platform::Radio;
use esp_hal::peripherals::BT;
use esp_radio::ble::controller::BleConnector;
use log::{debug, info};
use thiserror_no_std::Error;

/// Upper bound of the advertising interval, 10.24 s.
const ADV_INTERVAL_MAX_MS: u32 = 10_240;
const ADV_INTERVAL_MIN_MS: u32 = ADV_INTERVAL_MAX_MS / 2;

/// Number of HCI command slots the controller may have in flight.
const HCI_SLOTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RadioError {
    #[error("HCI command {0} failed")]
    Command(&'static str),
    #[error("advertising data of {0} bytes does not fit")]
    DataTooLong(usize),
}

pub struct BleAdvertiser {
    controller: ExternalController<BleConnector<'static>, HCI_SLOTS>,
}

impl BleAdvertiser {
    pub fn new(
        radio: &'static esp_radio::Controller<'static>,
        bt: BT<'static>,
    ) -> Result<Self, ConfigError> {
        let connector = BleConnector::new(radio, bt, Default::default()).map_err(|e| {
            log::error!("BLE controller rejected configuration: {:?}", e);
            ConfigError::RadioInit
        })?;

        info!("Bluetooth initialized");
        Ok(Self {
            controller: ExternalController::new(connector),
        })
    }

    async fn exec<C>(&self, name: &'static str, command: &C) -> Result<C::Return, RadioError>
    where
        C: cmd::SyncCmd,
        ExternalController<BleConnector<'static>, HCI_SLOTS>: ControllerCmdSync<C>,
    {
        self.controller.exec(command).await.map_err(|e| {
            debug!("{} returned {:?}", name, e);
            RadioError::Command(name)
        })
    }

    async fn set_data(&self, adv_data: &[u8]) -> Result<(), RadioError> {
        let len = u8::try_from(adv_data.len())
            .ok()
            .filter(|&len| usize::from(len) <= MAX_ADV_DATA_LEN)
            .ok_or(RadioError::DataTooLong(adv_data.len()))?;

        let mut data = [0u8; MAX_ADV_DATA_LEN];
        data[..adv_data.len()].copy_from_slice(adv_data);

        self.exec("LE Set Advertising Data", &LeSetAdvData::new(len, data))
            .await
    }
}

impl Radio for BleAdvertiser {
    type Error = RadioError;

    async fn start_advertising(&mut self, adv_data: &[u8]) -> Result<(), Self::Error> {
        self.exec("Reset", &Reset::new()).await?;

        let params = LeSetAdvParams::new(
            HciDuration::from_millis(ADV_INTERVAL_MIN_MS),
            HciDuration::from_millis(ADV_INTERVAL_MAX_MS),
            AdvKind::AdvNonconnInd,
            AddrKind::PUBLIC,
            AddrKind::PUBLIC,
            BdAddr::default(),
            AdvChannelMap::ALL,
            AdvFilterPolicy::default(),
        );
        self.exec("LE Set Advertising Parameters", &params).await?;
        self.set_data(adv_data).await?;
        self.exec("LE Set Advertising Enable", &LeSetAdvEnable::new(true))
            .await?;

        Ok(())
    }

    async fn replace_advertising_data(&mut self, adv_data: &[u8]) -> Result<(), Self::Error> {
        self.set_data(adv_data).await
    }
}
