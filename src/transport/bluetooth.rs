//! Bluetooth SPP / BLE transport keyed by device address and mode.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{is_mac_address, BluetoothConfig};
use crate::error::{constants, AgioError, Result};
use crate::transport::link::{LinkCore, LinkDriver, LinkTarget};
use crate::transport::{EventReceiver, Transport, TransportKind};

pub struct BluetoothTransport {
    config: BluetoothConfig,
    core: LinkCore,
}

impl BluetoothTransport {
    /// `driver` is `None` on platforms without a Bluetooth stack
    pub fn new(config: BluetoothConfig, driver: Option<Arc<dyn LinkDriver>>) -> Self {
        Self {
            config,
            core: LinkCore::new(TransportKind::Bluetooth, driver),
        }
    }

    pub fn config(&self) -> &BluetoothConfig {
        &self.config
    }

    fn target(config: &BluetoothConfig) -> Result<LinkTarget> {
        let address = config
            .address
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                AgioError::InvalidConfiguration(constants::ERR_MISSING_BT_ADDRESS.to_string())
            })?;
        if !is_mac_address(address) {
            return Err(AgioError::InvalidConfiguration(format!(
                "Invalid Bluetooth address: '{address}'"
            )));
        }
        Ok(LinkTarget::Bluetooth {
            address: address.to_ascii_uppercase(),
            mode: config.mode,
        })
    }
}

#[async_trait]
impl Transport for BluetoothTransport {
    fn kind(&self) -> TransportKind {
        self.core.kind()
    }

    fn take_events(&mut self) -> Option<EventReceiver> {
        self.core.take_events()
    }

    async fn start(&mut self) -> Result<()> {
        let config = &self.config;
        self.core
            .start(constants::ERR_NO_BLUETOOTH, || Self::target(config))
            .await
    }

    async fn stop(&mut self) -> Result<()> {
        self.core.stop().await
    }

    async fn send(&self, data: &[u8]) -> Result<()> {
        self.core.send(data).await
    }

    fn is_connected(&self) -> bool {
        self.core.is_connected()
    }
}
