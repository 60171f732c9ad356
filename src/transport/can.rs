//! CAN transport keyed by adapter path and baud rate.
//!
//! The driver delivers the module's frames as a byte stream (serial CAN gateways
//! and SocketCAN ISO-TP sockets both look like this), so framing is the same as
//! for the other stream media.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{CanConfig, CAN_BAUD_RATES};
use crate::error::{constants, AgioError, Result};
use crate::transport::link::{LinkCore, LinkDriver, LinkTarget};
use crate::transport::{EventReceiver, Transport, TransportKind};

pub struct CanTransport {
    config: CanConfig,
    core: LinkCore,
}

impl CanTransport {
    pub fn new(config: CanConfig, driver: Option<Arc<dyn LinkDriver>>) -> Self {
        Self {
            config,
            core: LinkCore::new(TransportKind::Can, driver),
        }
    }

    pub fn config(&self) -> &CanConfig {
        &self.config
    }

    fn target(config: &CanConfig) -> Result<LinkTarget> {
        let adapter = config
            .adapter
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                AgioError::InvalidConfiguration(constants::ERR_MISSING_CAN_ADAPTER.to_string())
            })?;
        if !CAN_BAUD_RATES.contains(&config.baud_rate) {
            return Err(AgioError::InvalidConfiguration(format!(
                "Unsupported CAN baud rate: {}",
                config.baud_rate
            )));
        }
        Ok(LinkTarget::Can {
            adapter: adapter.to_string(),
            baud_rate: config.baud_rate,
        })
    }
}

#[async_trait]
impl Transport for CanTransport {
    fn kind(&self) -> TransportKind {
        self.core.kind()
    }

    fn take_events(&mut self) -> Option<EventReceiver> {
        self.core.take_events()
    }

    async fn start(&mut self) -> Result<()> {
        let config = &self.config;
        self.core
            .start(constants::ERR_NO_CAN, || Self::target(config))
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
