//! Sub-GHz and Wi-Fi radio transport keyed by radio type, frequency and power.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::RadioConfig;
use crate::error::{constants, AgioError, Result};
use crate::transport::link::{LinkCore, LinkDriver, LinkTarget};
use crate::transport::{EventReceiver, Transport, TransportKind};

pub struct RadioTransport {
    config: RadioConfig,
    core: LinkCore,
}

impl RadioTransport {
    pub fn new(config: RadioConfig, driver: Option<Arc<dyn LinkDriver>>) -> Self {
        Self {
            config,
            core: LinkCore::new(TransportKind::Radio, driver),
        }
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    fn target(config: &RadioConfig) -> Result<LinkTarget> {
        let frequency_khz = config.frequency_khz.filter(|f| *f > 0).ok_or_else(|| {
            AgioError::InvalidConfiguration(constants::ERR_MISSING_RADIO_FREQUENCY.to_string())
        })?;
        if !config.radio_type.supports_frequency(frequency_khz) {
            return Err(AgioError::InvalidConfiguration(format!(
                "Frequency {frequency_khz} kHz is outside the {:?} bands",
                config.radio_type
            )));
        }
        Ok(LinkTarget::Radio {
            radio_type: config.radio_type,
            frequency_khz,
            power_dbm: config.power_dbm,
        })
    }
}

#[async_trait]
impl Transport for RadioTransport {
    fn kind(&self) -> TransportKind {
        self.core.kind()
    }

    fn take_events(&mut self) -> Option<EventReceiver> {
        self.core.take_events()
    }

    async fn start(&mut self) -> Result<()> {
        let config = &self.config;
        self.core
            .start(constants::ERR_NO_RADIO, || Self::target(config))
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
