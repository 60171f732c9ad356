//! Integration tests for the Bluetooth, CAN and radio transports
//!
//! A recording driver hands out in-memory duplex streams, standing in for the
//! platform's native link.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use agio::config::{
    BluetoothConfig, BluetoothMode, CanConfig, RadioConfig, RadioType, TimingConfig,
};
use agio::core::frame::Frame;
use agio::error::AgioError;
use agio::protocol::module::ModuleKind;
use agio::service::{ConnectionState, ModuleCoordinator};
use agio::transport::bluetooth::BluetoothTransport;
use agio::transport::can::CanTransport;
use agio::transport::link::{BoxedLink, LinkDriver, LinkTarget};
use agio::transport::radio::RadioTransport;
use agio::transport::{Transport, TransportEvent, TransportKind, TransportRouter};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::time::timeout;

/// Opens a fresh duplex per call and keeps the peer ends and targets
#[derive(Default)]
struct RecordingDriver {
    targets: Mutex<Vec<LinkTarget>>,
    peers: Mutex<Vec<DuplexStream>>,
}

impl RecordingDriver {
    fn targets(&self) -> Vec<LinkTarget> {
        self.targets.lock().unwrap().clone()
    }

    fn take_peer(&self) -> DuplexStream {
        self.peers.lock().unwrap().pop().expect("no link opened")
    }
}

#[async_trait]
impl LinkDriver for RecordingDriver {
    async fn open(&self, target: &LinkTarget) -> agio::Result<BoxedLink> {
        let (local, peer) = tokio::io::duplex(1024);
        self.targets.lock().unwrap().push(target.clone());
        self.peers.lock().unwrap().push(peer);
        Ok(Box::new(local))
    }
}

fn driver_of(driver: &Arc<RecordingDriver>) -> Option<Arc<dyn LinkDriver>> {
    let driver: Arc<dyn LinkDriver> = driver.clone();
    Some(driver)
}

fn bluetooth_config(address: Option<&str>) -> BluetoothConfig {
    BluetoothConfig {
        address: address.map(str::to_string),
        mode: BluetoothMode::Spp,
    }
}

fn can_config(adapter: Option<&str>, baud_rate: u32) -> CanConfig {
    CanConfig {
        adapter: adapter.map(str::to_string),
        baud_rate,
    }
}

fn radio_config(radio_type: RadioType, frequency_khz: Option<u32>) -> RadioConfig {
    RadioConfig {
        radio_type,
        frequency_khz,
        power_dbm: 14,
    }
}

fn is_invalid_config<T: std::fmt::Debug>(result: agio::Result<T>) -> bool {
    matches!(result, Err(AgioError::InvalidConfiguration(_)))
}

#[tokio::test]
async fn test_no_driver_means_unsupported() {
    let mut bt = BluetoothTransport::new(bluetooth_config(Some("00:11:22:33:44:55")), None);
    let mut can = CanTransport::new(can_config(Some("can0"), 250_000), None);
    let mut radio = RadioTransport::new(radio_config(RadioType::SubGhz, Some(868_000)), None);

    assert!(matches!(bt.start().await, Err(AgioError::NotSupportedOnPlatform(_))));
    assert!(matches!(can.start().await, Err(AgioError::NotSupportedOnPlatform(_))));
    assert!(matches!(radio.start().await, Err(AgioError::NotSupportedOnPlatform(_))));
    assert!(!bt.is_connected());
}

#[tokio::test]
async fn test_bluetooth_config_errors() {
    let driver = Arc::new(RecordingDriver::default());

    for address in [None, Some(""), Some("00:11:22:33:44"), Some("00-11-22-33-44-55")] {
        let mut bt = BluetoothTransport::new(bluetooth_config(address), driver_of(&driver));
        assert!(is_invalid_config(bt.start().await), "address {address:?}");
    }
    assert!(driver.targets().is_empty());
}

#[tokio::test]
async fn test_bluetooth_target_is_normalized() {
    let driver = Arc::new(RecordingDriver::default());
    let config = BluetoothConfig {
        address: Some("aa:bb:cc:dd:ee:0f".to_string()),
        mode: BluetoothMode::Ble,
    };
    let mut bt = BluetoothTransport::new(config, driver_of(&driver));
    bt.start().await.unwrap();

    assert_eq!(
        driver.targets(),
        vec![LinkTarget::Bluetooth {
            address: "AA:BB:CC:DD:EE:0F".to_string(),
            mode: BluetoothMode::Ble,
        }]
    );
    assert_eq!(bt.kind(), TransportKind::Bluetooth);
    assert!(bt.is_connected());
    bt.stop().await.unwrap();
}

#[tokio::test]
async fn test_can_config_errors() {
    let driver = Arc::new(RecordingDriver::default());

    let mut missing = CanTransport::new(can_config(None, 250_000), driver_of(&driver));
    assert!(is_invalid_config(missing.start().await));

    let mut bad_baud = CanTransport::new(can_config(Some("can0"), 333_000), driver_of(&driver));
    assert!(is_invalid_config(bad_baud.start().await));

    let mut ok = CanTransport::new(can_config(Some("can0"), 500_000), driver_of(&driver));
    ok.start().await.unwrap();
    assert_eq!(
        driver.targets(),
        vec![LinkTarget::Can {
            adapter: "can0".to_string(),
            baud_rate: 500_000,
        }]
    );
}

#[tokio::test]
async fn test_radio_config_errors() {
    let driver = Arc::new(RecordingDriver::default());

    let mut missing = RadioTransport::new(radio_config(RadioType::SubGhz, None), driver_of(&driver));
    assert!(is_invalid_config(missing.start().await));

    let mut wrong_band =
        RadioTransport::new(radio_config(RadioType::SubGhz, Some(2_437_000)), driver_of(&driver));
    assert!(is_invalid_config(wrong_band.start().await));

    let mut wifi =
        RadioTransport::new(radio_config(RadioType::Wifi, Some(2_437_000)), driver_of(&driver));
    wifi.start().await.unwrap();
    assert_eq!(
        driver.targets(),
        vec![LinkTarget::Radio {
            radio_type: RadioType::Wifi,
            frequency_khz: 2_437_000,
            power_dbm: 14,
        }]
    );
}

#[tokio::test]
async fn test_stream_frames_flow_both_ways() {
    let driver = Arc::new(RecordingDriver::default());
    let mut can = CanTransport::new(can_config(Some("can0"), 250_000), driver_of(&driver));
    let mut events = can.take_events().unwrap();
    assert!(can.take_events().is_none());

    can.start().await.unwrap();
    assert_eq!(events.recv().await, Some(TransportEvent::ConnectionChanged(true)));
    let mut peer = driver.take_peer();

    // Two frames with noise in between, written in one burst
    let first = Frame::new(0x7B, 234, vec![1, 2, 3]).unwrap().to_bytes();
    let second = Frame::new(0x7B, 123, vec![1, 0, 0]).unwrap().to_bytes();
    let mut burst = first.clone();
    burst.extend_from_slice(&[0x00, 0x42]);
    burst.extend_from_slice(&second);
    peer.write_all(&burst).await.unwrap();

    for expected in [&first, &second] {
        match timeout(Duration::from_secs(1), events.recv()).await.unwrap() {
            Some(TransportEvent::DataReceived(bytes)) => assert_eq!(&bytes[..], &expected[..]),
            other => panic!("unexpected event {other:?}"),
        }
    }

    can.send(&[9, 8, 7]).await.unwrap();
    let mut buf = [0u8; 3];
    peer.read_exact(&mut buf).await.unwrap();
    assert_eq!(buf, [9, 8, 7]);

    can.stop().await.unwrap();
    assert_eq!(events.recv().await, Some(TransportEvent::ConnectionChanged(false)));
    assert!(matches!(can.send(&[1]).await, Err(AgioError::NotConnected)));

    // Stop is idempotent and the transport can be started again
    can.stop().await.unwrap();
    can.start().await.unwrap();
    assert!(can.is_connected());
}

#[tokio::test]
async fn test_stream_module_reaches_ready_through_coordinator() {
    let driver = Arc::new(RecordingDriver::default());
    let router = Arc::new(TransportRouter::new());
    {
        let driver = driver.clone();
        router
            .register_factory(TransportKind::Bluetooth, move |_module| {
                let driver: Arc<dyn LinkDriver> = driver.clone();
                Box::new(BluetoothTransport::new(
                    bluetooth_config(Some("00:11:22:33:44:55")),
                    Some(driver),
                )) as Box<dyn Transport>
            })
            .unwrap();
    }
    let timing = TimingConfig {
        implement_data_timeout: Duration::from_secs(5),
        ..TimingConfig::default()
    };
    let coordinator = ModuleCoordinator::new(router, timing).unwrap();

    coordinator
        .start_module(ModuleKind::ImplementController, TransportKind::Bluetooth)
        .await
        .unwrap();
    let mut peer = driver.take_peer();

    let hello = Frame::new(0x7B, 123, vec![1, 0, 0]).unwrap().to_bytes();
    peer.write_all(&hello[..3]).await.unwrap();
    peer.write_all(&hello[3..]).await.unwrap();

    let mut state = coordinator.watch_state(ModuleKind::ImplementController);
    timeout(Duration::from_secs(1), state.wait_for(|s| *s == ConnectionState::Ready))
        .await
        .unwrap()
        .unwrap();

    // Peer hang-up surfaces as a link error
    drop(peer);
    timeout(Duration::from_secs(1), state.wait_for(|s| *s == ConnectionState::Error))
        .await
        .unwrap()
        .unwrap();
    coordinator.shutdown().await.unwrap();
}
