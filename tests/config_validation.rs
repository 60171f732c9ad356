//! Integration tests for configuration validation

#![allow(clippy::expect_used, clippy::unwrap_used)]

use agio::config::{
    BluetoothMode, CoreConfig, LoggingConfig, RadioType, TimingConfig, UdpConfig,
};
use agio::error::AgioError;
use agio::protocol::module::ModuleKind;
use serial_test::serial;
use std::time::Duration;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = CoreConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
    assert!(config.validate_strict().is_ok());
}

#[test]
fn test_default_timing_values() {
    let timing = TimingConfig::default();
    assert_eq!(timing.hello_timeout, Duration::from_millis(2000));
    assert_eq!(timing.data_timeout(ModuleKind::SteeringActuator), Duration::from_millis(100));
    assert_eq!(timing.data_timeout(ModuleKind::ImplementController), Duration::from_millis(100));
    assert_eq!(timing.data_timeout(ModuleKind::InertialUnit), Duration::from_millis(300));
    assert!(timing.watchdog_tick <= Duration::from_millis(20));
    assert_eq!(timing.two_phase_min_version, None);
}

#[test]
fn test_default_udp_ports() {
    let udp = UdpConfig::default();
    assert_eq!(udp.local_port(ModuleKind::SteeringActuator), 9999);
    assert_eq!(udp.local_port(ModuleKind::ImplementController), 9998);
    assert_eq!(udp.local_port(ModuleKind::InertialUnit), 9997);
    assert_eq!(udp.remote.to_string(), "192.168.5.255:8888");
}

#[test]
fn test_watchdog_tick_too_long() {
    let mut config = CoreConfig::default();
    config.timing.watchdog_tick = Duration::from_millis(50);

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Watchdog tick too long")));
}

#[test]
fn test_watchdog_tick_must_undercut_shortest_timeout() {
    let mut config = CoreConfig::default();
    config.timing.steering_data_timeout = Duration::from_millis(15);
    config.timing.watchdog_tick = Duration::from_millis(15);

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("shortest timeout")));
}

#[test]
fn test_zero_timeouts_rejected() {
    let mut config = CoreConfig::default();
    config.timing.hello_timeout = Duration::ZERO;
    config.timing.imu_data_timeout = Duration::ZERO;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("hello_timeout")));
    assert!(errors.iter().any(|e| e.contains("imu_data_timeout")));
}

#[test]
fn test_duplicate_udp_ports() {
    let mut config = CoreConfig::default();
    config.udp.implement_port = config.udp.steering_port;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("distinct")));
}

#[test]
fn test_invalid_bluetooth_address() {
    let mut config = CoreConfig::default();
    config.bluetooth.address = Some("00:11:22:33:44".to_string());

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Invalid Bluetooth address")));

    config.bluetooth.address = Some("00:1a:2B:33:44:55".to_string());
    assert!(config.validate().is_empty());
}

#[test]
fn test_unsupported_can_baud() {
    let mut config = CoreConfig::default();
    config.can.baud_rate = 100_000;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Unsupported CAN baud rate")));
}

#[test]
fn test_radio_frequency_band() {
    let mut config = CoreConfig::default();
    config.radio.frequency_khz = Some(2_437_000);
    assert!(config.validate().iter().any(|e| e.contains("outside")));

    config.radio.radio_type = RadioType::Wifi;
    assert!(config.validate().is_empty());

    config.radio.power_dbm = 40;
    assert!(config.validate().iter().any(|e| e.contains("power")));
}

#[test]
fn test_logging_requires_output() {
    let logging = LoggingConfig {
        log_to_console: false,
        log_to_file: false,
        ..LoggingConfig::default()
    };
    let errors = logging.validate();
    assert!(errors.iter().any(|e| e.contains("At least one logging output")));
}

#[test]
fn test_logging_file_path_required() {
    let logging = LoggingConfig {
        log_to_file: true,
        log_file_path: None,
        ..LoggingConfig::default()
    };
    assert!(logging
        .validate()
        .iter()
        .any(|e| e.contains("log_file_path must be specified")));
}

#[test]
fn test_validate_strict_collects_all_errors() {
    let mut config = CoreConfig::default();
    config.timing.watchdog_tick = Duration::ZERO;
    config.can.baud_rate = 1;

    match config.validate_strict() {
        Err(AgioError::ConfigError(msg)) => {
            assert!(msg.contains("Watchdog tick"));
            assert!(msg.contains("CAN baud"));
        }
        other => panic!("Expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_toml_roundtrip() {
    let mut config = CoreConfig::default();
    config.timing.two_phase_min_version = Some(4);
    config.timing.host_hello_interval = None;
    config.bluetooth.address = Some("AA:BB:CC:DD:EE:FF".to_string());
    config.bluetooth.mode = BluetoothMode::Ble;
    config.logging.log_level = Level::DEBUG;

    let text = toml::to_string_pretty(&config).unwrap();
    let parsed = CoreConfig::from_toml(&text).unwrap();

    assert_eq!(parsed.timing.two_phase_min_version, Some(4));
    assert_eq!(parsed.timing.host_hello_interval, None);
    assert_eq!(parsed.bluetooth.mode, BluetoothMode::Ble);
    assert_eq!(parsed.bluetooth.address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
    assert_eq!(parsed.logging.log_level, Level::DEBUG);
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config = CoreConfig::from_toml(
        r#"
        [timing]
        hello_timeout = 3000

        [can]
        adapter = "can1"
        "#,
    )
    .unwrap();

    assert_eq!(config.timing.hello_timeout, Duration::from_millis(3000));
    assert_eq!(config.timing.imu_data_timeout, Duration::from_millis(300));
    assert_eq!(config.can.adapter.as_deref(), Some("can1"));
    assert_eq!(config.can.baud_rate, 250_000);
    assert_eq!(config.udp.steering_port, 9999);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let result = CoreConfig::from_toml("timing = 5");
    assert!(matches!(result, Err(AgioError::ConfigError(_))));
}

#[test]
fn test_example_config_parses() {
    let text = CoreConfig::example_config();
    let parsed = CoreConfig::from_toml(&text).expect("example config should parse");
    assert!(parsed.validate().is_empty());
}

#[test]
fn test_save_and_load_file() {
    let path = std::env::temp_dir().join(format!("agio-config-{}.toml", std::process::id()));
    let config = CoreConfig::default_with_overrides(|c| {
        c.can.adapter = Some("can0".to_string());
        c.can.baud_rate = 500_000;
    });

    config.save_to_file(&path).unwrap();
    let loaded = CoreConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.can.adapter.as_deref(), Some("can0"));
    assert_eq!(loaded.can.baud_rate, 500_000);
}

#[test]
fn test_missing_file_is_config_error() {
    let result = CoreConfig::from_file("/definitely/not/here/agio.toml");
    assert!(matches!(result, Err(AgioError::ConfigError(_))));
}

#[test]
#[serial]
fn test_env_overrides() {
    std::env::set_var("AGIO_HELLO_TIMEOUT_MS", "2500");
    std::env::set_var("AGIO_HOST_HELLO_INTERVAL_MS", "0");
    std::env::set_var("AGIO_CAN_ADAPTER", "vcan0");
    std::env::set_var("AGIO_CAN_BAUD", "not-a-number");

    let config = CoreConfig::from_env().unwrap();

    std::env::remove_var("AGIO_HELLO_TIMEOUT_MS");
    std::env::remove_var("AGIO_HOST_HELLO_INTERVAL_MS");
    std::env::remove_var("AGIO_CAN_ADAPTER");
    std::env::remove_var("AGIO_CAN_BAUD");

    assert_eq!(config.timing.hello_timeout, Duration::from_millis(2500));
    assert_eq!(config.timing.host_hello_interval, None);
    assert_eq!(config.can.adapter.as_deref(), Some("vcan0"));
    // Unparseable values keep the default
    assert_eq!(config.can.baud_rate, 250_000);
}
