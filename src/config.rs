//! # Configuration Management
//!
//! Centralized configuration for the hardware I/O core.
//!
//! This module provides structured configuration for module lifecycle timing,
//! per-medium transport parameters and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - `AGIO_*` environment variable overrides via `from_env()`
//!
//! ## Timing Defaults
//! - Hello timeout 2 s; data timeouts 100 ms (steering, implement) and 300 ms (IMU)
//! - Watchdog tick 10 ms, well under the shortest timeout

use crate::error::{AgioError, Result};
use crate::protocol::module::ModuleKind;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Longest watchdog tick that still catches a 100 ms data timeout in time
pub const MAX_WATCHDOG_TICK: Duration = Duration::from_millis(20);

/// CAN bit rates supported by field modules
pub const CAN_BAUD_RATES: [u32; 4] = [125_000, 250_000, 500_000, 1_000_000];

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CoreConfig {
    /// Hello / data timeouts and coordinator cadence
    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub udp: UdpConfig,

    #[serde(default)]
    pub bluetooth: BluetoothConfig,

    #[serde(default)]
    pub can: CanConfig,

    #[serde(default)]
    pub radio: RadioConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CoreConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| AgioError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| AgioError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| AgioError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Defaults overridden by `AGIO_*` environment variables.
    ///
    /// Unparseable values are ignored and the default kept.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(val) = env_parse::<u64>("AGIO_HELLO_TIMEOUT_MS") {
            config.timing.hello_timeout = Duration::from_millis(val);
        }

        if let Some(val) = env_parse::<u64>("AGIO_WATCHDOG_TICK_MS") {
            config.timing.watchdog_tick = Duration::from_millis(val);
        }

        if let Some(val) = env_parse::<u64>("AGIO_INITIALIZE_TIMEOUT_MS") {
            config.timing.initialize_timeout = Duration::from_millis(val);
        }

        if let Some(val) = env_parse::<u64>("AGIO_HOST_HELLO_INTERVAL_MS") {
            config.timing.host_hello_interval = (val > 0).then(|| Duration::from_millis(val));
        }

        if let Some(ip) = env_parse::<IpAddr>("AGIO_UDP_BIND_IP") {
            config.udp.bind_ip = ip;
        }

        if let Some(addr) = env_parse::<SocketAddr>("AGIO_UDP_REMOTE") {
            config.udp.remote = addr;
        }

        if let Ok(address) = std::env::var("AGIO_BLUETOOTH_ADDRESS") {
            config.bluetooth.address = Some(address);
        }

        if let Ok(adapter) = std::env::var("AGIO_CAN_ADAPTER") {
            config.can.adapter = Some(adapter);
        }

        if let Some(val) = env_parse::<u32>("AGIO_CAN_BAUD") {
            config.can.baud_rate = val;
        }

        if let Some(val) = env_parse::<u32>("AGIO_RADIO_FREQUENCY_KHZ") {
            config.radio.frequency_khz = Some(val);
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AgioError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| AgioError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    /// Unset medium parameters are not errors here; they fail when that transport starts.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.timing.validate());
        errors.extend(self.udp.validate());
        errors.extend(self.bluetooth.validate());
        errors.extend(self.can.validate());
        errors.extend(self.radio.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AgioError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Module lifecycle timing
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Time without a hello before an active module times out
    #[serde(with = "duration_serde")]
    pub hello_timeout: Duration,

    #[serde(with = "duration_serde")]
    pub steering_data_timeout: Duration,

    #[serde(with = "duration_serde")]
    pub implement_data_timeout: Duration,

    #[serde(with = "duration_serde")]
    pub imu_data_timeout: Duration,

    /// Watchdog scan period
    #[serde(with = "duration_serde")]
    pub watchdog_tick: Duration,

    /// Upper bound for `initialize`
    #[serde(with = "duration_serde")]
    pub initialize_timeout: Duration,

    /// Host hello heartbeat; `None` disables it
    #[serde(with = "option_duration_serde")]
    pub host_hello_interval: Option<Duration>,

    /// Lowest module hello version that needs a capability acknowledgement
    pub two_phase_min_version: Option<u8>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            hello_timeout: Duration::from_millis(2000),
            steering_data_timeout: Duration::from_millis(100),
            implement_data_timeout: Duration::from_millis(100),
            imu_data_timeout: Duration::from_millis(300),
            watchdog_tick: Duration::from_millis(10),
            initialize_timeout: Duration::from_millis(5000),
            host_hello_interval: Some(Duration::from_millis(1000)),
            two_phase_min_version: None,
        }
    }
}

impl TimingConfig {
    /// Data timeout window for a module
    pub fn data_timeout(&self, module: ModuleKind) -> Duration {
        match module {
            ModuleKind::SteeringActuator => self.steering_data_timeout,
            ModuleKind::ImplementController => self.implement_data_timeout,
            ModuleKind::InertialUnit => self.imu_data_timeout,
        }
    }

    fn shortest_timeout(&self) -> Duration {
        ModuleKind::ALL
            .iter()
            .map(|m| self.data_timeout(*m))
            .fold(self.hello_timeout, Duration::min)
    }

    /// Validate timing configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("hello_timeout", self.hello_timeout),
            ("steering_data_timeout", self.steering_data_timeout),
            ("implement_data_timeout", self.implement_data_timeout),
            ("imu_data_timeout", self.imu_data_timeout),
            ("initialize_timeout", self.initialize_timeout),
        ] {
            if value.is_zero() {
                errors.push(format!("{name} must be greater than 0"));
            }
        }

        if self.watchdog_tick.is_zero() {
            errors.push("Watchdog tick must be greater than 0".to_string());
        } else if self.watchdog_tick > MAX_WATCHDOG_TICK {
            errors.push(format!(
                "Watchdog tick too long: {:?} (maximum: {:?})",
                self.watchdog_tick, MAX_WATCHDOG_TICK
            ));
        } else if self.watchdog_tick >= self.shortest_timeout() {
            errors.push(format!(
                "Watchdog tick {:?} must be shorter than the shortest timeout {:?}",
                self.watchdog_tick,
                self.shortest_timeout()
            ));
        }

        if let Some(interval) = self.host_hello_interval {
            if interval.as_millis() < 100 {
                errors.push("Host hello interval too short (minimum: 100ms)".to_string());
            } else if interval >= self.hello_timeout {
                errors.push(
                    "WARNING: Host hello interval is not shorter than the hello timeout"
                        .to_string(),
                );
            }
        }

        errors
    }
}

/// UDP/Ethernet transport parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UdpConfig {
    /// Local interface to bind
    pub bind_ip: IpAddr,

    pub steering_port: u16,
    pub implement_port: u16,
    pub imu_port: u16,

    /// Module-side destination for outbound frames
    pub remote: SocketAddr,

    /// Enable SO_BROADCAST on the socket
    pub broadcast: bool,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            steering_port: 9999,
            implement_port: 9998,
            imu_port: 9997,
            remote: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 5, 255)), 8888),
            broadcast: true,
        }
    }
}

impl UdpConfig {
    /// Local port a module's transport binds
    pub fn local_port(&self, module: ModuleKind) -> u16 {
        match module {
            ModuleKind::SteeringActuator => self.steering_port,
            ModuleKind::ImplementController => self.implement_port,
            ModuleKind::InertialUnit => self.imu_port,
        }
    }

    /// Validate UDP configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let ports = [self.steering_port, self.implement_port, self.imu_port];
        if ports.contains(&0) {
            errors.push("UDP module ports must be non-zero".to_string());
        }
        if ports[0] == ports[1] || ports[0] == ports[2] || ports[1] == ports[2] {
            errors.push(format!("UDP module ports must be distinct: {ports:?}"));
        }

        if self.remote.port() == 0 {
            errors.push("UDP remote port must be non-zero".to_string());
        }

        errors
    }
}

/// Bluetooth link flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BluetoothMode {
    /// Classic serial port profile
    #[default]
    Spp,
    Ble,
}

/// Bluetooth transport parameters
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BluetoothConfig {
    /// Device address as `AA:BB:CC:DD:EE:FF`
    pub address: Option<String>,
    pub mode: BluetoothMode,
}

impl BluetoothConfig {
    /// Validate Bluetooth configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(ref address) = self.address {
            if !is_mac_address(address) {
                errors.push(format!(
                    "Invalid Bluetooth address: '{address}' (expected format: 'AA:BB:CC:DD:EE:FF')"
                ));
            }
        }
        errors
    }
}

/// `AA:BB:CC:DD:EE:FF`, case-insensitive
pub fn is_mac_address(address: &str) -> bool {
    let parts: Vec<&str> = address.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

/// CAN transport parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CanConfig {
    /// Adapter path or interface name (e.g. `can0`)
    pub adapter: Option<String>,
    pub baud_rate: u32,
}

impl Default for CanConfig {
    fn default() -> Self {
        Self {
            adapter: None,
            baud_rate: 250_000,
        }
    }
}

impl CanConfig {
    /// Validate CAN configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if matches!(self.adapter.as_deref(), Some("")) {
            errors.push("CAN adapter cannot be empty".to_string());
        }
        if !CAN_BAUD_RATES.contains(&self.baud_rate) {
            errors.push(format!(
                "Unsupported CAN baud rate: {} (valid: {:?})",
                self.baud_rate, CAN_BAUD_RATES
            ));
        }
        errors
    }
}

/// Radio family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RadioType {
    /// 137 MHz – 1020 MHz ISM modems
    #[default]
    SubGhz,
    /// 2.4 GHz and 5 GHz bands
    Wifi,
}

impl RadioType {
    /// Whether a carrier frequency lies in one of this type's bands
    pub fn supports_frequency(&self, frequency_khz: u32) -> bool {
        match self {
            RadioType::SubGhz => (137_000..=1_020_000).contains(&frequency_khz),
            RadioType::Wifi => {
                (2_400_000..=2_500_000).contains(&frequency_khz)
                    || (5_150_000..=5_895_000).contains(&frequency_khz)
            }
        }
    }
}

/// Radio transport parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RadioConfig {
    pub radio_type: RadioType,
    pub frequency_khz: Option<u32>,
    /// Transmit power
    pub power_dbm: i8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            radio_type: RadioType::SubGhz,
            frequency_khz: None,
            power_dbm: 14,
        }
    }
}

impl RadioConfig {
    /// Validate radio configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(freq) = self.frequency_khz {
            if !self.radio_type.supports_frequency(freq) {
                errors.push(format!(
                    "Frequency {freq} kHz is outside the {:?} bands",
                    self.radio_type
                ));
            }
        }
        if !(-20..=30).contains(&self.power_dbm) {
            errors.push(format!(
                "Radio power out of range: {} dBm (valid range: -20..=30)",
                self.power_dbm
            ));
        }
        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("agio"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Duration as integer milliseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Optional duration as milliseconds; `0` reads back as disabled
mod option_duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.map_or(0, |d| d.as_millis() as u64);
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok((millis > 0).then(|| Duration::from_millis(millis)))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
