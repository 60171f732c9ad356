//! # Error Types
//!
//! Error handling for the hardware I/O core.
//!
//! This module defines every error the codec, the transport layer and the module
//! coordinator can hand back to a caller.
//!
//! ## Error Categories
//! - **Build errors**: payload values that fail domain validation (`InvalidArgument`)
//! - **Routing errors**: no transport bound, unknown transport kind
//! - **Transport errors**: medium unavailable, bad transport parameters, I/O failures
//! - **Lifecycle errors**: initialization timeouts
//!
//! Corrupt or unrecognized inbound frames are deliberately *not* errors. Decoding
//! returns `Option` so a bad frame never stops the pipeline.
//!
//! ## Example Usage
//! ```rust
//! use agio::error::{AgioError, Result};
//! use agio::protocol::message::{PgnMessage, SteeringCommand};
//!
//! fn build(speed: f64) -> Result<Vec<u8>> {
//!     let cmd = SteeringCommand {
//!         speed_kmh: speed,
//!         status: 1,
//!         steer_angle_deg: 0.0,
//!         cross_track_error_mm: 0,
//!     };
//!     Ok(cmd.build()?.to_bytes())
//! }
//!
//! assert!(matches!(build(-1.0), Err(AgioError::InvalidArgument(_))));
//! ```

use crate::protocol::module::ModuleKind;
use crate::transport::TransportKind;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Registry errors
    pub const ERR_FACTORY_LOCK: &str = "Failed to acquire lock on transport factory registry";

    /// Transport lifecycle errors
    pub const ERR_TRANSPORT_STOPPED: &str = "Transport is stopped";
    pub const ERR_EVENTS_TAKEN: &str = "Transport event stream already taken";
    pub const ERR_INBOUND_TAKEN: &str = "Inbound event stream already taken";
    pub const ERR_LINK_CLOSED: &str = "Link closed by peer";

    /// Platform availability
    pub const ERR_NO_BLUETOOTH: &str = "No Bluetooth driver available on this platform";
    pub const ERR_NO_CAN: &str = "No CAN driver available on this platform";
    pub const ERR_NO_RADIO: &str = "No radio driver available on this platform";

    /// Configuration errors
    pub const ERR_MISSING_BT_ADDRESS: &str = "Bluetooth device address is not set";
    pub const ERR_MISSING_CAN_ADAPTER: &str = "CAN adapter path is not set";
    pub const ERR_MISSING_RADIO_FREQUENCY: &str = "Radio frequency is not set";
    pub const ERR_UDP_PORT_UNSET: &str = "UDP local port is not set";

    /// Build validation errors
    pub const ERR_NEGATIVE_SPEED: &str = "Speed must not be negative";
    pub const ERR_NOT_FINITE: &str = "Value must be a finite number";
    pub const ERR_RELAY_BANK_LEN: &str = "Relay banks must hold exactly 8 bytes each";
    pub const ERR_PAYLOAD_TOO_LONG: &str = "Payload exceeds 255 bytes";
}

/// AgioError is the error type for all fallible operations in the crate
#[derive(Error, Debug)]
pub enum AgioError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Transport not connected")]
    NotConnected,

    #[error("No active transport for module {0}")]
    NoActiveTransport(ModuleKind),

    #[error("Not supported on this platform: {0}")]
    NotSupportedOnPlatform(String),

    #[error("Invalid transport configuration: {0}")]
    InvalidConfiguration(String),

    #[error("No factory registered for transport kind {0}")]
    UnknownTransportKind(TransportKind),

    #[error("Transport already started")]
    AlreadyStarted,

    #[error("Module {module} did not become ready within {waited:?}")]
    InitializationTimeout { module: ModuleKind, waited: Duration },

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Event channel closed")]
    ChannelClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AgioError {
    /// Shorthand for an `InvalidArgument` built from any displayable message
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        AgioError::InvalidArgument(msg.into())
    }
}

/// Type alias for Results using AgioError
pub type Result<T> = std::result::Result<T, AgioError>;
