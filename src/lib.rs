//! # agio
//!
//! Hardware I/O core for agricultural guidance: the wire protocol, transport
//! routing and module lifecycle for steering actuators, implement (section)
//! controllers and inertial units.
//!
//! ## Layers
//! - [`core`]: frame layout, byte-sum CRC and stream framing
//! - [`protocol`]: PGN message catalog, hellos and module identities
//! - [`transport`]: UDP, Bluetooth, CAN, radio and in-memory transports behind one
//!   trait, plus the per-module router
//! - [`service`]: the module coordinator and its connection state machine
//! - [`config`], [`error`], [`utils`]: configuration, error types, logging and metrics
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use agio::config::CoreConfig;
//! use agio::protocol::module::ModuleKind;
//! use agio::service::ModuleCoordinator;
//! use agio::transport::udp::UdpTransport;
//! use agio::transport::{Transport, TransportKind, TransportRouter};
//!
//! # async fn run() -> agio::error::Result<()> {
//! let config = CoreConfig::default();
//! let router = Arc::new(TransportRouter::new());
//! let udp = config.udp.clone();
//! router.register_factory(TransportKind::Udp, move |module| {
//!     Box::new(UdpTransport::new(module, udp.clone())) as Box<dyn Transport>
//! })?;
//!
//! let coordinator = ModuleCoordinator::new(router, config.timing.clone())?;
//! coordinator
//!     .initialize(ModuleKind::SteeringActuator, TransportKind::Udp)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use crate::config::CoreConfig;
pub use crate::core::frame::Frame;
pub use crate::error::{AgioError, Result};
pub use crate::protocol::message::{parse, PgnMessage, TypedMessage};
pub use crate::protocol::module::ModuleKind;
pub use crate::service::{ConnectionState, CoreEvent, ModuleCoordinator};
pub use crate::transport::{Transport, TransportKind, TransportRouter};
