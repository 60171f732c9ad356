//! # Service Layer
//!
//! Module lifecycle on top of the transport router.
//!
//! ## Components
//! - **State**: per-module connection state machine with an explicit clock
//! - **Coordinator**: inbound pumps, timeout watchdog, host hello heartbeat and
//!   the `initialize` orchestration
//!
//! ## Timeouts
//! - Hello: 2000 ms in any active state
//! - Data (Ready only): 100 ms steering and implement, 300 ms inertial unit

pub mod coordinator;
pub mod state;

pub use coordinator::{CoreEvent, ModuleCoordinator};
pub use state::{ConnectionState, ModuleRecord, ModuleStatus, TimeoutCause};
