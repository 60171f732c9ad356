//! # Utility Modules
//!
//! Supporting utilities shared by the codec, transports and coordinator.
//!
//! ## Components
//! - **Logging**: `tracing-subscriber` setup from configuration
//! - **Metrics**: Thread-safe observability counters

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{global_metrics, MetricsSnapshot};
