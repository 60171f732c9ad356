//! # Protocol Layer
//!
//! Typed messages on top of the raw frame format.
//!
//! ## Components
//! - **Module**: the closed set of field modules and their source bytes / hello PGNs
//! - **Message**: the PGN catalog with validating builders and defensive parsers
//! - **Hello**: host hello, scan request, module hello and handshake phase rules
//!
//! Everything here is pure: no I/O, no shared state, safe to call from any thread.

pub mod hello;
pub mod message;
pub mod module;
