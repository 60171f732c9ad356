//! # Core Wire Components
//!
//! Low-level frame handling shared by every module and every transport.
//!
//! ## Components
//! - **Frame**: the fixed wire layout, byte-sum CRC and defensive decoding
//! - **Codec**: Tokio codec that carves frames out of byte streams
//!
//! ## Wire Format
//! ```text
//! [0x80][0x81][Source(1)][PGN(1)][Length(1)][Payload(Length)][CRC(1)]
//! ```
//!
//! ## Robustness
//! - Decoding never panics and never allocates based on the length byte alone
//! - Corrupt frames decode to `None`; streams resync on the next header

pub mod codec;
pub mod frame;
