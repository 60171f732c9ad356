//! Liveness and discovery messages.
//!
//! The host announces itself with a hello (PGN 200) and can broadcast a scan
//! request (PGN 202). Every module answers with its own hello on a module-specific
//! PGN (126 steering, 123 implement, 121 inertial unit) carrying its protocol
//! version. The coordinator uses these hellos to drive each module's lifecycle.
//!
//! **Handshake phases**
//! All modules in the field today complete their handshake with a single hello.
//! A capability-negotiating module would stop at `HelloReceived` until acknowledged;
//! which protocol versions do that is not fixed yet, so the threshold is a
//! configuration value that is unset by default.

use serde::{Deserialize, Serialize};

use crate::core::frame::FrameView;
use crate::error::Result;
use crate::protocol::message::{pgn, PgnMessage};
use crate::protocol::module::{ModuleKind, HOST_SOURCE};

/// Protocol version the host advertises in its hello
pub const HOST_PROTOCOL_VERSION: u8 = 1;

/// Fixed payload of a scan request
pub const SCAN_REQUEST_BYTES: [u8; 2] = [0xCA, 0xCA];

/// Host announcement (PGN 200)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostHello {
    pub version: u8,
}

impl Default for HostHello {
    fn default() -> Self {
        Self {
            version: HOST_PROTOCOL_VERSION,
        }
    }
}

impl PgnMessage for HostHello {
    fn source(&self) -> u8 {
        HOST_SOURCE
    }

    fn pgn(&self) -> u8 {
        pgn::HOST_HELLO
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&[self.version, 0, 0]);
        Ok(())
    }

    fn decode(frame: &FrameView<'_>) -> Option<Self> {
        (frame.pgn == pgn::HOST_HELLO && frame.payload.len() == 3).then(|| Self {
            version: frame.payload[0],
        })
    }
}

/// Module discovery broadcast (PGN 202)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanRequest;

impl PgnMessage for ScanRequest {
    fn source(&self) -> u8 {
        HOST_SOURCE
    }

    fn pgn(&self) -> u8 {
        pgn::SCAN_REQUEST
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&SCAN_REQUEST_BYTES);
        Ok(())
    }

    fn decode(frame: &FrameView<'_>) -> Option<Self> {
        (frame.pgn == pgn::SCAN_REQUEST && frame.payload.len() == 2).then_some(ScanRequest)
    }
}

/// Hello sent by a module (PGN 126, 123 or 121)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleHello {
    pub module: ModuleKind,
    pub version: u8,
}

impl PgnMessage for ModuleHello {
    fn source(&self) -> u8 {
        self.module.source()
    }

    fn pgn(&self) -> u8 {
        self.module.hello_pgn()
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&[self.version, 0, 0]);
        Ok(())
    }

    // The source byte is not checked so future modules on known PGNs still register
    fn decode(frame: &FrameView<'_>) -> Option<Self> {
        let module = ModuleKind::from_hello_pgn(frame.pgn)?;
        (frame.payload.len() == 3).then(|| Self {
            module,
            version: frame.payload[0],
        })
    }
}

/// How many steps a module's handshake takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelloPhase {
    /// Hello alone makes the module ready
    SinglePhase,
    /// Hello must be followed by a capability acknowledgement
    TwoPhase,
}

impl HelloPhase {
    /// Classify a hello version. `two_phase_min_version` of `None` means every
    /// version completes in a single phase.
    pub fn classify(version: u8, two_phase_min_version: Option<u8>) -> Self {
        match two_phase_min_version {
            Some(min) if version >= min => HelloPhase::TwoPhase,
            _ => HelloPhase::SinglePhase,
        }
    }
}

pub fn parse_module_hello(bytes: &[u8]) -> Option<ModuleHello> {
    ModuleHello::parse(bytes)
}

pub fn parse_host_hello(bytes: &[u8]) -> Option<HostHello> {
    HostHello::parse(bytes)
}

pub fn parse_scan_request(bytes: &[u8]) -> Option<ScanRequest> {
    ScanRequest::parse(bytes)
}
