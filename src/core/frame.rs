//! # Frame
//!
//! The wire unit exchanged with every module:
//!
//! ```text
//! [0x80][0x81][source][pgn][length][payload: length bytes][crc]
//! ```
//!
//! `crc` is the wrapping byte sum of everything from `source` through the last
//! payload byte. Decoding is defensive: the slice length is the ground truth for
//! bounds, the CRC is checked over the bytes actually present, and any structural
//! problem yields `None` instead of an error.

use crate::error::{constants, AgioError, Result};

/// First header byte
pub const HEADER_0: u8 = 0x80;
/// Second header byte
pub const HEADER_1: u8 = 0x81;

/// Header (2) + source + pgn + length + crc
pub const FRAME_OVERHEAD: usize = 6;

/// Largest payload the one-byte length field can describe
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// One decoded or to-be-encoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub source: u8,
    pub pgn: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a frame, rejecting payloads the length byte cannot describe
    pub fn new(source: u8, pgn: u8, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(AgioError::invalid(format!(
                "{} ({} bytes)",
                constants::ERR_PAYLOAD_TOO_LONG,
                payload.len()
            )));
        }
        Ok(Self {
            source,
            pgn,
            payload,
        })
    }

    /// Total encoded size
    #[inline]
    pub fn wire_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// CRC this frame carries on the wire
    pub fn checksum(&self) -> u8 {
        let head = self
            .source
            .wrapping_add(self.pgn)
            .wrapping_add(self.payload.len() as u8);
        checksum(&self.payload).wrapping_add(head)
    }

    /// Serialize to wire bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_len());
        self.write_to(&mut out);
        out
    }

    /// Append wire bytes to an existing buffer
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[
            HEADER_0,
            HEADER_1,
            self.source,
            self.pgn,
            self.payload.len() as u8,
        ]);
        out.extend_from_slice(&self.payload);
        out.push(self.checksum());
    }

    /// Decode one complete frame.
    ///
    /// Returns `None` when the slice is shorter than a frame header, the header
    /// bytes do not match, the trailing CRC disagrees with the bytes present, or
    /// the declared length disagrees with the slice length.
    pub fn from_bytes(bytes: &[u8]) -> Option<Frame> {
        let view = FrameView::parse(bytes)?;
        Some(Frame {
            source: view.source,
            pgn: view.pgn,
            payload: view.payload.to_vec(),
        })
    }
}

/// Borrowed view over a validated frame, used on hot paths that only inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameView<'a> {
    pub source: u8,
    pub pgn: u8,
    pub payload: &'a [u8],
}

impl<'a> FrameView<'a> {
    pub fn parse(bytes: &'a [u8]) -> Option<Self> {
        if bytes.len() < FRAME_OVERHEAD || bytes[0] != HEADER_0 || bytes[1] != HEADER_1 {
            return None;
        }

        // CRC spans index 2 up to the byte before the trailer, whatever the length byte says
        let last = bytes.len() - 1;
        if checksum(&bytes[2..last]) != bytes[last] {
            return None;
        }

        let declared = bytes[4] as usize;
        if FRAME_OVERHEAD + declared != bytes.len() {
            return None;
        }

        Some(Self {
            source: bytes[2],
            pgn: bytes[3],
            payload: &bytes[5..last],
        })
    }
}

/// Wrapping byte sum
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}
