//! Stream framing for byte-oriented links (Bluetooth SPP, CAN gateways, radio modems).
//!
//! Datagram transports hand over one frame per read; stream links do not, so
//! `PgnFrameCodec` carves frames out of an arbitrary byte stream. It resyncs on the
//! two header bytes, waits for partial frames, and skips one byte past any candidate
//! whose CRC fails. Corrupt input never surfaces as an error.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::core::frame::{Frame, FrameView, FRAME_OVERHEAD, HEADER_0, HEADER_1};
use crate::error::AgioError;
use crate::utils::metrics::global_metrics;

/// Tokio codec yielding validated raw frames
#[derive(Debug, Default, Clone, Copy)]
pub struct PgnFrameCodec;

impl PgnFrameCodec {
    /// Drop everything ahead of the next header candidate.
    /// Returns false when no candidate is present yet.
    fn sync_to_header(src: &mut BytesMut) -> bool {
        match src.windows(2).position(|w| w[0] == HEADER_0 && w[1] == HEADER_1) {
            Some(0) => true,
            Some(offset) => {
                trace!(skipped = offset, "Discarding bytes ahead of frame header");
                src.advance(offset);
                true
            }
            None => {
                // A trailing 0x80 may be the first half of a header split across reads
                let keep = usize::from(src.last() == Some(&HEADER_0));
                let discard = src.len() - keep;
                if discard > 0 {
                    src.advance(discard);
                }
                false
            }
        }
    }
}

impl Decoder for PgnFrameCodec {
    type Item = Bytes;
    type Error = AgioError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if !Self::sync_to_header(src) || src.len() < 5 {
                return Ok(None);
            }

            let total = FRAME_OVERHEAD + src[4] as usize;
            if src.len() < total {
                src.reserve(total - src.len());
                return Ok(None);
            }

            if FrameView::parse(&src[..total]).is_some() {
                return Ok(Some(src.split_to(total).freeze()));
            }

            global_metrics().frame_rejected();
            trace!(pgn = src[3], "Checksum mismatch in stream, resyncing");
            src.advance(1);
        }
    }

    // A truncated frame at end of stream is dropped, not an error
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                if !src.is_empty() {
                    trace!(bytes = src.len(), "Dropping partial frame at end of stream");
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<Frame> for PgnFrameCodec {
    type Error = AgioError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(frame.wire_len());
        dst.extend_from_slice(&frame.to_bytes());
        Ok(())
    }
}

impl Encoder<Bytes> for PgnFrameCodec {
    type Error = AgioError;

    fn encode(&mut self, raw: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&raw);
        Ok(())
    }
}
