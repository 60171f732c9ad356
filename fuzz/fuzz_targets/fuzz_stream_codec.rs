#![no_main]

use agio::core::codec::PgnFrameCodec;
use agio::core::frame::FrameView;
use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    let mut codec = PgnFrameCodec;
    let mut buf = BytesMut::from(data);
    // Every emitted frame must be valid; the loop must terminate
    while let Ok(Some(frame)) = codec.decode(&mut buf) {
        assert!(FrameView::parse(&frame).is_some());
    }
    let _ = codec.decode_eof(&mut buf);
});
