#![no_main]

use agio::core::frame::Frame;
use agio::protocol::message::parse;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Frame and typed decoding must reject garbage without panicking
    let _ = Frame::from_bytes(data);
    let _ = parse(data);
});
