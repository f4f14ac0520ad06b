#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::Decoder;
use invisible_cost::bridge::JsonStreamCodec;

fuzz_target!(|data: &[u8]| {
    let mut codec = JsonStreamCodec::with_max_size(4096);
    let mut buf = BytesMut::from(data);
    // decode until the codec needs more input or rejects a frame
    while let Ok(Some(_)) = codec.decode(&mut buf) {}
    let _ = codec.decode_eof(&mut buf);
});
