//! Raw JSON stream codec.
//!
//! Messages are bare JSON objects with no delimiter between them. The
//! decoder pulls one complete object at a time off the buffer, skips
//! whitespace between objects and drops anything it cannot parse.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::BridgeError;

use super::messages::{InboundMessage, OutboundMessage};

/// Largest inbound message buffered before giving up (1 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Codec for concatenated JSON objects.
#[derive(Debug, Clone)]
pub struct JsonStreamCodec {
    max_message_size: usize,
}

impl JsonStreamCodec {
    /// Codec with the default size limit.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Codec with a custom size limit.
    #[must_use]
    pub const fn with_max_size(max_message_size: usize) -> Self {
        Self { max_message_size }
    }
}

impl Default for JsonStreamCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops bytes up to the next `{` after the first byte, or everything.
fn resync(src: &mut BytesMut) {
    let next = src.iter().skip(1).position(|&b| b == b'{').map(|p| p + 1);
    match next {
        Some(idx) => src.advance(idx),
        None => src.clear(),
    }
}

impl Decoder for JsonStreamCodec {
    type Item = InboundMessage;
    type Error = BridgeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(start) = src.iter().position(|b| !b.is_ascii_whitespace()) else {
                src.clear();
                return Ok(None);
            };
            src.advance(start);

            if src[0] != b'{' {
                warn!(byte = src[0], "discarding non-object bridge input");
                resync(src);
                continue;
            }

            let (parsed, consumed) = {
                let mut stream =
                    serde_json::Deserializer::from_slice(&src[..]).into_iter::<serde_json::Value>();
                let parsed = stream.next();
                (parsed, stream.byte_offset())
            };

            match parsed {
                Some(Ok(value)) => {
                    src.advance(consumed);
                    match serde_json::from_value::<InboundMessage>(value) {
                        Ok(message) => return Ok(Some(message)),
                        Err(e) => warn!(error = %e, "discarding unrecognised bridge message"),
                    }
                }
                Some(Err(e)) if e.is_eof() => {
                    if src.len() > self.max_message_size {
                        let size = src.len();
                        src.clear();
                        return Err(BridgeError::MessageTooLarge {
                            size,
                            limit: self.max_message_size,
                        });
                    }
                    return Ok(None);
                }
                Some(Err(e)) => {
                    warn!(error = %e, "discarding malformed bridge input");
                    resync(src);
                }
                None => return Ok(None),
            }
        }
    }
}

impl Encoder<OutboundMessage> for JsonStreamCodec {
    type Error = BridgeError;

    fn encode(&mut self, item: OutboundMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = serde_json::to_vec(&item)?;
        dst.reserve(bytes.len());
        dst.put_slice(&bytes);
        Ok(())
    }
}
