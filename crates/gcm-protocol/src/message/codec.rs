//! Length-delimited JSON framing.
//!
//! Each frame is a 4-byte big-endian length followed by one JSON-encoded
//! [`Message`]. A frame that is not a valid message decodes to an
//! [`AppError`] item instead of failing the stream, so the connection can
//! answer `ERROR` and keep reading. An incoming frame over the size limit is
//! a stream error and ends the connection.
//!
//! The server side replaces an outgoing message that would exceed the limit
//! with a short `ERROR`, so an oversized response never drops the peer.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};
use tracing::warn;

use gcm_core::{AppError, ErrorKind};

use super::envelope::Message;

/// Frames [`Message`]s over a byte stream.
#[derive(Debug)]
pub struct MessageCodec {
    frames: LengthDelimitedCodec,
    max_frame_bytes: usize,
    replace_oversized: bool,
}

impl MessageCodec {
    /// Create a codec that rejects frames larger than `max_frame_bytes`.
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            frames: LengthDelimitedCodec::builder()
                .max_frame_length(max_frame_bytes)
                .new_codec(),
            max_frame_bytes,
            replace_oversized: false,
        }
    }

    /// Like [`MessageCodec::new`], but outgoing messages over the limit are
    /// sent as an `ERROR` instead of failing the write.
    pub fn server(max_frame_bytes: usize) -> Self {
        Self {
            replace_oversized: true,
            ..Self::new(max_frame_bytes)
        }
    }
}

impl Decoder for MessageCodec {
    type Item = Result<Message, AppError>;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(frame) = self.frames.decode(src)? else {
            return Ok(None);
        };
        let decoded = serde_json::from_slice::<Message>(&frame)
            .map_err(|e| AppError::protocol(format!("Malformed message: {e}")));
        Ok(Some(decoded))
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut body = serde_json::to_vec(&item)?;
        if self.replace_oversized && body.len() > self.max_frame_bytes {
            warn!(
                action = %item.action,
                size = body.len(),
                limit = self.max_frame_bytes,
                "Response exceeds the frame limit"
            );
            let replacement = Message::error(
                ErrorKind::Internal,
                format!(
                    "Response too large ({} bytes, limit {})",
                    body.len(),
                    self.max_frame_bytes
                ),
            );
            body = serde_json::to_vec(&replacement)?;
        }
        self.frames.encode(Bytes::from(body), dst)
    }
}

/// Raw frame bodies, used by clients that need to send arbitrary bytes.
impl Encoder<Bytes> for MessageCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.frames.encode(item, dst)
    }
}
