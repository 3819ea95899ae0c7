//! Request writer.
//!
//! Encodes a [`Request`] into a reusable buffer and hands the whole frame to
//! the transport in one write.
//!
//! ```text
//! Request ─► encode_into(BytesMut) ─► Transport::send ─► sent == len ?
//!                                                          │
//!                                              no ─► ShortWrite (fatal)
//! ```
//!
//! The protocol has no resynchronisation marker, so a frame that only
//! partially reached the peer leaves the stream in an unknown state.

use bytes::BytesMut;

use crate::error::{ClientError, Result};
use crate::protocol::Request;
use crate::transport::Transport;

/// Initial capacity of the frame buffer; grows for large matrices.
pub const DEFAULT_WRITE_BUFFER_CAPACITY: usize = 256;

/// Reusable encoder for outbound frames.
#[derive(Debug)]
pub struct FrameWriter {
    buf: BytesMut,
}

impl FrameWriter {
    /// Create a writer with the default buffer capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_WRITE_BUFFER_CAPACITY)
    }

    /// Create a writer with a specific initial buffer capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Encode `request` and send it with a single write.
    ///
    /// # Errors
    ///
    /// - `Io` if the write itself fails
    /// - `ShortWrite` if the transport took fewer bytes than the frame holds
    pub async fn write_request<T: Transport>(
        &mut self,
        transport: &mut T,
        request: &Request,
    ) -> Result<()> {
        self.buf.clear();
        self.buf.reserve(request.encoded_len());
        request.encode_into(&mut self.buf);

        let expected = self.buf.len();
        let sent = transport.send(&self.buf).await?;
        if sent != expected {
            return Err(ClientError::ShortWrite { sent, expected });
        }

        tracing::debug!("Sent {} request ({} bytes)", request.opcode(), sent);
        Ok(())
    }
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}
