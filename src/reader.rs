//! Response reader.
//!
//! Every read lands at offset 0 of one fixed-size buffer. The first read of a
//! response carries the status byte; a completed get_status may need more
//! reads, which carry raw result bytes only:
//!
//! ```text
//! read 1: [status][phase][result bytes ...........]
//! read 2: [result bytes ..........................]
//! read n: [result bytes .......]            <- total == expected
//! ```

use bytes::Bytes;

use crate::error::{ClientError, Result};
use crate::protocol::{Reply, ResultAssembler, MIN_RECEIVE_BUFFER_SIZE};
use crate::transport::Transport;

/// Fixed-buffer reader for responses.
#[derive(Debug)]
pub struct FrameReader {
    buf: Box<[u8]>,
}

impl FrameReader {
    /// Create a reader whose single read takes at most `size` bytes.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `size` cannot hold a status and a phase byte.
    pub fn new(size: usize) -> Result<Self> {
        if size < MIN_RECEIVE_BUFFER_SIZE {
            return Err(ClientError::InvalidArgument(format!(
                "receive buffer must hold at least {} bytes, got {}",
                MIN_RECEIVE_BUFFER_SIZE, size
            )));
        }
        Ok(Self {
            buf: vec![0u8; size].into_boxed_slice(),
        })
    }

    /// Size of the read buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Perform one read.
    ///
    /// # Errors
    ///
    /// `RemoteClosed` on a zero-length read.
    pub async fn receive<T: Transport>(&mut self, transport: &mut T) -> Result<&[u8]> {
        let n = transport.receive(&mut self.buf).await?;
        if n == 0 {
            return Err(ClientError::RemoteClosed);
        }
        Ok(&self.buf[..n])
    }

    /// Read the first packet of a response and strip the status byte.
    ///
    /// The body is copied out so the buffer can take the next read.
    ///
    /// # Errors
    ///
    /// - `RemoteClosed` on a zero-length read
    /// - `ProtocolViolation` for an unknown status byte
    /// - `Remote` when the service answered with `status=1`
    pub async fn receive_reply<T: Transport>(&mut self, transport: &mut T) -> Result<Bytes> {
        let packet = self.receive(transport).await?;
        tracing::debug!("Received response ({} bytes)", packet.len());
        let body = Reply::parse(packet)?.into_body()?;
        Ok(Bytes::copy_from_slice(body))
    }

    /// Keep reading until `assembler` holds its expected length.
    ///
    /// `assembler` may already contain the bytes that arrived with the
    /// status packet.
    ///
    /// # Errors
    ///
    /// - `RemoteClosed` if the stream ends first; no partial result is returned
    /// - `ProtocolViolation` if a read overruns the expected length
    pub async fn read_result<T: Transport>(
        &mut self,
        transport: &mut T,
        mut assembler: ResultAssembler,
    ) -> Result<Bytes> {
        if let Some(done) = assembler.push(&[])? {
            return Ok(done);
        }

        loop {
            let chunk = self.receive(transport).await?;
            tracing::trace!(
                "Result chunk: {} bytes, {} of {} collected",
                chunk.len(),
                assembler.len() + chunk.len(),
                assembler.expected()
            );
            if let Some(done) = assembler.push(chunk)? {
                tracing::debug!("Result complete ({} bytes)", done.len());
                return Ok(done);
            }
        }
    }
}
