//! Accumulator for a completed result that spans several reads.
//!
//! Uses `bytes::BytesMut` so the finished payload is frozen without copying.
//! The total length is known in advance (it was recorded when the matrix was
//! sent), so the state machine only has two states:
//! - `Collecting`: fewer than `expected` bytes so far
//! - `Complete`: exactly `expected` bytes
//!
//! # Example
//!
//! ```
//! use transpose_client::protocol::ResultAssembler;
//!
//! let mut assembler = ResultAssembler::new(4);
//! assert!(assembler.push(&[1, 2]).unwrap().is_none());
//! let payload = assembler.push(&[3, 4]).unwrap().unwrap();
//! assert_eq!(&payload[..], &[1, 2, 3, 4]);
//! ```

use bytes::{Bytes, BytesMut};

use crate::error::{ClientError, Result};

/// Buffer that collects result bytes until a known length is reached.
#[derive(Debug)]
pub struct ResultAssembler {
    /// Bytes received so far.
    buffer: BytesMut,
    /// Total length the result must reach.
    expected: usize,
}

impl ResultAssembler {
    /// Create an assembler for a result of `expected` bytes.
    pub fn new(expected: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(expected),
            expected,
        }
    }

    /// Append one read's worth of result bytes.
    ///
    /// Returns the full payload once exactly `expected` bytes have arrived,
    /// `None` while more are needed.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the data would overrun the expected length.
    pub fn push(&mut self, data: &[u8]) -> Result<Option<Bytes>> {
        if data.len() > self.remaining() {
            return Err(ClientError::ProtocolViolation(format!(
                "result overruns expected length: {} + {} > {}",
                self.buffer.len(),
                data.len(),
                self.expected
            )));
        }

        self.buffer.extend_from_slice(data);

        if self.is_complete() {
            Ok(Some(self.buffer.split().freeze()))
        } else {
            Ok(None)
        }
    }

    /// Bytes still missing.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.expected - self.buffer.len()
    }

    /// Bytes collected so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been collected yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Total length the result must reach.
    #[inline]
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Whether the expected length has been reached.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.buffer.len() == self.expected
    }
}
