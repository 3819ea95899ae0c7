//! Request frames and response envelopes.
//!
//! # Example
//!
//! ```
//! use transpose_client::protocol::{build_frame, Reply, Request};
//!
//! let bytes = build_frame(&Request::GetStatus { index: 5 });
//! assert_eq!(bytes, [2, 5]);
//!
//! let reply = Reply::parse(&[0, 5]).unwrap();
//! assert_eq!(reply, Reply::Ok(&[5]));
//! ```

use bytes::{BufMut, Bytes};

use super::wire_format::{Opcode, Status, SEND_DATA_HEADER_SIZE};
use crate::error::{ClientError, Result};

/// A request as placed on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Store a matrix. The service answers with an index.
    SendData {
        type_tag: u8,
        dimension: u32,
        matrix: Bytes,
    },
    /// Start transposing the matrix at `index`.
    StartCalculation { index: u8, thread_count: u8 },
    /// Ask for the phase of the job at `index`.
    GetStatus { index: u8 },
}

impl Request {
    /// Opcode written as the first byte.
    pub fn opcode(&self) -> Opcode {
        match self {
            Request::SendData { .. } => Opcode::SendData,
            Request::StartCalculation { .. } => Opcode::StartCalculation,
            Request::GetStatus { .. } => Opcode::GetStatus,
        }
    }

    /// Total frame length including the opcode.
    pub fn encoded_len(&self) -> usize {
        match self {
            Request::SendData { matrix, .. } => SEND_DATA_HEADER_SIZE + matrix.len(),
            Request::StartCalculation { .. } => 3,
            Request::GetStatus { .. } => 2,
        }
    }

    /// Append the complete frame to `buf`.
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.opcode().code());
        match self {
            Request::SendData {
                type_tag,
                dimension,
                matrix,
            } => {
                buf.put_u8(*type_tag);
                buf.put_u32_le(*dimension);
                buf.put_slice(matrix);
            }
            Request::StartCalculation {
                index,
                thread_count,
            } => {
                buf.put_u8(*index);
                buf.put_u8(*thread_count);
            }
            Request::GetStatus { index } => buf.put_u8(*index),
        }
    }
}

/// Build a complete request frame as a single byte vector.
pub fn build_frame(request: &Request) -> Vec<u8> {
    let mut buf = Vec::with_capacity(request.encoded_len());
    request.encode_into(&mut buf);
    buf
}

/// The first packet of a response, split at the status byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<'a> {
    /// `status=0`; the command body follows.
    Ok(&'a [u8]),
    /// `status=1`; the remote's UTF-8 message.
    Error(String),
}

impl<'a> Reply<'a> {
    /// Parse the first packet of a response.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the packet is empty or the status byte is
    /// neither 0 nor 1.
    pub fn parse(packet: &'a [u8]) -> Result<Self> {
        let (&status, body) = packet
            .split_first()
            .ok_or_else(|| ClientError::ProtocolViolation("empty response".to_string()))?;

        match Status::from_byte(status)? {
            Status::Ok => Ok(Reply::Ok(body)),
            Status::Error => Ok(Reply::Error(String::from_utf8_lossy(body).into_owned())),
        }
    }

    /// Body of a successful reply, or the remote's message as an error.
    pub fn into_body(self) -> Result<&'a [u8]> {
        match self {
            Reply::Ok(body) => Ok(body),
            Reply::Error(message) => Err(ClientError::Remote(message)),
        }
    }
}
