//! Wire format constants and single-byte fields.
//!
//! Requests start with an opcode byte, responses with a status byte:
//! ```text
//! send_data          ┌────────┬─────────┬───────────┬──────────────┐
//!   request          │ op = 0 │ typeTag │ dimension │ matrix bytes │
//!                    │ 1 byte │ 1 byte  │ u32 LE    │ N bytes      │
//!                    └────────┴─────────┴───────────┴──────────────┘
//! start_calculation  ┌────────┬────────┬─────────────┐
//!   request          │ op = 1 │ index  │ threadCount │
//!                    └────────┴────────┴─────────────┘
//! get_status         ┌────────┬────────┐
//!   request          │ op = 2 │ index  │
//!                    └────────┴────────┘
//!
//! response           ┌────────────┬──────────────────────────────────┐
//!                    │ status 0/1 │ command body | utf8 error message │
//!                    └────────────┴──────────────────────────────────┘
//! ```
//!
//! All multi-byte integers are Little Endian.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ClientError, Result};
use crate::numeric::NumericKind;

/// Default size of the single-read transport buffer (one Ethernet MTU).
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 1500;

/// Smallest usable receive buffer: status + phase must fit in one read.
pub const MIN_RECEIVE_BUFFER_SIZE: usize = 2;

/// Fixed bytes before the matrix in a send_data request.
pub const SEND_DATA_HEADER_SIZE: usize = 1 + 1 + 4;

/// Status byte of a successful response.
pub const STATUS_OK: u8 = 0;

/// Status byte of a rejected request.
pub const STATUS_ERROR: u8 = 1;

/// Request opcode. The numbering is agreed with the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    SendData = 0,
    StartCalculation = 1,
    GetStatus = 2,
}

impl Opcode {
    /// All opcodes in wire order.
    pub const ALL: [Opcode; 3] = [Opcode::SendData, Opcode::StartCalculation, Opcode::GetStatus];

    /// Wire byte.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Command name as typed by a user.
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::SendData => "send_data",
            Opcode::StartCalculation => "start_calculation",
            Opcode::GetStatus => "get_status",
        }
    }

    /// Look up an opcode by its wire byte.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Opcode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| ClientError::InvalidArgument(format!("unknown command: {}", s)))
    }
}

/// Response status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    /// Decode the first byte of a response.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            STATUS_OK => Ok(Status::Ok),
            STATUS_ERROR => Ok(Status::Error),
            other => Err(ClientError::ProtocolViolation(format!(
                "Unknown server response: status byte is {}",
                other
            ))),
        }
    }
}

/// Job phase reported by get_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No matrix stored under the index.
    NoData,
    /// Stored but not started. Only reported with [`PhaseSet::WithReady`].
    Ready,
    /// Transposition in progress.
    Running,
    /// Finished; the result matrix follows the phase byte.
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::NoData => "no data",
            Phase::Ready => "ready",
            Phase::Running => "running",
            Phase::Completed => "completed",
        })
    }
}

/// Which phase numbering the remote service uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseSet {
    /// `NoData=0, Running=1, Completed=2`.
    #[default]
    Standard,
    /// `NoData=0, Ready=1, Running=2, Completed=3`.
    WithReady,
}

impl PhaseSet {
    /// Decode a phase byte.
    pub fn decode(self, byte: u8) -> Result<Phase> {
        let phase = match (self, byte) {
            (_, 0) => Some(Phase::NoData),
            (PhaseSet::Standard, 1) => Some(Phase::Running),
            (PhaseSet::Standard, 2) => Some(Phase::Completed),
            (PhaseSet::WithReady, 1) => Some(Phase::Ready),
            (PhaseSet::WithReady, 2) => Some(Phase::Running),
            (PhaseSet::WithReady, 3) => Some(Phase::Completed),
            _ => None,
        };
        phase.ok_or_else(|| {
            ClientError::ProtocolViolation(format!("Unknown phase byte {} ({:?})", byte, self))
        })
    }

    /// Encode a phase, if this set has it.
    pub fn encode(self, phase: Phase) -> Option<u8> {
        match (self, phase) {
            (_, Phase::NoData) => Some(0),
            (PhaseSet::Standard, Phase::Ready) => None,
            (PhaseSet::Standard, Phase::Running) => Some(1),
            (PhaseSet::Standard, Phase::Completed) => Some(2),
            (PhaseSet::WithReady, Phase::Ready) => Some(1),
            (PhaseSet::WithReady, Phase::Running) => Some(2),
            (PhaseSet::WithReady, Phase::Completed) => Some(3),
        }
    }
}

/// What the type byte of a send_data request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    /// Element width in bytes.
    #[default]
    Width,
    /// Type code ([`NumericKind::code`]).
    Code,
}

impl TypeTag {
    /// Byte sent for `kind`.
    #[inline]
    pub fn encode(self, kind: NumericKind) -> u8 {
        match self {
            TypeTag::Width => kind.width() as u8,
            TypeTag::Code => kind.code(),
        }
    }
}
