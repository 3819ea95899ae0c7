//! Commands and their per-command halves of an exchange.
//!
//! [`Session::execute`](crate::Session::execute) runs the same pipeline for
//! every command:
//!
//! ```text
//! Command ─resolve─► Resolved ─request─► FrameWriter ─► FrameReader ─interpret─► CommandOutcome
//!    (defaults from the tracker)                                        (tracker updated by apply)
//! ```
//!
//! This module supplies the command-specific pieces: default selection, the
//! request frame, and the response interpreter.

use bytes::Bytes;

use crate::codec::Matrix;
use crate::config::SessionConfig;
use crate::error::{ClientError, Result};
use crate::numeric::NumericKind;
use crate::protocol::{Opcode, Phase, PhaseSet, Request, ResultAssembler, TypeTag};
use crate::reader::FrameReader;
use crate::session::SessionTracker;
use crate::transport::Transport;

/// A user command. `None` arguments are filled from session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store a matrix remotely.
    SendData(Matrix),
    /// Start transposing. Defaults to the oldest queued matrix and the
    /// configured thread count.
    StartCalculation {
        index: Option<u8>,
        thread_count: Option<u8>,
    },
    /// Ask for a job's phase. Defaults to the oldest calculating matrix.
    GetStatus { index: Option<u8> },
}

impl Command {
    /// Opcode this command is sent with.
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::SendData(_) => Opcode::SendData,
            Command::StartCalculation { .. } => Opcode::StartCalculation,
            Command::GetStatus { .. } => Opcode::GetStatus,
        }
    }

    /// Fill in defaults. Runs before any I/O.
    pub(crate) fn resolve(
        self,
        tracker: &mut SessionTracker,
        config: &SessionConfig,
    ) -> Result<Resolved> {
        match self {
            Command::SendData(matrix) => Ok(Resolved::SendData(matrix)),
            Command::StartCalculation {
                index,
                thread_count,
            } => {
                let thread_count = thread_count.unwrap_or(config.default_thread_count);
                let (index, took_default) = match index {
                    Some(index) => (index, false),
                    None => (tracker.take_next_to_calculate()?, true),
                };
                Ok(Resolved::StartCalculation {
                    index,
                    thread_count,
                    took_default,
                })
            }
            Command::GetStatus { index } => {
                let index = match index {
                    Some(index) => index,
                    None => tracker.take_next_to_poll()?,
                };
                let record = tracker
                    .record(index)
                    .ok_or(ClientError::UnknownIndex(index))?;
                Ok(Resolved::GetStatus {
                    index,
                    kind: record.kind,
                    dimension: record.dimension,
                    expected_len: record.byte_length,
                })
            }
        }
    }
}

/// A command with every argument known.
#[derive(Debug, Clone)]
pub(crate) enum Resolved {
    SendData(Matrix),
    StartCalculation {
        index: u8,
        thread_count: u8,
        took_default: bool,
    },
    GetStatus {
        index: u8,
        kind: NumericKind,
        dimension: u32,
        expected_len: usize,
    },
}

impl Resolved {
    /// Request frame for this command.
    pub(crate) fn request(&self, type_tag: TypeTag) -> Request {
        match self {
            Resolved::SendData(matrix) => Request::SendData {
                type_tag: type_tag.encode(matrix.kind()),
                dimension: matrix.dimension(),
                matrix: matrix.payload_bytes(),
            },
            Resolved::StartCalculation {
                index,
                thread_count,
                ..
            } => Request::StartCalculation {
                index: *index,
                thread_count: *thread_count,
            },
            Resolved::GetStatus { index, .. } => Request::GetStatus { index: *index },
        }
    }

    /// Decode a successful response body, reading further result chunks if
    /// the job is complete.
    pub(crate) async fn interpret<T: Transport>(
        &self,
        body: Bytes,
        reader: &mut FrameReader,
        transport: &mut T,
        phase_set: PhaseSet,
    ) -> Result<CommandOutcome> {
        match self {
            Resolved::SendData(_) => match body[..] {
                [index] => Ok(CommandOutcome::Stored { index }),
                _ => Err(body_length_error(Opcode::SendData, "1 byte", body.len())),
            },
            Resolved::StartCalculation {
                index,
                thread_count,
                ..
            } => {
                if !body.is_empty() {
                    return Err(body_length_error(
                        Opcode::StartCalculation,
                        "no bytes",
                        body.len(),
                    ));
                }
                Ok(CommandOutcome::Started {
                    index: *index,
                    thread_count: *thread_count,
                })
            }
            Resolved::GetStatus {
                index,
                kind,
                dimension,
                expected_len,
            } => {
                let (&phase_byte, rest) = body.split_first().ok_or_else(|| {
                    body_length_error(Opcode::GetStatus, "a phase byte", 0)
                })?;
                let phase = phase_set.decode(phase_byte)?;
                tracing::debug!("Index {} is {}", index, phase);

                if phase != Phase::Completed {
                    if !rest.is_empty() {
                        return Err(body_length_error(
                            Opcode::GetStatus,
                            "only a phase byte",
                            body.len(),
                        ));
                    }
                    return Ok(CommandOutcome::Status(StatusReport {
                        index: *index,
                        phase,
                        result: None,
                    }));
                }

                let mut assembler = ResultAssembler::new(*expected_len);
                let bytes = match assembler.push(rest)? {
                    Some(done) => done,
                    None => reader.read_result(transport, assembler).await?,
                };
                let matrix = Matrix::from_wire(*kind, *dimension, bytes)?;

                Ok(CommandOutcome::Status(StatusReport {
                    index: *index,
                    phase,
                    result: Some(matrix),
                }))
            }
        }
    }

    /// Record a successful exchange in the tracker.
    pub(crate) fn apply(&self, outcome: &CommandOutcome, tracker: &mut SessionTracker) {
        match (self, outcome) {
            (Resolved::SendData(matrix), CommandOutcome::Stored { index }) => {
                tracker.record_sent(
                    *index,
                    matrix.kind(),
                    matrix.dimension(),
                    matrix.payload_len(),
                );
            }
            (
                Resolved::StartCalculation {
                    index,
                    took_default: false,
                    ..
                },
                _,
            ) => tracker.mark_calculating(*index),
            (Resolved::GetStatus { index, .. }, CommandOutcome::Status(report))
                if report.phase == Phase::Completed =>
            {
                tracker.mark_collected(*index)
            }
            _ => {}
        }
    }

    /// Undo default selection after a failed exchange.
    pub(crate) fn rollback(&self, tracker: &mut SessionTracker) {
        if let Resolved::StartCalculation {
            index,
            took_default: true,
            ..
        } = self
        {
            tracker.requeue(*index);
        }
    }
}

fn body_length_error(opcode: Opcode, wanted: &str, got: usize) -> ClientError {
    ClientError::ProtocolViolation(format!(
        "{} response body should be {}, got {} bytes",
        opcode, wanted, got
    ))
}

/// Result of a get_status exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub index: u8,
    pub phase: Phase,
    /// The transposed matrix, present only when `phase` is `Completed`.
    pub result: Option<Matrix>,
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The service stored the matrix under `index`.
    Stored { index: u8 },
    /// The service accepted the start request.
    Started { index: u8, thread_count: u8 },
    /// Phase (and maybe result) of a job.
    Status(StatusReport),
}

impl CommandOutcome {
    /// Index the outcome refers to.
    pub fn index(&self) -> u8 {
        match self {
            CommandOutcome::Stored { index } | CommandOutcome::Started { index, .. } => *index,
            CommandOutcome::Status(report) => report.index,
        }
    }

    /// The status report, if this was a get_status outcome.
    pub fn into_status(self) -> Option<StatusReport> {
        match self {
            CommandOutcome::Status(report) => Some(report),
            _ => None,
        }
    }
}
