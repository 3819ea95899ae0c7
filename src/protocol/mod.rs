//! Protocol module - wire format, request frames, and result reassembly.
//!
//! This module implements the binary protocol spoken with the remote service:
//! - opcode / status / phase bytes and wire constants
//! - request frame encoding and response envelope parsing
//! - reassembly of completed results that span several reads

mod frame;
mod frame_buffer;
mod wire_format;

pub use frame::{build_frame, Reply, Request};
pub use frame_buffer::ResultAssembler;
pub use wire_format::{
    Opcode, Phase, PhaseSet, Status, TypeTag, DEFAULT_RECEIVE_BUFFER_SIZE,
    MIN_RECEIVE_BUFFER_SIZE, SEND_DATA_HEADER_SIZE, STATUS_ERROR, STATUS_OK,
};
