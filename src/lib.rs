//! # transpose-client
//!
//! Rust client for a remote matrix-transposition service.
//!
//! The client turns rows of numeric text into a compact binary matrix,
//! ships it to the service, asks for it to be transposed, and downloads the
//! result, which may arrive split over several reads.
//!
//! ## Architecture
//!
//! - **Numeric**: closed set of fixed-width kinds and the narrowest-fit rule
//! - **Codec**: text tokens ⇄ packed little-endian matrix bytes
//! - **Protocol**: opcode/status/phase bytes, request frames, result reassembly
//! - **Session**: tracker of sent matrices plus the half-duplex exchange loop
//!
//! ## Example
//!
//! ```ignore
//! use transpose_client::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), transpose_client::ClientError> {
//!     let mut session = Session::builder().connect().await?;
//!
//!     let index = session.send_tokens(&["1", "2", "3", "4"]).await?;
//!     session.start_calculation(Some(index), None).await?;
//!     let report = session.get_status(Some(index)).await?;
//!     println!("{}", report.phase);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod numeric;
pub mod protocol;
pub mod reader;
pub mod session;
pub mod transport;
pub mod writer;

mod client;

pub use client::{Session, SessionBuilder};
pub use codec::Matrix;
pub use command::{Command, CommandOutcome, StatusReport};
pub use config::SessionConfig;
pub use error::{ClientError, ErrorClass, Result};
pub use numeric::NumericKind;
pub use protocol::Phase;
