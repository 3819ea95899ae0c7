//! Session builder and request/response pipeline.
//!
//! The [`SessionBuilder`] collects configuration and opens the connection.
//! The [`Session`] owns the transport, the tracker and the I/O buffers, and
//! runs one exchange at a time:
//! 1. Resolve defaults from the tracker
//! 2. Encode and send the request in one write
//! 3. Read the status packet (and result chunks, if any)
//! 4. Update the tracker
//!
//! # Example
//!
//! ```ignore
//! use transpose_client::{Matrix, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::builder()
//!         .address("127.0.0.1:3333")
//!         .connect()
//!         .await?;
//!
//!     let index = session.send_data(Matrix::from_text(&["1", "2", "3", "4"])?).await?;
//!     session.start_calculation(Some(index), None).await?;
//!
//!     let report = session.get_status(Some(index)).await?;
//!     if let Some(matrix) = report.result {
//!         print!("{}", matrix);
//!     }
//!     Ok(())
//! }
//! ```

use tokio::net::TcpStream;

use crate::codec::Matrix;
use crate::command::{Command, CommandOutcome, Resolved, StatusReport};
use crate::config::SessionConfig;
use crate::error::{ClientError, ErrorClass, Result};
use crate::protocol::{PhaseSet, TypeTag};
use crate::reader::FrameReader;
use crate::session::SessionTracker;
use crate::transport::{self, Transport};
use crate::writer::FrameWriter;

/// Builder for configuring and opening a [`Session`].
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    config: SessionConfig,
}

impl SessionBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Set the remote address used by [`connect`](Self::connect).
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    /// Set the size of the single-read buffer.
    pub fn receive_buffer_size(mut self, size: usize) -> Self {
        self.config.receive_buffer_size = size;
        self
    }

    /// Choose what the send_data type byte carries.
    pub fn type_tag(mut self, type_tag: TypeTag) -> Self {
        self.config.type_tag = type_tag;
        self
    }

    /// Choose the phase numbering used by the service.
    pub fn phase_set(mut self, phase_set: PhaseSet) -> Self {
        self.config.phase_set = phase_set;
        self
    }

    /// Thread count sent when start_calculation gets none.
    pub fn default_thread_count(mut self, threads: u8) -> Self {
        self.config.default_thread_count = threads;
        self
    }

    /// Dial the configured address over TCP.
    pub async fn connect(self) -> Result<Session<TcpStream>> {
        self.config.validate()?;
        let stream = transport::connect(&self.config.address).await?;
        self.with_transport(stream)
    }

    /// Run the session over an already-open transport.
    pub fn with_transport<T: Transport>(self, transport: T) -> Result<Session<T>> {
        self.config.validate()?;
        let reader = FrameReader::new(self.config.receive_buffer_size)?;
        Ok(Session {
            transport,
            config: self.config,
            tracker: SessionTracker::new(),
            writer: FrameWriter::new(),
            reader,
            poisoned: false,
        })
    }
}

/// A connection to the remote service plus everything known about it.
///
/// Methods take `&mut self`, so at most one exchange is in flight.
#[derive(Debug)]
pub struct Session<T> {
    transport: T,
    config: SessionConfig,
    tracker: SessionTracker,
    writer: FrameWriter,
    reader: FrameReader,
    /// Set after a transport failure; every later command fails.
    poisoned: bool,
}

impl Session<TcpStream> {
    /// Create a builder for configuring a session.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }
}

impl<T: Transport> Session<T> {
    /// Run one command through the full exchange.
    ///
    /// On failure the tracker is left as it was before the call.
    pub async fn execute(&mut self, command: Command) -> Result<CommandOutcome> {
        if self.poisoned {
            return Err(ClientError::RemoteClosed);
        }

        let opcode = command.opcode();
        let resolved = command.resolve(&mut self.tracker, &self.config)?;

        match self.exchange(&resolved).await {
            Ok(outcome) => {
                resolved.apply(&outcome, &mut self.tracker);
                Ok(outcome)
            }
            Err(e) => {
                resolved.rollback(&mut self.tracker);
                if e.is_fatal_to_session() {
                    tracing::warn!("{} failed, closing session: {}", opcode, e);
                    self.poisoned = true;
                } else if e.class() == ErrorClass::Remote {
                    tracing::warn!("{} rejected by server: {}", opcode, e);
                } else {
                    tracing::debug!("{} failed: {}", opcode, e);
                }
                Err(e)
            }
        }
    }

    async fn exchange(&mut self, resolved: &Resolved) -> Result<CommandOutcome> {
        let request = resolved.request(self.config.type_tag);
        self.writer
            .write_request(&mut self.transport, &request)
            .await?;

        let body = self.reader.receive_reply(&mut self.transport).await?;
        resolved
            .interpret(
                body,
                &mut self.reader,
                &mut self.transport,
                self.config.phase_set,
            )
            .await
    }

    /// Store a matrix remotely. Returns the index the service assigned.
    pub async fn send_data(&mut self, matrix: Matrix) -> Result<u8> {
        let outcome = self.execute(Command::SendData(matrix)).await?;
        Ok(outcome.index())
    }

    /// Parse row-major text tokens into a matrix and store it.
    pub async fn send_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<u8> {
        let matrix = Matrix::from_text(tokens)?;
        self.send_data(matrix).await
    }

    /// Start transposing. Returns the index that was started.
    ///
    /// Without an index, the oldest matrix not yet started is used. Without a
    /// thread count, the configured default is sent.
    pub async fn start_calculation(
        &mut self,
        index: Option<u8>,
        thread_count: Option<u8>,
    ) -> Result<u8> {
        let outcome = self
            .execute(Command::StartCalculation {
                index,
                thread_count,
            })
            .await?;
        Ok(outcome.index())
    }

    /// Query a job. Without an index, the oldest running job is polled.
    ///
    /// A completed job's result is downloaded and decoded with the kind and
    /// dimension recorded when it was sent.
    pub async fn get_status(&mut self, index: Option<u8>) -> Result<StatusReport> {
        let outcome = self.execute(Command::GetStatus { index }).await?;
        outcome.into_status().ok_or_else(|| {
            ClientError::ProtocolViolation("get_status produced no status".to_string())
        })
    }

    /// What this session knows about sent matrices.
    #[inline]
    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether a transport or protocol failure has made the session unusable.
    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Give back the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::NumericKind;
    use crate::protocol::Phase;
    use crate::session::Stage;
    use crate::transport::scripted::ScriptedStream;
    use pretty_assertions::assert_eq;

    fn session(chunks: Vec<Vec<u8>>) -> Session<ScriptedStream> {
        SessionBuilder::new()
            .with_transport(ScriptedStream::new(chunks))
            .unwrap()
    }

    #[test]
    fn test_builder_rejects_tiny_buffer() {
        let err = SessionBuilder::new()
            .receive_buffer_size(1)
            .with_transport(ScriptedStream::default())
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
        assert_eq!(err.class(), ErrorClass::Config);
    }

    #[test]
    fn test_builder_settings() {
        let session = SessionBuilder::new()
            .address("10.1.1.1:9")
            .type_tag(TypeTag::Code)
            .phase_set(PhaseSet::WithReady)
            .default_thread_count(8)
            .with_transport(ScriptedStream::default())
            .unwrap();

        let config = session.config();
        assert_eq!(config.address, "10.1.1.1:9");
        assert_eq!(config.type_tag, TypeTag::Code);
        assert_eq!(config.phase_set, PhaseSet::WithReady);
        assert_eq!(config.default_thread_count, 8);
    }

    #[tokio::test]
    async fn test_send_records_queued_job() {
        let mut session = session(vec![vec![0, 5]]);

        let index = session.send_tokens(&["300", "1", "2", "3"]).await.unwrap();
        assert_eq!(index, 5);
        assert_eq!(session.tracker().stage(5), Some(Stage::Queued));

        let written = session.into_transport().written;
        assert_eq!(&written[..6], &[0, 2, 2, 0, 0, 0]);
        assert_eq!(written.len(), 6 + 8);
    }

    #[tokio::test]
    async fn test_default_start_then_poll_completed() {
        let mut session = session(vec![vec![0, 5], vec![0], vec![0, 2, 1, 1, 0, 0]]);

        session.send_tokens(&["0", "1", "1", "0"]).await.unwrap();
        assert_eq!(session.start_calculation(None, None).await.unwrap(), 5);
        assert_eq!(session.tracker().stage(5), Some(Stage::Calculating));

        let report = session.get_status(None).await.unwrap();
        assert_eq!(report.phase, Phase::Completed);
        let matrix = report.result.unwrap();
        assert_eq!(matrix.kind(), NumericKind::Bool);
        assert_eq!(matrix.bytes(), &[1, 1, 0, 0]);
        assert_eq!(session.tracker().stage(5), Some(Stage::Collected));

        let written = session.into_transport().written;
        assert_eq!(&written[10..], &[1, 5, 0, 2, 5]);
    }

    #[tokio::test]
    async fn test_remote_error_requeues_default_start() {
        let mut refusal = vec![1];
        refusal.extend_from_slice(b"busy");
        let mut session = session(vec![vec![0, 3], refusal]);

        session.send_tokens(&["7"]).await.unwrap();
        let err = session.start_calculation(None, Some(2)).await.unwrap_err();

        assert!(matches!(err, ClientError::Remote(ref m) if m == "busy"));
        assert_eq!(session.tracker().stage(3), Some(Stage::Queued));
        assert!(!session.is_poisoned());
    }

    #[tokio::test]
    async fn test_disconnect_poisons_session() {
        let mut session = session(vec![vec![0, 1]]);
        session.send_tokens(&["1", "2", "3", "4"]).await.unwrap();

        let err = session.start_calculation(None, None).await.unwrap_err();
        assert!(matches!(err, ClientError::RemoteClosed));
        assert!(session.is_poisoned());
        assert_eq!(session.tracker().stage(1), Some(Stage::Queued));

        let err = session.get_status(Some(1)).await.unwrap_err();
        assert!(matches!(err, ClientError::RemoteClosed));
    }

    #[tokio::test]
    async fn test_unknown_status_index_does_no_io() {
        let mut session = session(vec![]);
        let err = session.get_status(Some(9)).await.unwrap_err();

        assert!(matches!(err, ClientError::UnknownIndex(9)));
        assert!(!session.is_poisoned());
        let stream = session.into_transport();
        assert!(stream.written.is_empty());
        assert_eq!(stream.read_calls, 0);
    }

    #[tokio::test]
    async fn test_running_job_stays_pollable() {
        let mut session = session(vec![vec![0, 0], vec![0], vec![0, 1]]);
        session.send_tokens(&["1"]).await.unwrap();
        session.start_calculation(None, None).await.unwrap();

        let report = session.get_status(None).await.unwrap();
        assert_eq!(report.phase, Phase::Running);
        assert_eq!(report.result, None);
        assert_eq!(session.tracker().take_next_to_poll().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_phase_poisons_session() {
        // The service is still sending [0, 7, 0, 0] when phase 3 is rejected.
        let mut session = session(vec![
            vec![0, 5],
            vec![0],
            vec![0, 3],
            vec![0, 7, 0, 0],
            vec![0, 6],
        ]);
        session.send_tokens(&["0", "1", "1", "0"]).await.unwrap();
        session.start_calculation(None, None).await.unwrap();

        let err = session.get_status(None).await.unwrap_err();
        assert!(matches!(err, ClientError::ProtocolViolation(_)));
        assert!(session.is_poisoned());

        let err = session.send_tokens(&["1"]).await.unwrap_err();
        assert!(matches!(err, ClientError::RemoteClosed));
        assert_eq!(session.into_transport().read_calls, 3);
    }

    #[tokio::test]
    async fn test_bool_result_out_of_range_poisons_session() {
        let mut session = session(vec![vec![0, 0], vec![0], vec![0, 2, 1, 2, 0, 0]]);
        session.send_tokens(&["0", "1", "1", "0"]).await.unwrap();
        session.start_calculation(None, None).await.unwrap();

        let err = session.get_status(None).await.unwrap_err();
        assert!(matches!(err, ClientError::ProtocolViolation(ref m) if m.contains("byte 2")));
        assert!(session.is_poisoned());
        assert_eq!(session.tracker().stage(0), Some(Stage::Calculating));
    }
}
