//! Integration tests for transpose-client.
//!
//! These run full sessions against the in-process service in `common`.

mod common;

use std::io;

use pretty_assertions::assert_eq;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::net::TcpListener;

use common::{serve, spawn_service, ServiceConfig, PIPE_CAPACITY};
use transpose_client::numeric::NumericValue;
use transpose_client::protocol::{PhaseSet, TypeTag};
use transpose_client::session::Stage;
use transpose_client::{
    ClientError, Command, CommandOutcome, Matrix, NumericKind, Phase, Session, SessionBuilder,
};

fn connect(config: ServiceConfig) -> Session<DuplexStream> {
    let (stream, _task) = spawn_service(config);
    SessionBuilder::new()
        .phase_set(config.phase_set)
        .type_tag(config.type_tag)
        .with_transport(stream)
        .unwrap()
}

/// Check `result` is `original` with rows and columns swapped.
fn assert_transposed(original: &Matrix, result: &Matrix) {
    assert_eq!(result.kind(), original.kind());
    assert_eq!(result.dimension(), original.dimension());
    let n = original.dimension();
    for row in 0..n {
        for col in 0..n {
            assert_eq!(
                result.get(row, col).unwrap(),
                original.get(col, row).unwrap()
            );
        }
    }
}

#[tokio::test]
async fn test_bool_matrix_round_trip() {
    let mut session = connect(ServiceConfig::default());

    let original = Matrix::from_text(&["0", "1", "0", "0"]).unwrap();
    assert_eq!(original.kind(), NumericKind::Bool);

    let index = session.send_data(original.clone()).await.unwrap();
    assert_eq!(session.tracker().stage(index), Some(Stage::Queued));

    assert_eq!(session.start_calculation(None, None).await.unwrap(), index);
    let report = session.get_status(None).await.unwrap();

    assert_eq!(report.phase, Phase::Completed);
    let result = report.result.unwrap();
    assert_eq!(result.bytes(), &[0, 0, 1, 0]);
    assert_transposed(&original, &result);
    assert_eq!(session.tracker().stage(index), Some(Stage::Collected));
}

#[tokio::test]
async fn test_result_larger_than_receive_buffer() {
    let mut session = connect(ServiceConfig::default());

    let tokens: Vec<String> = (0..400).map(|i| format!("{}.5", i)).collect();
    let original = Matrix::from_text(&tokens).unwrap();
    assert_eq!(original.kind(), NumericKind::F64);
    assert_eq!(original.payload_len(), 3200);

    session.send_data(original.clone()).await.unwrap();
    session.start_calculation(None, None).await.unwrap();
    let result = session.get_status(None).await.unwrap().result.unwrap();

    assert_transposed(&original, &result);
}

#[tokio::test]
async fn test_two_byte_receive_buffer() {
    let (stream, _task) = spawn_service(ServiceConfig::default());
    let mut session = SessionBuilder::new()
        .receive_buffer_size(2)
        .with_transport(stream)
        .unwrap();

    let tokens: Vec<String> = (1..=9).map(|i| (i * 100).to_string()).collect();
    let original = Matrix::from_text(&tokens).unwrap();
    assert_eq!(original.kind(), NumericKind::U16);

    session.send_data(original.clone()).await.unwrap();
    session.start_calculation(None, None).await.unwrap();
    let result = session.get_status(None).await.unwrap().result.unwrap();

    assert_transposed(&original, &result);
    assert_eq!(result.get(0, 1).unwrap(), NumericValue::U16(400));
}

#[tokio::test]
async fn test_polls_until_completed() {
    let mut session = connect(ServiceConfig {
        polls_before_done: 2,
        ..ServiceConfig::default()
    });

    let index = session.send_tokens(&["1", "-2", "3", "-4"]).await.unwrap();
    session.start_calculation(Some(index), Some(4)).await.unwrap();
    assert_eq!(session.tracker().stage(index), Some(Stage::Calculating));

    for _ in 0..2 {
        let report = session.get_status(None).await.unwrap();
        assert_eq!(report.phase, Phase::Running);
        assert!(report.result.is_none());
    }

    let report = session.get_status(None).await.unwrap();
    assert_eq!(report.phase, Phase::Completed);
    assert_eq!(report.result.unwrap().to_string(), "1 3\n-2 -4\n");

    assert!(matches!(
        session.get_status(None).await,
        Err(ClientError::NoRunningJob)
    ));
}

#[tokio::test]
async fn test_status_before_start() {
    let mut session = connect(ServiceConfig::default());
    let index = session.send_tokens(&["5"]).await.unwrap();

    let report = session.get_status(Some(index)).await.unwrap();
    assert_eq!(report.phase, Phase::NoData);
    assert_eq!(session.tracker().stage(index), Some(Stage::Queued));
}

#[tokio::test]
async fn test_phase_set_with_ready() {
    let mut session = connect(ServiceConfig {
        phase_set: PhaseSet::WithReady,
        ..ServiceConfig::default()
    });
    let index = session.send_tokens(&["5", "6", "7", "8"]).await.unwrap();

    let report = session.get_status(Some(index)).await.unwrap();
    assert_eq!(report.phase, Phase::Ready);

    session.start_calculation(None, None).await.unwrap();
    let report = session.get_status(None).await.unwrap();
    assert_eq!(report.phase, Phase::Completed);
    assert_eq!(report.result.unwrap().bytes(), &[5, 7, 6, 8]);
}

#[tokio::test]
async fn test_type_code_tag() {
    let mut session = connect(ServiceConfig {
        type_tag: TypeTag::Code,
        ..ServiceConfig::default()
    });

    let original = Matrix::from_text(&["-70000", "1", "2", "3"]).unwrap();
    assert_eq!(original.kind(), NumericKind::I32);

    session.send_data(original.clone()).await.unwrap();
    session.start_calculation(None, None).await.unwrap();
    let result = session.get_status(None).await.unwrap().result.unwrap();

    assert_transposed(&original, &result);
}

#[tokio::test]
async fn test_jobs_are_served_oldest_first() {
    let mut session = connect(ServiceConfig::default());

    for tokens in [["1"], ["2"], ["3"]] {
        session.send_tokens(&tokens).await.unwrap();
    }
    assert_eq!(session.tracker().latest(), Some(2));

    assert_eq!(session.start_calculation(None, None).await.unwrap(), 0);
    assert_eq!(session.start_calculation(None, None).await.unwrap(), 1);

    assert_eq!(session.get_status(None).await.unwrap().index, 0);
    assert_eq!(session.get_status(None).await.unwrap().index, 1);
    assert!(matches!(
        session.get_status(None).await,
        Err(ClientError::NoRunningJob)
    ));
    assert_eq!(session.tracker().stage(2), Some(Stage::Queued));
}

#[tokio::test]
async fn test_execute_reports_outcomes() {
    let mut session = connect(ServiceConfig::default());
    let matrix = Matrix::from_text(&["1", "0", "0", "1"]).unwrap();

    let outcome = session.execute(Command::SendData(matrix)).await.unwrap();
    assert_eq!(outcome, CommandOutcome::Stored { index: 0 });

    let outcome = session
        .execute(Command::StartCalculation {
            index: None,
            thread_count: Some(2),
        })
        .await
        .unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::Started {
            index: 0,
            thread_count: 2
        }
    );
}

#[tokio::test]
async fn test_remote_error_keeps_session_usable() {
    let mut session = connect(ServiceConfig::default());

    let err = session.start_calculation(Some(42), None).await.unwrap_err();
    assert!(matches!(err, ClientError::Remote(ref m) if m == "Matrix index out of range"));
    assert!(!session.is_poisoned());
    assert!(session.tracker().is_empty());

    let index = session.send_tokens(&["1", "2", "3", "4"]).await.unwrap();
    assert_eq!(index, 0);
}

#[tokio::test]
async fn test_local_validation_before_io() {
    let mut session = connect(ServiceConfig::default());

    assert!(matches!(
        session.get_status(Some(3)).await,
        Err(ClientError::UnknownIndex(3))
    ));
    assert!(matches!(
        session.start_calculation(None, None).await,
        Err(ClientError::NoPendingJob)
    ));
    assert!(matches!(
        session.send_tokens(&["1", "2", "3"]).await,
        Err(ClientError::NotSquare { count: 3 })
    ));

    // The stream is still in sync.
    assert_eq!(session.send_tokens(&["9"]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_disconnect_mid_result() {
    let (client, mut server) = duplex(PIPE_CAPACITY);

    let service = tokio::spawn(async move {
        let mut send_data = [0u8; 6 + 8];
        server.read_exact(&mut send_data).await?;
        server.write_all(&[0, 0]).await?;

        let mut start = [0u8; 3];
        server.read_exact(&mut start).await?;
        server.write_all(&[0]).await?;

        let mut status = [0u8; 2];
        server.read_exact(&mut status).await?;
        server.write_all(&[0, 2, 1, 0, 2]).await?;
        Ok::<_, io::Error>(())
    });

    let mut session = SessionBuilder::new().with_transport(client).unwrap();
    session.send_tokens(&["300", "1", "2", "3"]).await.unwrap();
    session.start_calculation(None, None).await.unwrap();

    let err = session.get_status(None).await.unwrap_err();
    assert!(matches!(err, ClientError::RemoteClosed));
    service.await.unwrap().unwrap();
    assert!(session.is_poisoned());
    assert_eq!(session.tracker().stage(0), Some(Stage::Calculating));

    assert!(matches!(
        session.send_tokens(&["1"]).await,
        Err(ClientError::RemoteClosed)
    ));
}

#[tokio::test]
async fn test_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await?;
        serve(stream, ServiceConfig::default()).await
    });

    let mut session = SessionBuilder::new()
        .address(address)
        .connect()
        .await
        .unwrap();

    let original = Matrix::from_text(&["1", "2", "3", "4", "5", "6", "7", "8", "9"]).unwrap();
    session.send_data(original.clone()).await.unwrap();
    session.start_calculation(None, None).await.unwrap();
    let result = session.get_status(None).await.unwrap().result.unwrap();

    assert_transposed(&original, &result);
    assert_eq!(result.to_string(), "1 4 7\n2 5 8\n3 6 9\n");
}
