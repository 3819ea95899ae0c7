//! Send one matrix to a transposition service and print the result.
//!
//! ```text
//! cargo run --example transpose -- 127.0.0.1:3333 "1, 2, 3" "4, 5, 6" "7, 8, 9"
//! ```
//!
//! Set `TRANSPOSE_CONFIG` to a JSON file to override session settings, and
//! `RUST_LOG=transpose_client=debug` to see the exchange.

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use transpose_client::codec::tokens_from_rows;
use transpose_client::{Matrix, Phase, Session, SessionBuilder, SessionConfig, StatusReport};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match std::env::var("TRANSPOSE_CONFIG") {
        Ok(path) => SessionConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        Err(_) => SessionConfig::default(),
    };

    let mut args = std::env::args().skip(1);
    if let Some(address) = args.next() {
        config.address = address;
    }
    let rows: Vec<String> = args.collect();
    let rows = if rows.is_empty() {
        vec!["1, 2".to_string(), "3, 4".to_string()]
    } else {
        rows
    };

    let matrix = Matrix::from_text(&tokens_from_rows(&rows))?;
    tracing::info!(
        "Sending {}x{} {} matrix to {}",
        matrix.dimension(),
        matrix.dimension(),
        matrix.kind(),
        config.address
    );

    let mut session: Session<_> = SessionBuilder::from_config(config).connect().await?;
    let index = session.send_data(matrix).await?;
    session.start_calculation(Some(index), None).await?;

    loop {
        let report = session.get_status(Some(index)).await?;
        match settle(report)? {
            Some(result) => {
                print!("{}", result);
                return Ok(());
            }
            None => tokio::time::sleep(POLL_INTERVAL).await,
        }
    }
}

/// Decide what one poll of a started job means: the result, keep polling, or give up.
fn settle(report: StatusReport) -> Result<Option<Matrix>, String> {
    match (report.phase, report.result) {
        (Phase::Completed, Some(result)) => Ok(Some(result)),
        // A started job never goes back to NoData unless the service lost it.
        (Phase::NoData, _) => Err(format!(
            "index {} is no longer known to the service",
            report.index
        )),
        (phase, _) => {
            tracing::info!("Index {} is {}", report.index, phase);
            Ok(None)
        }
    }
}
