//! TCP connection to the remote service.

use tokio::net::TcpStream;

use crate::error::Result;

/// Dial the remote service.
///
/// Nagle is disabled: every exchange is a small request followed by a wait
/// for the reply.
pub async fn connect(address: &str) -> Result<TcpStream> {
    let stream = TcpStream::connect(address).await?;
    stream.set_nodelay(true)?;
    tracing::debug!("Connected to {}", address);
    Ok(stream)
}
