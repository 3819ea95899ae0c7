//! Transport module - the byte stream a session talks over.
//!
//! A [`Transport`] moves raw bytes and nothing else: one `send` is one write,
//! one `receive` is one read. Framing, short-write detection and reassembly
//! live above it.
//!
//! Every `AsyncRead + AsyncWrite + Unpin + Send` stream is a transport, which
//! covers `tokio::net::TcpStream` as well as `tokio::io::DuplexStream` in tests.

mod stream;

#[cfg(test)]
pub(crate) mod scripted;

pub use stream::connect;

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Single-write / single-read byte stream.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Write `frame` with one write call. Returns how many bytes were taken.
    async fn send(&mut self, frame: &[u8]) -> io::Result<usize>;

    /// Read once into `buf`. Zero means the peer closed the stream.
    async fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<S> Transport for S
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        let written = self.write(frame).await?;
        self.flush().await?;
        Ok(written)
    }

    async fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf).await
    }
}
