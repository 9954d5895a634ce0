//! TCP transport.
//!
//! # Example
//!
//! ```ignore
//! use dynrpc_client::transport::{Connection, Transport, TcpTransport};
//!
//! let transport = TcpTransport::new("127.0.0.1", 7000);
//! let mut binder = transport.connect_binder().await?;
//! binder.send(&frame).await?;
//! ```

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::{Connection, Transport};
use crate::protocol::{Header, HEADER_SIZE};

/// Connects to the binder at a fixed address and to servers on demand.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    binder_address: String,
    binder_port: u16,
}

impl TcpTransport {
    pub fn new(binder_address: impl Into<String>, binder_port: u16) -> Self {
        Self {
            binder_address: binder_address.into(),
            binder_port,
        }
    }

    pub fn binder_address(&self) -> (&str, u16) {
        (&self.binder_address, self.binder_port)
    }
}

impl Transport for TcpTransport {
    type Conn = TcpConnection;

    async fn connect_binder(&self) -> io::Result<TcpConnection> {
        let stream = TcpStream::connect((self.binder_address.as_str(), self.binder_port)).await?;
        Ok(TcpConnection::new(stream))
    }

    async fn connect_server(&self, host: &str, port: u16) -> io::Result<TcpConnection> {
        let stream = TcpStream::connect((host, port)).await?;
        Ok(TcpConnection::new(stream))
    }
}

/// A connected TCP stream.
pub struct TcpConnection {
    stream: TcpStream,
}

impl TcpConnection {
    pub fn new(stream: TcpStream) -> Self {
        // requests are written in one go and answered; no point batching
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("set_nodelay failed: {}", e);
        }
        Self { stream }
    }
}

/// Fill `buf` until it is full or the peer stops sending.
///
/// An error after some bytes arrived ends the read early instead of
/// discarding those bytes, so callers can tell a truncated frame from a
/// dead peer.
async fn read_up_to<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if filled > 0 => {
                tracing::debug!("read ended after {} bytes: {}", filled, e);
                break;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl Connection for TcpConnection {
    async fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < frame.len() {
            match self.stream.write(&frame[written..]).await {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if written > 0 => {
                    tracing::debug!("write ended after {} bytes: {}", written, e);
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        self.stream.flush().await?;
        Ok(written)
    }

    async fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let header_len = HEADER_SIZE.min(buf.len());
        let mut filled = read_up_to(&mut self.stream, &mut buf[..header_len]).await?;

        let Some(header) = Header::decode(&buf[..filled]) else {
            return Ok(filled);
        };
        let body_len = (header.body_length as usize).min(buf.len() - HEADER_SIZE);
        filled += read_up_to(&mut self.stream, &mut buf[HEADER_SIZE..HEADER_SIZE + body_len]).await?;
        Ok(filled)
    }

    async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!("shutdown failed: {}", e);
        }
    }
}
