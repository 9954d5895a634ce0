//! Transport module - connections to the binder and to servers.
//!
//! The call protocol only needs the operations below; [`TcpTransport`]
//! provides them over TCP.

#[cfg(test)]
pub(crate) mod mock;
mod tcp;

use std::future::Future;
use std::io;

pub use tcp::{TcpConnection, TcpTransport};

/// A connected byte stream carrying framed packets.
pub trait Connection: Send + Sized {
    /// Write a whole frame (header + body).
    ///
    /// Returns the number of bytes written, which may be short if the peer
    /// went away part way through.
    fn send(&mut self, frame: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Read one frame into `buf`.
    ///
    /// Reads the header, then at most `min(body_length, buf.len() - HEADER_SIZE)`
    /// body bytes. Returns the number of bytes read, `0` if the peer closed
    /// before sending anything.
    fn receive(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;

    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Opens connections to the binder and to servers.
pub trait Transport: Send + Sync {
    type Conn: Connection;

    fn connect_binder(&self) -> impl Future<Output = io::Result<Self::Conn>> + Send;

    fn connect_server(
        &self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = io::Result<Self::Conn>> + Send;
}
