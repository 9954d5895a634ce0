//! Client builder and call protocol.
//!
//! A call runs two strictly sequential phases over one reusable packet:
//! 1. Ask the binder where the procedure lives (location request)
//! 2. Send the INPUT arguments to that server (execute request)
//! 3. Unpack OUTPUT arguments from the server's reply
//!
//! Each connection is closed by the phase that opened it, on success and
//! on failure alike. The packet is dropped on every exit path.
//!
//! # Example
//!
//! ```ignore
//! use dynrpc_client::{ArgType, Client, ScalarType, Value};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder().binder("127.0.0.1", 7000).build();
//!
//!     let types = [
//!         ArgType::input(ScalarType::Int),
//!         ArgType::input(ScalarType::Int),
//!         ArgType::output(ScalarType::Int),
//!     ];
//!     let mut args = [Value::int(3), Value::int(4), Value::int(0)];
//!     client.call("Add", &types, &mut args).await?;
//!     assert_eq!(args[2].as_int(), Some(7));
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::io;
use std::time::Duration;

use crate::codec::{ArgType, Value};
use crate::config::ClientConfig;
use crate::error::{Result, RpcError};
use crate::protocol::{
    ExecuteReply, ExecuteRequest, LocationReply, LocationRequest, MessageKind, Packet,
    HEADER_SIZE, MAX_NAME_LENGTH,
};
use crate::transport::{Connection, TcpTransport, Transport};

/// Builder for configuring and creating a [`Client`].
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a new client builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Set the binder location.
    pub fn binder(mut self, address: impl Into<String>, port: u16) -> Self {
        self.config.binder_address = address.into();
        self.config.binder_port = port;
        self
    }

    /// Set the largest request body the client will build.
    ///
    /// Default: 16 MB
    pub fn max_packet_size(mut self, size: usize) -> Self {
        self.config.max_packet_size = size;
        self
    }

    /// Bound every connect, send and receive by `timeout`.
    ///
    /// Default: wait forever
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.config.io_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Build a client that talks TCP.
    pub fn build(self) -> Client {
        let transport =
            TcpTransport::new(self.config.binder_address.clone(), self.config.binder_port);
        Client::with_transport(transport, self.config)
    }

    /// Build a client over a custom transport.
    pub fn build_with_transport<T: Transport>(self, transport: T) -> Client<T> {
        Client::with_transport(transport, self.config)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the binder says the procedure lives.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ServerLocation {
    host: String,
    port: u16,
}

impl ServerLocation {
    fn parse(reply: LocationReply) -> Result<Self> {
        match reply.port.trim().parse() {
            Ok(port) if !reply.host.is_empty() => Ok(Self {
                host: reply.host,
                port,
            }),
            _ => Err(RpcError::BadServerSock {
                host: reply.host,
                port: reply.port,
            }),
        }
    }
}

/// A client able to call procedures through the binder.
///
/// Holds no per-call state; concurrent calls share nothing mutable.
pub struct Client<T = TcpTransport> {
    transport: T,
    config: ClientConfig,
}

impl Client<TcpTransport> {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client for the binder named by `BINDER_ADDRESS` / `BINDER_PORT`.
    pub fn from_env() -> Result<Self> {
        Ok(ClientBuilder::from_config(ClientConfig::from_env()?).build())
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Call `name` with `values` described by `types`.
    ///
    /// On success every OUTPUT slot of `values` holds the server's result.
    /// On failure `values` is left exactly as it was.
    pub async fn call(&self, name: &str, types: &[ArgType], values: &mut [Value]) -> Result<()> {
        let result = self.run_call(name, types, values).await;
        if let Err(e) = &result {
            tracing::warn!(procedure = name, code = e.code(), "rpc call failed: {}", e);
        }
        result
    }

    /// Tell the binder to shut down. Does not wait for an answer.
    pub async fn terminate(&self) -> Result<()> {
        let mut binder = self
            .connect(self.transport.connect_binder())
            .await
            .map_err(RpcError::BadBinderSock)?;

        let mut packet = Packet::with_body_capacity(0)?;
        match self.send_packet(&mut binder, &mut packet, 0, MessageKind::Terminate).await {
            Ok(Ok(written)) if written == HEADER_SIZE => {
                tracing::debug!("terminate sent to binder");
            }
            Ok(Ok(written)) => {
                tracing::warn!("terminate only partially sent ({} bytes)", written);
            }
            Ok(Err(e)) => tracing::warn!("terminate not sent: {}", e),
            Err(e) => tracing::warn!("terminate not sent: {}", e),
        }
        binder.close().await;
        Ok(())
    }

    async fn run_call(&self, name: &str, types: &[ArgType], values: &mut [Value]) -> Result<()> {
        if name.len() > MAX_NAME_LENGTH {
            return Err(RpcError::NameTooLong {
                len: name.len(),
                max: MAX_NAME_LENGTH,
            });
        }
        check_values(types, values)?;

        let location = LocationRequest::new(name, types);
        let execute = ExecuteRequest::new(name, types, values);
        let binder_len = location.body_length();
        let server_len = execute.body_length();
        let capacity = binder_len.max(server_len);
        let limit = body_limit(&self.config);
        if capacity > limit {
            return Err(RpcError::SigTooLong {
                size: capacity,
                max: limit,
            });
        }
        let mut packet = Packet::with_body_capacity(capacity)?;
        tracing::trace!(
            procedure = name,
            argc = types.len(),
            binder_len,
            server_len,
            "packet allocated"
        );

        let server = self.locate(&location, &mut packet).await?;
        tracing::debug!(procedure = name, host = %server.host, port = server.port, "procedure located");

        let mut conn = self
            .connect(self.transport.connect_server(&server.host, server.port))
            .await
            .map_err(|e| {
                tracing::debug!("server connect failed: {}", e);
                RpcError::BadServerSock {
                    host: server.host.clone(),
                    port: server.port.to_string(),
                }
            })?;
        let outcome = self.exchange_execute(&mut conn, &execute, &mut packet).await;
        conn.close().await;
        outcome?;

        ExecuteReply::unpack_outputs(&packet, types, values)?;
        tracing::debug!(procedure = name, "call complete");
        Ok(())
    }

    /// Binder phase. The binder connection is closed before returning.
    async fn locate(
        &self,
        request: &LocationRequest<'_>,
        packet: &mut Packet,
    ) -> Result<ServerLocation> {
        let mut binder = self
            .connect(self.transport.connect_binder())
            .await
            .map_err(RpcError::BadBinderSock)?;
        let reply = self.exchange_location(&mut binder, request, packet).await;
        binder.close().await;
        ServerLocation::parse(reply?)
    }

    async fn exchange_location(
        &self,
        binder: &mut T::Conn,
        request: &LocationRequest<'_>,
        packet: &mut Packet,
    ) -> Result<LocationReply> {
        let len = request.encode(packet)?;
        let written = match self
            .send_packet(binder, packet, len, MessageKind::LocationRequest)
            .await?
        {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!("location request send failed: {}", e);
                0
            }
        };
        if written == 0 {
            return Err(RpcError::BinderUnavailable);
        }
        if written < HEADER_SIZE + len {
            return Err(RpcError::BadSendBind {
                sent: written.saturating_sub(HEADER_SIZE),
                expected: len,
            });
        }

        let mut reply = Packet::with_body_capacity(LocationReply::BODY_LENGTH)?;
        let received = self.receive_packet(binder, &mut reply).await?;
        classify_location_reply(&reply, received)?;
        Ok(LocationReply::decode(&reply))
    }

    /// Server phase. Leaves the reply in `packet` on success.
    async fn exchange_execute(
        &self,
        server: &mut T::Conn,
        request: &ExecuteRequest<'_>,
        packet: &mut Packet,
    ) -> Result<()> {
        let len = request.encode(packet)?;
        let written = match self.send_packet(server, packet, len, MessageKind::Execute).await? {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!("execute request send failed: {}", e);
                0
            }
        };
        if written == 0 {
            return Err(RpcError::ServerUnavailable);
        }
        if written < HEADER_SIZE + len {
            return Err(RpcError::BadSendServer {
                sent: written.saturating_sub(HEADER_SIZE),
                expected: len,
            });
        }

        packet.clear();
        let received = self.receive_packet(server, packet).await?;
        classify_execute_reply(packet, received, len)
    }

    /// Stamp `packet` and send header + `len` body bytes.
    ///
    /// The outer `Result` only carries timeouts; transport errors are
    /// returned to the phase so it can pick the right code.
    async fn send_packet(
        &self,
        conn: &mut T::Conn,
        packet: &mut Packet,
        len: usize,
        kind: MessageKind,
    ) -> Result<io::Result<usize>> {
        packet.stamp(len, kind);
        let sent = self.timed("send", conn.send(packet.frame(len))).await?;
        if let Ok(n) = &sent {
            tracing::trace!(?kind, bytes = *n, "sent");
        }
        Ok(sent)
    }

    /// Receive one frame into `packet`; a transport error counts as nothing read.
    async fn receive_packet(&self, conn: &mut T::Conn, packet: &mut Packet) -> Result<usize> {
        let received = match self.timed("reply", conn.receive(packet.as_mut_bytes())).await? {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!("receive failed: {}", e);
                0
            }
        };
        tracing::trace!(bytes = received, kind = ?packet.read_kind(), "received");
        Ok(received)
    }

    async fn timed<F: Future>(&self, what: &'static str, fut: F) -> Result<F::Output> {
        match self.config.io_timeout() {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| RpcError::Timeout(what)),
            None => Ok(fut.await),
        }
    }

    /// Connect timeouts surface as connect errors, not `Timeout`.
    async fn connect<F>(&self, fut: F) -> io::Result<T::Conn>
    where
        F: Future<Output = io::Result<T::Conn>>,
    {
        match self.config.io_timeout() {
            Some(limit) => tokio::time::timeout(limit, fut).await.unwrap_or_else(|_| {
                Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))
            }),
            None => fut.await,
        }
    }
}

/// Largest body a call may build; the header length field is a `u32`.
fn body_limit(config: &ClientConfig) -> usize {
    config.max_packet_size.min(u32::MAX as usize)
}

fn check_values(types: &[ArgType], values: &[Value]) -> Result<()> {
    if types.len() != values.len() {
        return Err(RpcError::InvalidArgs(format!(
            "{} descriptors but {} values",
            types.len(),
            values.len()
        )));
    }
    for (ty, value) in types.iter().zip(values) {
        ty.validate()?;
        if ty.is_input() {
            value.check(ty)?;
        }
    }
    Ok(())
}

/// Checked in order: nothing read, failure tag, truncated.
fn classify_location_reply(reply: &Packet, received: usize) -> Result<()> {
    if received == 0 {
        return Err(RpcError::BinderUnavailable);
    }
    if received >= HEADER_SIZE {
        match reply.read_kind() {
            Some(MessageKind::LocationFailure) => return Err(RpcError::BindFailed),
            Some(MessageKind::Terminate) => return Err(RpcError::BinderUnavailable),
            _ => {}
        }
    }
    if received < HEADER_SIZE + LocationReply::BODY_LENGTH {
        return Err(RpcError::BadRecvBind {
            received: received.saturating_sub(HEADER_SIZE),
            expected: LocationReply::BODY_LENGTH,
        });
    }
    Ok(())
}

/// Checked in order: nothing read, failure tag with cause, truncated, result.
fn classify_execute_reply(reply: &Packet, received: usize, expected: usize) -> Result<()> {
    if received == 0 {
        return Err(RpcError::ServerUnavailable);
    }
    if received >= HEADER_SIZE + ExecuteReply::MIN_BODY_LENGTH
        && reply.read_kind() == Some(MessageKind::ExecuteFailure)
    {
        return Err(match ExecuteReply::failure_cause(reply) {
            Some(0) | None => RpcError::ExecuteFailed,
            Some(cause) => RpcError::ExecutionFailed(cause),
        });
    }
    if received < HEADER_SIZE + expected {
        return Err(RpcError::BadRecvServer {
            received: received.saturating_sub(HEADER_SIZE),
            expected,
        });
    }
    match ExecuteReply::result(reply) {
        Some(0) => Ok(()),
        Some(code) => Err(RpcError::ServerResult(code)),
        None => Err(RpcError::BadRecvServer {
            received: received.saturating_sub(HEADER_SIZE),
            expected,
        }),
    }
}

/// Call through the binder named in the environment.
///
/// Returns `0` on success, otherwise the error code (see [`crate::error`]).
pub async fn rpc_call(name: &str, types: &[ArgType], values: &mut [Value]) -> i32 {
    let client = match Client::from_env() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("rpc call failed: {}", e);
            return e.code();
        }
    };
    match client.call(name, types, values).await {
        Ok(()) => 0,
        Err(e) => e.code(),
    }
}

/// Ask the binder named in the environment to shut down.
///
/// Returns `0`, or `BAD_BINDER_SOCK` if the binder cannot be reached.
pub async fn rpc_terminate() -> i32 {
    let result = match Client::from_env() {
        Ok(client) => client.terminate().await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::warn!("rpc terminate failed: {}", e);
            e.code()
        }
    }
}
