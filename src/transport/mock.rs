//! Scripted transport for testing the call protocol.
//!
//! Each peer gets a [`Script`]: the frames it answers with and how much of
//! each request it accepts. Everything the client does is recorded in a
//! shared [`Log`].

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use super::{Connection, Transport};
use crate::protocol::{Header, MessageKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Endpoint {
    Binder,
    Server(String, u16),
}

/// How a peer accepts sent frames.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SendMode {
    Full,
    /// Accept nothing (peer gone).
    Nothing,
    /// Accept only this many bytes of each frame.
    Partial(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct Script {
    replies: VecDeque<Vec<u8>>,
    send: SendMode,
    hang: bool,
}

impl Script {
    pub(crate) fn new() -> Self {
        Self {
            replies: VecDeque::new(),
            send: SendMode::Full,
            hang: false,
        }
    }

    /// Queue raw bytes as the next reply.
    pub(crate) fn reply_raw(mut self, bytes: Vec<u8>) -> Self {
        self.replies.push_back(bytes);
        self
    }

    /// Queue a well-formed frame as the next reply.
    pub(crate) fn reply(self, kind: MessageKind, body: &[u8]) -> Self {
        self.reply_raw(frame(kind, body))
    }

    pub(crate) fn send_mode(mut self, send: SendMode) -> Self {
        self.send = send;
        self
    }

    /// Never answer: every receive waits forever.
    pub(crate) fn hang(mut self) -> Self {
        self.hang = true;
        self
    }
}

pub(crate) fn frame(kind: MessageKind, body: &[u8]) -> Vec<u8> {
    let mut bytes = Header::new(body.len() as u32, kind).encode().to_vec();
    bytes.extend_from_slice(body);
    bytes
}

#[derive(Debug, Default)]
pub(crate) struct Log {
    pub(crate) connects: Vec<Endpoint>,
    pub(crate) sent: Vec<(Endpoint, Vec<u8>)>,
    pub(crate) closed: Vec<Endpoint>,
}

#[derive(Default)]
struct MockState {
    binder: Option<Script>,
    server: Option<Script>,
    log: Log,
}

/// Transport whose peers follow fixed scripts. `None` refuses to connect.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub(crate) fn new(binder: Option<Script>, server: Option<Script>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                binder,
                server,
                log: Log::default(),
            })),
        }
    }

    pub(crate) fn with_log<R>(&self, f: impl FnOnce(&Log) -> R) -> R {
        f(&self.state.lock().unwrap().log)
    }

    fn open(&self, endpoint: Endpoint) -> io::Result<MockConnection> {
        let mut state = self.state.lock().unwrap();
        let script = match endpoint {
            Endpoint::Binder => state.binder.take(),
            Endpoint::Server(..) => state.server.take(),
        };
        let script =
            script.ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))?;
        state.log.connects.push(endpoint.clone());
        Ok(MockConnection {
            endpoint,
            script,
            state: self.state.clone(),
        })
    }
}

impl Transport for MockTransport {
    type Conn = MockConnection;

    async fn connect_binder(&self) -> io::Result<MockConnection> {
        self.open(Endpoint::Binder)
    }

    async fn connect_server(&self, host: &str, port: u16) -> io::Result<MockConnection> {
        self.open(Endpoint::Server(host.to_string(), port))
    }
}

pub(crate) struct MockConnection {
    endpoint: Endpoint,
    script: Script,
    state: Arc<Mutex<MockState>>,
}

impl Connection for MockConnection {
    async fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        let accepted = match self.script.send {
            SendMode::Full => frame.len(),
            SendMode::Nothing => 0,
            SendMode::Partial(n) => n.min(frame.len()),
        };
        let mut state = self.state.lock().unwrap();
        state
            .log
            .sent
            .push((self.endpoint.clone(), frame[..accepted].to_vec()));
        Ok(accepted)
    }

    async fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.script.hang {
            std::future::pending::<()>().await;
        }
        let Some(reply) = self.script.replies.pop_front() else {
            return Ok(0);
        };
        let n = reply.len().min(buf.len());
        buf[..n].copy_from_slice(&reply[..n]);
        Ok(n)
    }

    async fn close(self) {
        let mut state = self.state.lock().unwrap();
        state.log.closed.push(self.endpoint);
    }
}
