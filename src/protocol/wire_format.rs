//! Wire format encoding and decoding.
//!
//! Every packet starts with an 8-byte header:
//! ```text
//! ┌──────────────┬──────────┐
//! │ Body length  │ Kind     │
//! │ 4 bytes      │ 4 bytes  │
//! │ uint32 BE    │ uint32 BE│
//! └──────────────┴──────────┘
//! ```
//!
//! Body fields are addressed by offset from the end of the header. The
//! binder phase and the server phase use different body layouts:
//! ```text
//! location request   name[64] | types[4 * (argc + 1)]
//! location reply     host[128] | port[16]
//! execute req/reply  result[4] | name[64] | types[4 * (argc + 1)] | args...
//! ```
//!
//! All multi-byte integers are Big Endian.

/// Header size in bytes (fixed, exactly 8).
pub const HEADER_SIZE: usize = 8;

/// Size of one descriptor / integer field on the wire.
pub const INT_SIZE: usize = 4;

/// Longest procedure name accepted, in bytes.
pub const MAX_NAME_LENGTH: usize = 64;
/// Width of the host field in a location reply.
pub const MAX_HOST_LENGTH: usize = 128;
/// Width of the port field in a location reply.
pub const MAX_PORT_LENGTH: usize = 16;

/// Location request: procedure name.
pub const CLIENT_LOC_MSG_NAME: usize = 0;
/// Location request: descriptor array.
pub const CLIENT_LOC_MSG_ARGS: usize = CLIENT_LOC_MSG_NAME + MAX_NAME_LENGTH;

/// Location reply: server host name.
pub const BINDER_LOC_MSG_HOST: usize = 0;
/// Location reply: server port.
pub const BINDER_LOC_MSG_PORT: usize = BINDER_LOC_MSG_HOST + MAX_HOST_LENGTH;
/// Location reply body length.
pub const BINDER_LOC_MSG_LEN: usize = BINDER_LOC_MSG_PORT + MAX_PORT_LENGTH;

/// Execute request/reply: result code slot (zero in requests).
pub const CLIENT_EXEC_MSG_RESULT: usize = 0;
/// Execute request/reply: procedure name.
pub const CLIENT_EXEC_MSG_NAME: usize = CLIENT_EXEC_MSG_RESULT + INT_SIZE;
/// Execute request/reply: descriptor array.
pub const CLIENT_EXEC_MSG_ARGS: usize = CLIENT_EXEC_MSG_NAME + MAX_NAME_LENGTH;

/// Execute failure reply: cause code.
pub const SERVER_EXEC_FAIL_CAUSE: usize = 0;

/// Message kind carried in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageKind {
    LocationRequest = 1,
    LocationSuccess = 2,
    LocationFailure = 3,
    Execute = 4,
    ExecuteSuccess = 5,
    ExecuteFailure = 6,
    Terminate = 7,
}

impl MessageKind {
    /// Decode a raw tag. Unknown tags return `None`.
    pub fn from_u32(raw: u32) -> Option<Self> {
        Some(match raw {
            1 => MessageKind::LocationRequest,
            2 => MessageKind::LocationSuccess,
            3 => MessageKind::LocationFailure,
            4 => MessageKind::Execute,
            5 => MessageKind::ExecuteSuccess,
            6 => MessageKind::ExecuteFailure,
            7 => MessageKind::Terminate,
            _ => return None,
        })
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Decoded header from wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Body length in bytes.
    pub body_length: u32,
    /// Raw kind tag; see [`Header::kind`].
    pub kind: u32,
}

impl Header {
    pub fn new(body_length: u32, kind: MessageKind) -> Self {
        Self {
            body_length,
            kind: kind.as_u32(),
        }
    }

    /// Encode header to bytes (Big Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use dynrpc_client::protocol::{Header, MessageKind};
    ///
    /// let bytes = Header::new(100, MessageKind::Execute).encode();
    /// assert_eq!(bytes, [0, 0, 0, 100, 0, 0, 0, 4]);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (8 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.body_length.to_be_bytes());
        buf[4..8].copy_from_slice(&self.kind.to_be_bytes());
    }

    /// Decode header from bytes (Big Endian).
    ///
    /// Returns `None` if buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            body_length: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            kind: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        })
    }

    /// Typed message kind, `None` for unknown tags.
    #[inline]
    pub fn kind(&self) -> Option<MessageKind> {
        MessageKind::from_u32(self.kind)
    }
}

/// Body length of a location request for `argc` arguments.
#[inline]
pub fn binder_packet_length(argc: usize) -> usize {
    CLIENT_LOC_MSG_ARGS + INT_SIZE * (argc + 1)
}

/// Offset of the first argument byte in an execute request/reply.
#[inline]
pub fn exec_args_offset(argc: usize) -> usize {
    CLIENT_EXEC_MSG_ARGS + INT_SIZE * (argc + 1)
}

/// Body length of an execute request carrying `arg_bytes` of arguments.
#[inline]
pub fn server_packet_length(argc: usize, arg_bytes: usize) -> usize {
    exec_args_offset(argc) + arg_bytes
}
