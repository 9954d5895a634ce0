//! Error types for dynrpc-client.
//!
//! Every variant maps to a stable integer through [`RpcError::code`]; the
//! integer is what crosses the [`rpc_call`](crate::rpc_call) boundary.

use thiserror::Error;

/// Procedure name longer than [`MAX_NAME_LENGTH`](crate::protocol::MAX_NAME_LENGTH).
pub const NAME_TOO_LONG: i32 = -1;
/// Request larger than the client will service.
pub const SIG_TOO_LONG: i32 = -2;
/// No connection to the binder could be made.
pub const BAD_BINDER_SOCK: i32 = -3;
/// Binder went away (nothing sent/received, or it is shutting down).
pub const BINDER_UNAVAILABLE: i32 = -4;
/// Location request was only partially sent.
pub const BAD_SEND_BIND: i32 = -5;
/// Location reply was truncated.
pub const BAD_RECV_BIND: i32 = -6;
/// Binder could not locate the procedure.
pub const BIND_FAILED: i32 = -7;
/// No connection to the server could be made.
pub const BAD_SERVER_SOCK: i32 = -8;
/// Server went away (nothing sent/received).
pub const SERVER_UNAVAILABLE: i32 = -9;
/// Execute request was only partially sent.
pub const BAD_SEND_SERVER: i32 = -10;
/// Execute reply was truncated.
pub const BAD_RECV_SERVER: i32 = -11;
/// A peer did not answer within the configured I/O timeout.
pub const TIMEOUT: i32 = -12;
/// Argument values do not match their descriptors.
pub const INVALID_ARGS: i32 = -13;
/// Server reported an execution failure without a cause.
pub const EXECUTE_FAILED: i32 = -14;

/// Main error type for all client operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Procedure name does not fit the name field.
    #[error("procedure name is {len} bytes, limit is {max}")]
    NameTooLong { len: usize, max: usize },

    /// Request body larger than the configured limit, or allocation failed.
    #[error("request of {size} bytes exceeds limit of {max}")]
    SigTooLong { size: usize, max: usize },

    /// A field write landed outside the packet body.
    #[error("field at offset {offset} (len {len}) overflows packet body of {capacity} bytes")]
    PacketOverflow {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// Binder connection could not be opened.
    #[error("cannot connect to binder: {0}")]
    BadBinderSock(#[source] std::io::Error),

    /// Binder accepted nothing, answered nothing, or is shutting down.
    #[error("binder unavailable")]
    BinderUnavailable,

    /// Location request only partially sent.
    #[error("location request partially sent ({sent} of {expected} bytes)")]
    BadSendBind { sent: usize, expected: usize },

    /// Location reply shorter than its fixed layout.
    #[error("location reply truncated ({received} of {expected} bytes)")]
    BadRecvBind { received: usize, expected: usize },

    /// Binder has no server for the procedure.
    #[error("binder could not locate procedure")]
    BindFailed,

    /// Server location unusable or connection refused.
    #[error("cannot connect to server {host}:{port}")]
    BadServerSock { host: String, port: String },

    /// Server accepted nothing or answered nothing.
    #[error("server unavailable")]
    ServerUnavailable,

    /// Execute request only partially sent.
    #[error("execute request partially sent ({sent} of {expected} bytes)")]
    BadSendServer { sent: usize, expected: usize },

    /// Execute reply shorter than the request it answers.
    #[error("execute reply truncated ({received} of {expected} bytes)")]
    BadRecvServer { received: usize, expected: usize },

    /// A send or receive outlived the configured I/O timeout.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// Values or descriptors that cannot be marshalled.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// Server reported a failure with a zero cause.
    #[error("server reported execution failure")]
    ExecuteFailed,

    /// Failure cause forwarded verbatim from the server.
    #[error("server execution failed with cause {0}")]
    ExecutionFailed(i32),

    /// Non-zero result code forwarded verbatim from the server.
    #[error("server returned result code {0}")]
    ServerResult(i32),

    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON configuration could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RpcError {
    /// Integer code reported to callers of the integer API.
    pub fn code(&self) -> i32 {
        match self {
            RpcError::NameTooLong { .. } => NAME_TOO_LONG,
            RpcError::SigTooLong { .. } | RpcError::PacketOverflow { .. } => SIG_TOO_LONG,
            RpcError::BadBinderSock(_) | RpcError::Config(_) | RpcError::Json(_) => {
                BAD_BINDER_SOCK
            }
            RpcError::BinderUnavailable => BINDER_UNAVAILABLE,
            RpcError::BadSendBind { .. } => BAD_SEND_BIND,
            RpcError::BadRecvBind { .. } => BAD_RECV_BIND,
            RpcError::BindFailed => BIND_FAILED,
            RpcError::BadServerSock { .. } => BAD_SERVER_SOCK,
            RpcError::ServerUnavailable => SERVER_UNAVAILABLE,
            RpcError::BadSendServer { .. } => BAD_SEND_SERVER,
            RpcError::BadRecvServer { .. } => BAD_RECV_SERVER,
            RpcError::Timeout(_) => TIMEOUT,
            RpcError::InvalidArgs(_) => INVALID_ARGS,
            RpcError::ExecuteFailed => EXECUTE_FAILED,
            RpcError::ExecutionFailed(cause) => *cause,
            RpcError::ServerResult(code) => *code,
        }
    }
}

/// Result type alias using RpcError.
pub type Result<T> = std::result::Result<T, RpcError>;
