//! # dynrpc-client
//!
//! Client side of a binder-based, name-addressed RPC system.
//!
//! A call names a procedure and describes its arguments with typed
//! descriptors. The client asks the binder which server offers the
//! procedure, then sends the INPUT arguments to that server and copies the
//! OUTPUT arguments back into the caller's values.
//!
//! ## Architecture
//!
//! - **Codec**: argument descriptors, typed values, and the compact
//!   argument marshaller
//! - **Protocol**: 8-byte header framing and the fixed body layouts of each
//!   message kind
//! - **Transport**: TCP connections to the binder and servers
//!
//! ## Example
//!
//! ```ignore
//! use dynrpc_client::{rpc_call, ArgType, ScalarType, Value};
//!
//! #[tokio::main]
//! async fn main() {
//!     // BINDER_ADDRESS / BINDER_PORT name the binder
//!     let types = [
//!         ArgType::input(ScalarType::Int),
//!         ArgType::input(ScalarType::Int),
//!         ArgType::output(ScalarType::Int),
//!     ];
//!     let mut args = [Value::int(3), Value::int(4), Value::int(0)];
//!
//!     assert_eq!(rpc_call("Add", &types, &mut args).await, 0);
//!     assert_eq!(args[2].as_int(), Some(7));
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;

mod client;

pub use client::{rpc_call, rpc_terminate, Client, ClientBuilder};
pub use codec::{ArgType, Direction, ScalarType, Shape, Value};
pub use config::ClientConfig;
pub use error::RpcError;
