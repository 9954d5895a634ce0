//! Client configuration.
//!
//! The binder location normally comes from the environment
//! (`BINDER_ADDRESS`, `BINDER_PORT`); it can also be loaded from JSON or
//! set through [`ClientBuilder`](crate::ClientBuilder).
//!
//! # Example
//!
//! ```
//! use dynrpc_client::ClientConfig;
//!
//! let config = ClientConfig::from_json(r#"{"binder_address": "10.0.0.2", "binder_port": 9000}"#).unwrap();
//! assert_eq!(config.binder_port, 9000);
//! assert_eq!(config.io_timeout(), None);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RpcError};

/// Environment variable holding the binder host.
pub const BINDER_ADDRESS_ENV: &str = "BINDER_ADDRESS";
/// Environment variable holding the binder port.
pub const BINDER_PORT_ENV: &str = "BINDER_PORT";

/// Default binder port.
pub const DEFAULT_BINDER_PORT: u16 = 7000;

/// Default largest packet body the client will build (16 MB).
pub const DEFAULT_MAX_PACKET_SIZE: usize = 16 * 1024 * 1024;

/// Settings for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Binder host name or IP address.
    pub binder_address: String,
    pub binder_port: u16,
    /// Largest request body, in bytes; larger calls fail with `SIG_TOO_LONG`.
    pub max_packet_size: usize,
    /// Per-operation I/O timeout in milliseconds. `None` waits forever.
    pub io_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            binder_address: "127.0.0.1".to_string(),
            binder_port: DEFAULT_BINDER_PORT,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            io_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Read the binder location from `BINDER_ADDRESS` and `BINDER_PORT`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if either variable is missing or the port is not a
    /// valid `u16`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let binder_address = lookup(BINDER_ADDRESS_ENV)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RpcError::Config(format!("{} is not set", BINDER_ADDRESS_ENV)))?;
        let port = lookup(BINDER_PORT_ENV)
            .ok_or_else(|| RpcError::Config(format!("{} is not set", BINDER_PORT_ENV)))?;
        let binder_port = port.trim().parse().map_err(|_| {
            RpcError::Config(format!("{} is not a valid port: {:?}", BINDER_PORT_ENV, port))
        })?;

        Ok(Self {
            binder_address,
            binder_port,
            ..Self::default()
        })
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout_ms.map(Duration::from_millis)
    }
}
