//! Error types for hail-core

use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for hail operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the hail HTTP server
#[derive(Debug, Error)]
pub enum Error {
    /// Listen address did not parse
    #[error("invalid listen address {addr}: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// Listener could not be bound (port in use, insufficient privilege).
    /// The only fatal error class in the system.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
