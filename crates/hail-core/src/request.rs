//! HTTP request view

use http::Method;
use std::net::SocketAddr;

/// Per-request view handed to handlers.
///
/// Built by the server glue for a single dispatch and dropped once the
/// response is produced. Handlers read it; nothing survives across requests.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request path (without query string)
    pub path: String,
    /// Peer address of the connection the request arrived on
    pub remote_addr: SocketAddr,
}

impl Request {
    /// Create a new request view
    pub fn new(method: Method, path: impl Into<String>, remote_addr: SocketAddr) -> Self {
        Self {
            method,
            path: path.into(),
            remote_addr,
        }
    }
}
