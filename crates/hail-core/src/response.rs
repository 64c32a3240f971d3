//! HTTP response types

use bytes::Bytes;
use http::StatusCode;
use smallvec::SmallVec;

/// HTTP response
///
/// Owned by the handler while it runs; the serving loop takes it over and
/// flushes it to the network.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code
    pub status: StatusCode,
    /// Response headers (stack-allocated for small header counts)
    pub headers: SmallVec<[(String, String); 8]>,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create an empty response with the given status
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: SmallVec::new(),
            body: Bytes::new(),
        }
    }

    /// Create a 200 OK plain-text response
    pub fn text(body: impl Into<Bytes>) -> Self {
        let mut res = Self::new(StatusCode::OK);
        res.headers.push((
            "content-type".to_string(),
            "text/plain; charset=utf-8".to_string(),
        ));
        res.body = body.into();
        res
    }

    /// Create a 404 Not Found response
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// Append a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
