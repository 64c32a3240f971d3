//! Greeting handler
//!
//! Answers every request with a fixed greeting and records one log line
//! describing it. Stateless; concurrent invocations share nothing.

use crate::{Request, Response};
use tracing::info;

/// Response body sent for every request
pub const GREETING: &str = "Hello, World! 🌍\n";

/// Handle one request: fixed greeting body, then one log record with the
/// method, path, and peer address.
pub async fn greet(req: Request) -> Response {
    let res = Response::text(GREETING);
    info!(
        "Request received: {} {} from {}",
        req.method, req.path, req.remote_addr
    );
    res
}
