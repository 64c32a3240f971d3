//! hail-core: greeting HTTP server library
//!
//! Everything needed to run the hail server: a per-request view, a response
//! type, an instance-scoped router, the greeting handler, and the hyper-based
//! serving loop. The binary in `hail-server` wires these together.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
pub mod handlers;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

// Re-exports
pub use error::{Error, Result};
pub use request::Request;
pub use response::Response;
pub use router::{handler_fn, Handler, Router};
pub use server::{Server, ServerConfig};
