//! Instance-scoped request router
//!
//! The router is an ordinary value constructed by the bootstrap and shared
//! into the serving loop behind an `Arc`. Nothing is registered process-wide,
//! so independent instances can coexist in one process (which the server
//! tests rely on).

use crate::{Request, Response};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed async handler invoked per request
pub type Handler = Arc<
    dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync,
>;

/// Wrap an async function or closure as a [`Handler`]
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// Request router with exact-path routes and a catch-all fallback
///
/// Immutable once serving starts; concurrent dispatches share it read-only.
#[derive(Default)]
pub struct Router {
    routes: HashMap<String, Handler>,
    fallback: Option<Handler>,
}

impl Router {
    /// Create a new router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an exact path, any method
    pub fn at(&mut self, path: impl Into<String>, handler: Handler) {
        self.routes.insert(path.into(), handler);
    }

    /// Register the catch-all handler invoked for every request with no
    /// exact-path match, regardless of method or path
    pub fn fallback(&mut self, handler: Handler) {
        self.fallback = Some(handler);
    }

    /// Dispatch a request: exact path first, then fallback, then 404
    pub async fn dispatch(&self, req: Request) -> Response {
        if let Some(handler) = self.routes.get(req.path.as_str()) {
            return handler(req).await;
        }
        if let Some(handler) = &self.fallback {
            return handler(req).await;
        }
        Response::not_found()
    }
}
