//! hail-server: process entry point
//!
//! Builds the router, announces startup, binds the listener, and serves until
//! the process is killed. A bind failure is logged and exits non-zero; there
//! is no other fatal path.

#![forbid(unsafe_code)]

use hail_core::{handler_fn, handlers, Router, Server, ServerConfig};
use std::process;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut router = Router::new();
    router.fallback(handler_fn(handlers::greet));
    let router = Arc::new(router);

    let config = ServerConfig::default();
    info!("Starting server on port {}...", config.port);

    let server = match Server::bind(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = server.serve(router).await {
        error!("{}", e);
        process::exit(1);
    }
}
