//! HTTP serving loop
//!
//! Hyper over a multi-threaded tokio runtime. Each accepted connection runs
//! on its own spawned task; hyper owns HTTP framing and keep-alive on it.
//! Handlers share no mutable state, so no locking is involved anywhere on the
//! request path.

use crate::{Error, Request, Response, Result, Router};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, warn};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub hostname: String,
    /// Port to listen on; `0` asks the OS for an ephemeral port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.hostname, self.port);
        addr.parse()
            .map_err(|source| Error::InvalidAddress { addr, source })
    }
}

/// Create the listening socket
fn create_listener(addr: SocketAddr) -> std::io::Result<std::net::TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEADDR - allow rebinding an address in TIME_WAIT
    socket.set_reuse_address(true)?;

    // TCP_NODELAY - disable Nagle's algorithm for lower latency
    socket.set_nodelay(true)?;

    socket.bind(&addr.into())?;
    socket.listen(1024)?;

    Ok(socket.into())
}

/// A bound HTTP server, ready to serve
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Bind the listening socket.
    ///
    /// A bind failure (port in use, insufficient privilege) is the system's
    /// only fatal error class; callers are expected to log it and exit.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let addr = config.socket_addr()?;
        let std_listener = create_listener(addr).map_err(|source| Error::Bind { addr, source })?;
        std_listener
            .set_nonblocking(true)
            .map_err(|source| Error::Bind { addr, source })?;
        let listener =
            TcpListener::from_std(std_listener).map_err(|source| Error::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// The address the listener is actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until the process is killed.
    ///
    /// Every accepted connection is dispatched as an independent unit of
    /// concurrent work. There is no graceful shutdown: the loop ends only
    /// with the process.
    pub async fn serve(self, router: Arc<Router>) -> Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("accept failed: {}", e);
                    continue;
                }
            };

            let router = router.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let router = router.clone();
                    async move { handle_request(router, req, peer).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    // Client disconnects and malformed requests land here.
                    // Logged rather than silently dropped, for observability.
                    debug!("connection from {} ended with error: {}", peer, e);
                }
            });
        }
    }
}

/// Build the per-request view, dispatch through the router, convert back
async fn handle_request(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    peer: SocketAddr,
) -> std::result::Result<hyper::Response<Full<Bytes>>, Infallible> {
    let request = Request::new(req.method().clone(), req.uri().path(), peer);
    let response = router.dispatch(request).await;
    Ok(to_hyper_response(response))
}

/// Convert our Response to a hyper response
fn to_hyper_response(res: Response) -> hyper::Response<Full<Bytes>> {
    let mut builder = hyper::Response::builder().status(res.status);

    for (name, value) in &res.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder
        .body(Full::new(res.body))
        .unwrap_or_else(|_| hyper::Response::new(Full::new(Bytes::new())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{greet, GREETING};
    use crate::{handler_fn, Router};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn greeting_router() -> Arc<Router> {
        let mut router = Router::new();
        router.fallback(handler_fn(greet));
        Arc::new(router)
    }

    fn loopback(port: u16) -> ServerConfig {
        ServerConfig {
            hostname: "127.0.0.1".to_string(),
            port,
        }
    }

    async fn start_server() -> SocketAddr {
        let server = Server::bind(&loopback(0)).await.unwrap();
        let addr = server.local_addr();
        tokio::spawn(server.serve(greeting_router()));
        addr
    }

    async fn raw_request(addr: SocketAddr, method: &str, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let req = format!(
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
        );
        stream.write_all(req.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn any_method_any_path_gets_the_greeting() {
        let addr = start_server().await;

        for (method, path) in [
            ("GET", "/"),
            ("POST", "/submit"),
            ("PUT", "/a"),
            ("DELETE", "/foo/bar"),
        ] {
            let res = raw_request(addr, method, path).await;
            assert!(
                res.starts_with("HTTP/1.1 200"),
                "{method} {path} -> {res}"
            );
            assert!(res.contains("content-type: text/plain; charset=utf-8"));
            assert!(res.ends_with(GREETING), "{method} {path} -> {res}");
        }
    }

    #[tokio::test]
    async fn concurrent_requests_all_get_identical_bodies() {
        let addr = start_server().await;

        let mut tasks = Vec::new();
        for _ in 0..50 {
            tasks.push(tokio::spawn(
                async move { raw_request(addr, "GET", "/").await },
            ));
        }

        for task in tasks {
            let res = task.await.unwrap();
            assert!(res.starts_with("HTTP/1.1 200"));
            assert!(res.ends_with(GREETING));
        }
    }

    #[tokio::test]
    async fn two_servers_run_independently_in_one_process() {
        let a = start_server().await;
        let b = start_server().await;
        assert_ne!(a, b);

        assert!(raw_request(a, "GET", "/").await.ends_with(GREETING));
        assert!(raw_request(b, "GET", "/").await.ends_with(GREETING));
    }

    #[tokio::test]
    async fn bind_conflict_is_a_bind_error() {
        let first = Server::bind(&loopback(0)).await.unwrap();
        let port = first.local_addr().port();

        let err = Server::bind(&loopback(port)).await.unwrap_err();
        assert!(matches!(err, Error::Bind { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn unparseable_hostname_is_an_address_error() {
        let config = ServerConfig {
            hostname: "not a host".to_string(),
            port: 8080,
        };
        let err = Server::bind(&config).await.unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn keep_alive_serves_sequential_requests_on_one_connection() {
        let addr = start_server().await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        for _ in 0..2 {
            stream
                .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .await
                .unwrap();

            // Accumulate until the full response for this request has arrived.
            let mut acc = Vec::new();
            let mut buf = [0u8; 4096];
            while !acc.ends_with(GREETING.as_bytes()) {
                let n = stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed early");
                acc.extend_from_slice(&buf[..n]);
            }
            let res = String::from_utf8(acc).unwrap();
            assert!(res.starts_with("HTTP/1.1 200"), "{res}");
        }
    }
}
