//! Shared helpers: scripted loopback backends, a fixed resolver, and a
//! proxy instance bound to an ephemeral port.

#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;

use dns_fanout::config::{Settings, TargetDescriptor};
use dns_fanout::error::FanoutError;
use dns_fanout::proxy::resolver::Resolve;
use dns_fanout::proxy::retry::RetryPolicy;
use dns_fanout::server::{self, AppState};

pub const PEER_A: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);
pub const PEER_B: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 2);
/// Nothing ever listens here: connections are refused.
pub const DEAD_PEER: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 3);

#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct Backend {
    pub addr: SocketAddr,
    pub seen: Arc<Mutex<Vec<Seen>>>,
    _shutdown: tokio::sync::oneshot::Sender<()>,
}

impl Backend {
    pub fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

/// Start a backend on `ip:port` (port 0 picks one). Replies follow
/// `script` in order; the last status repeats. `delay` is applied before
/// every reply.
pub async fn spawn_backend(
    ip: Ipv4Addr,
    port: u16,
    script: &[StatusCode],
    delay: Duration,
) -> Backend {
    let seen: Arc<Mutex<Vec<Seen>>> = Arc::new(Mutex::new(Vec::new()));
    let script: Arc<Vec<StatusCode>> = Arc::new(script.to_vec());

    let handler_seen = Arc::clone(&seen);
    let app = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
            let seen = Arc::clone(&handler_seen);
            let script = Arc::clone(&script);
            async move {
                let n = {
                    let mut seen = seen.lock().unwrap();
                    seen.push(Seen {
                        method,
                        uri: uri.to_string(),
                        headers,
                        body,
                    });
                    seen.len()
                };
                tokio::time::sleep(delay).await;
                let idx = (n - 1).min(script.len() - 1);
                script[idx]
            }
        },
    );

    let listener = tokio::net::TcpListener::bind(SocketAddr::from((ip, port)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    Backend {
        addr,
        seen,
        _shutdown: shutdown_tx,
    }
}

/// Two backends on different loopback addresses sharing one port.
pub async fn spawn_peer_pair(a: &[StatusCode], b: &[StatusCode]) -> (Backend, Backend) {
    let first = spawn_backend(PEER_A, 0, a, Duration::ZERO).await;
    let second = spawn_backend(PEER_B, first.addr.port(), b, Duration::ZERO).await;
    (first, second)
}

pub enum StaticResolver {
    Addresses(Vec<Ipv4Addr>),
    Failing,
}

#[async_trait]
impl Resolve for StaticResolver {
    async fn resolve(&self, hostname: &str) -> Result<Vec<Ipv4Addr>, FanoutError> {
        match self {
            Self::Addresses(addresses) => Ok(addresses.clone()),
            Self::Failing => Err(FanoutError::Resolution {
                host: hostname.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such host"),
            }),
        }
    }
}

/// Fast retries so exhaustion tests stay quick.
pub fn test_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(100))
}

pub fn test_settings(target: &str) -> Settings {
    Settings {
        target: TargetDescriptor::parse(target).unwrap(),
        listen: "127.0.0.1:0".parse().unwrap(),
        timeout: Duration::from_secs(2),
        retry: test_policy(),
        max_body: 1_048_576,
    }
}

pub async fn start_proxy(
    target: &str,
    resolver: StaticResolver,
) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let settings = test_settings(target);
    let state = Arc::new(AppState::new(&settings, Arc::new(resolver)));
    let router = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.listen).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await
        .unwrap();
    });

    (addr, shutdown_tx)
}
