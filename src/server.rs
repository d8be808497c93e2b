//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared, read-only-after-startup state
//! holding the target, retry policy, body limit, resolver, HTTP client,
//! version and counters), [`build_router`] for constructing the Axum router with
//! middleware layers, [`build_http_client`] for the outbound hyper
//! client, and [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{Settings, TargetDescriptor};
use crate::health::{health_handler, version_handler};
use crate::proxy;
use crate::proxy::aggregate::Reply;
use crate::proxy::resolver::Resolve;
use crate::proxy::retry::RetryPolicy;

#[derive(Debug)]
pub struct Stats {
    pub forwarded: AtomicU64,
    pub failed: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn record(&self, reply: Reply) {
        if reply.status().is_success() {
            self.forwarded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

pub type HttpClient = Client<HttpConnector, http_body_util::Full<bytes::Bytes>>;

pub struct AppState {
    pub target: TargetDescriptor,
    pub retry: RetryPolicy,
    pub timeout: Duration,
    /// Largest inbound body captured for replay; larger ones fail with 500.
    pub max_body: usize,
    pub resolver: Arc<dyn Resolve>,
    pub http_client: HttpClient,
    pub version: String,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    #[must_use]
    pub fn new(settings: &Settings, resolver: Arc<dyn Resolve>) -> Self {
        Self {
            target: settings.target.clone(),
            retry: settings.retry,
            timeout: settings.timeout,
            max_body: settings.max_body,
            resolver,
            http_client: build_http_client(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            stats: Stats::new(),
        }
    }
}

/// Outbound client. Destinations are plain `http://` addresses that may
/// change between requests, so idle connections are not kept.
#[must_use]
pub fn build_http_client() -> HttpClient {
    let connector = HttpConnector::new();
    Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(0)
        .build(connector)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    // Only GET is reserved; other methods on these paths are forwarded
    Router::new()
        .route(
            "/version",
            get(version_handler).fallback(proxy::forward_handler),
        )
        .route(
            "/health",
            get(health_handler).fallback(proxy::forward_handler),
        )
        .fallback(proxy::forward_handler)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
