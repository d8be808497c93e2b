//! Core forwarding engine.
//!
//! The [`forward_handler`] function is the Axum fallback that receives
//! every request not claimed by `/version` or `/health`. Per request it
//! resolves the target ([`resolver`]), captures the body once ([`body`]),
//! fans out to every address with per-destination retries ([`fanout`],
//! [`retry`], [`headers`]) and folds the results into a single reply
//! ([`aggregate`]).

pub mod aggregate;
pub mod body;
pub mod fanout;
pub mod headers;
pub mod resolver;
pub mod retry;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, HeaderValue, Method, Uri};
use axum::response::{IntoResponse, Response};

use crate::server::AppState;
use aggregate::Reply;

pub async fn forward_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    req_headers: HeaderMap,
    body: Body,
) -> Response {
    let correlation_id = req_headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());

    tracing::info!(
        correlation_id = %correlation_id,
        client = %addr,
        method = %method,
        path = %path_and_query,
        "request received"
    );

    let reply = forward(&state, &method, path_and_query, &req_headers, body, &correlation_id).await;
    state.stats.record(reply);

    let mut response = reply.into_response();
    if let Ok(val) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert("x-correlation-id", val);
    }
    response
}

async fn forward(
    state: &AppState,
    method: &Method,
    path_and_query: &str,
    req_headers: &HeaderMap,
    body: Body,
    correlation_id: &str,
) -> Reply {
    let hostname = &state.target.hostname;

    let addresses = match state.resolver.resolve(hostname).await {
        Ok(addresses) => addresses,
        Err(e) => {
            tracing::error!(
                correlation_id = %correlation_id,
                host = %hostname,
                error = %e,
                "resolution failed"
            );
            return Reply::ResolutionFailed;
        }
    };

    if addresses.is_empty() {
        tracing::error!(
            correlation_id = %correlation_id,
            host = %hostname,
            "no addresses resolved"
        );
        return Reply::NoTargets;
    }

    let captured = match body::capture(method, body, state.max_body).await {
        Ok(captured) => captured,
        Err(e) => {
            tracing::error!(
                correlation_id = %correlation_id,
                error = %e,
                "failed to read request body"
            );
            return Reply::BodyReadFailed;
        }
    };

    tracing::info!(
        correlation_id = %correlation_id,
        host = %hostname,
        destinations = addresses.len(),
        body_bytes = captured.len(),
        "fanning out"
    );

    let outcomes = fanout::fan_out(fanout::FanOutRequest {
        client: &state.http_client,
        addresses: &addresses,
        port: state.target.port,
        method,
        path_and_query,
        original_headers: req_headers,
        body: &captured,
        policy: &state.retry,
        timeout: state.timeout,
        correlation_id,
    })
    .await;

    aggregate::aggregate(&outcomes, correlation_id)
}
