//! Concurrent fan-out of a single request to every resolved address.
//!
//! One task is spawned per address and each runs its own retry loop.
//! Every handle is awaited before returning, so the caller always sees a
//! complete set of outcomes: nothing is cancelled early and no task
//! outlives [`fan_out`].

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, Method, StatusCode};
use http_body_util::{BodyExt, Full};

use crate::error::ForwardError;
use crate::server::HttpClient;

use super::aggregate::is_success;
use super::body::CapturedBody;
use super::headers::build_forwarded_headers;
use super::retry::RetryPolicy;

/// Terminal result for one destination of one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub address: Ipv4Addr,
    pub url: String,
    pub status: Option<u16>,
    pub success: bool,
    pub error: Option<String>,
    pub attempts: u32,
    pub latency_ms: u64,
}

pub struct FanOutRequest<'a> {
    pub client: &'a HttpClient,
    pub addresses: &'a [Ipv4Addr],
    pub port: u16,
    pub method: &'a Method,
    pub path_and_query: &'a str,
    pub original_headers: &'a HeaderMap,
    pub body: &'a CapturedBody,
    pub policy: &'a RetryPolicy,
    pub timeout: Duration,
    pub correlation_id: &'a str,
}

#[must_use]
pub fn destination_url(address: Ipv4Addr, port: u16, path_and_query: &str) -> String {
    format!("http://{address}:{port}{path_and_query}")
}

pub async fn fan_out(req: FanOutRequest<'_>) -> Vec<ForwardOutcome> {
    let forwarded_headers = build_forwarded_headers(req.original_headers, req.body);

    let mut handles = Vec::with_capacity(req.addresses.len());

    for &address in req.addresses {
        let url = destination_url(address, req.port, req.path_and_query);

        tracing::debug!(
            correlation_id = %req.correlation_id,
            address = %address,
            url = %url,
            "forwarding request"
        );

        let client = req.client.clone();
        let method = req.method.clone();
        let headers = forwarded_headers.clone();
        let body = req.body.clone();
        let policy = *req.policy;
        let timeout = req.timeout;
        let task_url = url.clone();

        let task = async move {
            let start = Instant::now();
            let attempted = policy
                .execute(&method, &task_url, |_| {
                    send_once(&client, &method, &task_url, &headers, &body, timeout)
                })
                .await;
            let latency_ms = elapsed_ms(start);

            match attempted.result {
                Ok(status) => ForwardOutcome {
                    address,
                    url: task_url,
                    status: Some(status.as_u16()),
                    success: true,
                    error: None,
                    attempts: attempted.attempts,
                    latency_ms,
                },
                Err(error) => ForwardOutcome {
                    address,
                    url: task_url,
                    status: error.status().map(|s| s.as_u16()),
                    success: false,
                    error: Some(error.to_string()),
                    attempts: attempted.attempts,
                    latency_ms,
                },
            }
        };

        handles.push((address, url, tokio::spawn(task)));
    }

    // Join barrier: every destination reaches a terminal state before aggregation
    let mut outcomes = Vec::with_capacity(handles.len());
    for (address, url, handle) in handles {
        match handle.await {
            Ok(outcome) => {
                tracing::debug!(
                    correlation_id = %req.correlation_id,
                    address = %outcome.address,
                    status = outcome.status.unwrap_or(0),
                    attempts = outcome.attempts,
                    latency_ms = outcome.latency_ms,
                    success = outcome.success,
                    "destination finished"
                );
                outcomes.push(outcome);
            }
            Err(join_err) => {
                tracing::error!(
                    correlation_id = %req.correlation_id,
                    address = %address,
                    error = %join_err,
                    "forward task panicked"
                );
                outcomes.push(ForwardOutcome {
                    address,
                    url,
                    status: None,
                    success: false,
                    error: Some(format!("forward task failed: {join_err}")),
                    attempts: 0,
                    latency_ms: 0,
                });
            }
        }
    }

    outcomes
}

/// A single outbound attempt. Non-success statuses come back as
/// [`ForwardError::Status`] so the retry policy can classify them.
async fn send_once(
    client: &HttpClient,
    method: &Method,
    url: &str,
    headers: &HeaderMap,
    body: &CapturedBody,
    timeout: Duration,
) -> Result<StatusCode, ForwardError> {
    let mut req_builder = hyper::Request::builder().method(method.clone()).uri(url);
    for (key, value) in headers {
        req_builder = req_builder.header(key, value);
    }

    let request = req_builder
        .body(Full::new(body.to_bytes()))
        .map_err(|e| ForwardError::Request(e.to_string()))?;

    let exchange = async {
        let response = client
            .request(request)
            .await
            .map_err(|e| ForwardError::Network(error_chain(&e)))?;
        let status = response.status();
        response
            .into_body()
            .collect()
            .await
            .map_err(|e| ForwardError::Interrupted(error_chain(&e)))?;
        Ok::<_, ForwardError>(status)
    };

    let status = tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| ForwardError::Timeout(duration_ms(timeout)))??;

    if is_success(status) {
        Ok(status)
    } else {
        Err(ForwardError::Status(status))
    }
}

/// Flatten an error and its sources; hyper's top-level messages alone
/// ("client error (Connect)") hide the actual cause.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn elapsed_ms(start: Instant) -> u64 {
    duration_ms(start.elapsed())
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
