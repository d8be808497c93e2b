//! Unified error types for dns-fanout.
//!
//! [`FanoutError`] is the crate-wide error enum: startup configuration
//! failures, the two request-aborting failures (name resolution and body
//! capture), and the client-side errors of the `health` subcommand.
//! Per-destination forwarding failures are classified separately by
//! [`ForwardError`] so the retry policy can decide what to repeat.

use hyper::StatusCode;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FanoutError {
    #[error("No target configured.\n\n  {hint}")]
    MissingTarget { hint: String },

    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Failed to resolve '{host}': {source}")]
    Resolution {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read request body: {source}")]
    BodyRead {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(StatusCode),

    #[error("Target '{host}' resolved to no IPv4 addresses")]
    NoAddresses { host: String },
}

/// Why a single outbound attempt did not produce a successful response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForwardError {
    /// Connection refused, reset, or any other failure before a response.
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The status line arrived but the response body stream broke.
    #[error("response interrupted: {0}")]
    Interrupted(String),

    #[error("upstream responded with {0}")]
    Status(StatusCode),

    /// The outbound request could not be built at all.
    #[error("invalid request: {0}")]
    Request(String),
}

impl ForwardError {
    /// Status code carried by the failure, if the destination answered.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status) => Some(*status),
            _ => None,
        }
    }
}
