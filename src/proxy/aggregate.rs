//! Folding per-destination outcomes into the one reply the client sees.
//!
//! The client only ever gets a coarse verdict; which peers failed and why
//! is logged here and nowhere else.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use super::fanout::ForwardOutcome;

/// Client-facing result of one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    ResolutionFailed,
    NoTargets,
    BodyReadFailed,
    /// At least one destination accepted the request.
    Delivered,
    AllFailed,
}

impl Reply {
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Delivered => StatusCode::OK,
            Self::BodyReadFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ResolutionFailed | Self::NoTargets | Self::AllFailed => StatusCode::BAD_GATEWAY,
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ResolutionFailed => "Failed to resolve target host",
            Self::NoTargets => "No targets resolved for host",
            Self::BodyReadFailed => "Failed to read request body",
            Self::Delivered => "Ok",
            Self::AllFailed => "Failed to forward request to any resolved target",
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message(),
        )
            .into_response()
    }
}

/// Destinations answering 2xx or 3xx count as reached.
#[must_use]
pub fn is_success(status: StatusCode) -> bool {
    (200..400).contains(&status.as_u16())
}

pub fn aggregate(outcomes: &[ForwardOutcome], correlation_id: &str) -> Reply {
    if outcomes.is_empty() {
        return Reply::NoTargets;
    }

    let failures: Vec<&ForwardOutcome> = outcomes.iter().filter(|o| !o.success).collect();
    let succeeded = outcomes.len() - failures.len();

    for failure in &failures {
        tracing::warn!(
            correlation_id = %correlation_id,
            address = %failure.address,
            url = %failure.url,
            status = failure.status.unwrap_or(0),
            attempts = failure.attempts,
            error = failure.error.as_deref().unwrap_or("unknown"),
            "destination failed"
        );
    }

    if succeeded > 0 {
        if failures.is_empty() {
            tracing::info!(
                correlation_id = %correlation_id,
                destinations = outcomes.len(),
                "request delivered to all destinations"
            );
        } else {
            tracing::warn!(
                correlation_id = %correlation_id,
                succeeded,
                failed = failures.len(),
                "request partially delivered"
            );
        }
        Reply::Delivered
    } else {
        tracing::error!(
            correlation_id = %correlation_id,
            failed = failures.len(),
            "failed to forward request to any resolved target"
        );
        Reply::AllFailed
    }
}
