//! One-shot capture of the inbound request body.
//!
//! The inbound stream can only be read once, so it is drained into a
//! [`CapturedBody`] up front and that buffer is replayed to every
//! destination.

use axum::body::Body;
use axum::http::Method;
use bytes::Bytes;
use http_body_util::{BodyExt, Limited};

use crate::error::FanoutError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedBody {
    Absent,
    Bytes(Bytes),
}

impl CapturedBody {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Absent => 0,
            Self::Bytes(bytes) => bytes.len(),
        }
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Payload for one outbound request. Cloning `Bytes` only bumps a refcount.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Absent => Bytes::new(),
            Self::Bytes(bytes) => bytes.clone(),
        }
    }
}

/// Methods that never carry a forwarded body.
#[must_use]
pub fn is_bodyless(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// Drain `body` into memory. Reading more than `max_body` bytes fails the
/// capture like any other stream error.
pub async fn capture(
    method: &Method,
    body: Body,
    max_body: usize,
) -> Result<CapturedBody, FanoutError> {
    if is_bodyless(method) {
        return Ok(CapturedBody::Absent);
    }

    let bytes = Limited::new(body, max_body)
        .collect()
        .await
        .map_err(|source| FanoutError::BodyRead { source })?
        .to_bytes();

    if bytes.is_empty() {
        Ok(CapturedBody::Absent)
    } else {
        Ok(CapturedBody::Bytes(bytes))
    }
}
