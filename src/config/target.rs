//! Parsing of the configured upstream target (`host` or `host:port`).

use std::fmt;

use serde::Serialize;

use crate::error::FanoutError;

pub const DEFAULT_PORT: u16 = 80;

/// Hostname and port every inbound request is fanned out to.
///
/// Computed once at startup and shared read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetDescriptor {
    pub hostname: String,
    pub port: u16,
}

impl TargetDescriptor {
    /// Parse a `host` or `host:port` string. The port defaults to 80.
    pub fn parse(raw: &str) -> Result<Self, FanoutError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(missing_target());
        }

        let (hostname, port) = match raw.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| FanoutError::InvalidTarget {
                    target: raw.to_string(),
                    reason: format!("'{port}' is not a valid port"),
                })?;
                (host, port)
            }
            None => (raw, DEFAULT_PORT),
        };

        if hostname.is_empty() {
            return Err(FanoutError::InvalidTarget {
                target: raw.to_string(),
                reason: "hostname cannot be empty".into(),
            });
        }

        Ok(Self {
            hostname: hostname.to_string(),
            port,
        })
    }

    /// Like [`parse`](Self::parse), treating an unset value as a missing target.
    pub fn from_setting(raw: Option<&str>) -> Result<Self, FanoutError> {
        raw.map_or_else(|| Err(missing_target()), Self::parse)
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

fn missing_target() -> FanoutError {
    FanoutError::MissingTarget {
        hint: "Provide --target <host[:port]> or set the TARGET environment variable.".into(),
    }
}
