//! Startup configuration.
//!
//! [`Settings`] is assembled once from the parsed `run` arguments (flags or
//! their environment-variable equivalents) and is read-only afterwards.
//! The upstream target is parsed first so a missing or malformed `TARGET`
//! fails startup before anything else happens.

pub mod target;

use std::net::SocketAddr;
use std::time::Duration;

use crate::cli::RunArgs;
use crate::error::FanoutError;
use crate::proxy::retry::RetryPolicy;

pub use target::TargetDescriptor;

#[derive(Debug, Clone)]
pub struct Settings {
    pub target: TargetDescriptor,
    pub listen: SocketAddr,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub max_body: usize,
}

impl Settings {
    pub fn from_args(args: &RunArgs) -> Result<Self, FanoutError> {
        let target = TargetDescriptor::from_setting(args.target.as_deref())?;
        let listen: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

        Ok(Self {
            target,
            listen,
            timeout: Duration::from_millis(args.timeout),
            retry: RetryPolicy::new(
                args.retries,
                Duration::from_millis(args.retry_delay),
                Duration::from_millis(args.retry_max_delay),
            ),
            max_body: args.max_body,
        })
    }
}
