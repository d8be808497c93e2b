//! Optional Sentry error tracking integration.
//!
//! Initializes the Sentry SDK with the provided DSN and environment and
//! tags every event with the fan-out target. The returned guard must be
//! held for the lifetime of the application so panics are reported.

use crate::config::TargetDescriptor;

pub fn init(
    dsn: &str,
    environment: Option<&str>,
    target: &TargetDescriptor,
) -> sentry::ClientInitGuard {
    let parsed_dsn = match dsn.parse() {
        Ok(d) => Some(d),
        Err(e) => {
            tracing::warn!(error = %e, "invalid Sentry DSN, error tracking disabled");
            None
        }
    };

    let guard = sentry::init(sentry::ClientOptions {
        dsn: parsed_dsn,
        environment: environment.map(|e| e.to_string().into()),
        release: Some(concat!(env!("CARGO_PKG_NAME"), "@", env!("CARGO_PKG_VERSION")).into()),
        ..Default::default()
    });

    let target = target.to_string();
    sentry::configure_scope(|scope| scope.set_tag("fanout.target", target));

    guard
}
