//! `dns-fanout run` — start the proxy server.
//!
//! Builds [`Settings`] from the arguments (a missing or malformed target
//! fails here, before logging or the listener are set up), then serves
//! the Axum router until Ctrl+C / SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::Settings;
use crate::error::FanoutError;
use crate::logging;
use crate::proxy::resolver::SystemResolver;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), FanoutError> {
    let settings = Settings::from_args(&args)?;

    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    #[cfg(feature = "sentry-integration")]
    let _sentry_guard = args.sentry_dsn.as_ref().map(|dsn| {
        crate::sentry_integration::init(dsn, args.sentry_environment.as_deref(), &settings.target)
    });

    let state = Arc::new(AppState::new(&settings, Arc::new(SystemResolver)));
    let router = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.listen).await?;

    tracing::info!(
        addr = %settings.listen,
        target = %settings.target,
        max_attempts = settings.retry.max_attempts(),
        timeout_ms = u64::try_from(settings.timeout.as_millis()).unwrap_or(u64::MAX),
        "dns-fanout started"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal())
    .await?;

    tracing::info!("dns-fanout stopped");
    Ok(())
}
