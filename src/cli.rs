//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, resolve, health), and their associated argument
//! structs. Every `run` flag has an environment variable equivalent for
//! container deployments.

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "dns-fanout",
    version,
    about = "DNS-based fan-out reverse proxy",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        dns-fanout run --target peers.svc:9000   Forward every request to all peers\n  \
        TARGET=peers.svc dns-fanout run          Same, configured from the environment\n  \
        dns-fanout resolve peers.svc:9000        Show which peers would receive requests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Run(Box<RunArgs>),

    /// Resolve a target once and print the addresses that would receive requests
    Resolve(ResolveArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        dns-fanout run --target peers.svc:9000                 Fan out to port 9000\n  \
        dns-fanout run --target peers.svc -p 3000 --pretty     Local dev mode\n  \
        dns-fanout run --target peers.svc --retries 5          More patient retries")]
pub struct RunArgs {
    /// Upstream target as host or host:port (port defaults to 80)
    #[arg(short, long, env = "TARGET")]
    pub target: Option<String>,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Observability --
    /// Sentry DSN (enables error tracking)
    #[cfg(feature = "sentry-integration")]
    #[arg(long, env = "SENTRY_DSN", help_heading = "Observability")]
    pub sentry_dsn: Option<String>,

    /// Sentry environment tag
    #[cfg(feature = "sentry-integration")]
    #[arg(long, env = "SENTRY_ENVIRONMENT", help_heading = "Observability")]
    pub sentry_environment: Option<String>,

    // -- Tuning --
    /// Per-attempt timeout for each outbound call in milliseconds
    #[arg(
        long,
        env = "REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        help_heading = "Tuning"
    )]
    pub timeout: u64,

    /// Maximum attempts per destination (including the first)
    #[arg(
        long,
        env = "RETRY_ATTEMPTS",
        default_value_t = 3,
        value_parser = clap::value_parser!(u32).range(1..),
        help_heading = "Tuning"
    )]
    pub retries: u32,

    /// Delay before the first retry in milliseconds (doubles per attempt)
    #[arg(
        long,
        env = "RETRY_BASE_DELAY_MS",
        default_value_t = 100,
        help_heading = "Tuning"
    )]
    pub retry_delay: u64,

    /// Upper bound for a single retry delay in milliseconds
    #[arg(
        long,
        env = "RETRY_MAX_DELAY_MS",
        default_value_t = 5_000,
        help_heading = "Tuning"
    )]
    pub retry_max_delay: u64,

    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = 10_485_760,
        help_heading = "Tuning"
    )]
    pub max_body: usize,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Target as host or host:port
    pub target: String,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:8080")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
