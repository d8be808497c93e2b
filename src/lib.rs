//! dns-fanout is a DNS-based fan-out reverse proxy.
//!
//! Every inbound HTTP request is forwarded, unchanged, to *each* IPv4
//! address the configured target hostname resolves to at that moment.
//! The client gets `200 Ok` when at least one peer accepted the request
//! and a coarse 5xx otherwise; per-peer detail only goes to the logs.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, resolve, health).
//! - [`config`] -- Startup settings and the `host[:port]` target descriptor.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /version` and `GET /health` handlers.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- The forwarding engine: resolution, body capture, concurrent
//!   fan-out with per-destination retry, and outcome aggregation.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `sentry-integration` | Sentry error tracking |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod proxy;
pub mod server;

#[cfg(feature = "sentry-integration")]
pub mod sentry_integration;
