//! `dns-fanout health` — check the health of a running instance.
//!
//! Fetches `GET /health` from the given base URL and prints either the raw
//! JSON or a short summary of version, uptime, target and counters.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::cli::HealthArgs;
use crate::error::FanoutError;
use crate::health::HealthResponse;

const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn execute(args: HealthArgs) -> Result<(), FanoutError> {
    let (status, body) = fetch(&health_uri(&args.url)?).await?;
    if !status.is_success() {
        return Err(FanoutError::HealthCheckFailed(status));
    }

    if args.json {
        println!("{}", String::from_utf8_lossy(&body));
        return Ok(());
    }

    match serde_json::from_slice::<HealthResponse>(&body) {
        Ok(health) => println!("{}", render(&args.url, &health)),
        Err(e) => {
            eprintln!("Failed to parse health response: {e}");
            println!("{}", String::from_utf8_lossy(&body));
        }
    }

    Ok(())
}

fn health_uri(base: &str) -> Result<Uri, FanoutError> {
    format!("{}/health", base.trim_end_matches('/'))
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| FanoutError::UriParse {
            source: Box::new(e),
        })
}

async fn fetch(uri: &Uri) -> Result<(StatusCode, Bytes), FanoutError> {
    let client: Client<HttpConnector, Full<Bytes>> =
        Client::builder(TokioExecutor::new()).build(HttpConnector::new());

    let req = hyper::Request::get(uri)
        .body(Full::new(Bytes::new()))
        .map_err(|e| FanoutError::HttpRequest {
            source: Box::new(e),
        })?;

    let exchange = async {
        let response = client.request(req).await?;
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();
        Ok::<_, Box<dyn std::error::Error + Send + Sync>>((status, body))
    };

    tokio::time::timeout(CHECK_TIMEOUT, exchange)
        .await
        .map_err(|_| FanoutError::HttpRequest {
            source: format!("health check timed out after {}s", CHECK_TIMEOUT.as_secs()).into(),
        })?
        .map_err(|source| FanoutError::HttpRequest { source })
}

fn render(url: &str, health: &HealthResponse) -> String {
    format!(
        "\u{2713} dns-fanout is {} ({url})\n  \
         version:   {}\n  \
         uptime:    {}\n  \
         target:    {}:{}\n  \
         requests:  {} forwarded, {} failed",
        health.status,
        health.version,
        format_uptime(health.uptime_seconds),
        health.target.hostname,
        health.target.port,
        health.stats.requests_forwarded,
        health.stats.requests_failed,
    )
}

fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
