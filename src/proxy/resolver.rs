//! Per-request IPv4 resolution of the target hostname.
//!
//! Nothing is cached: the peer set behind the hostname is expected to
//! change between requests, so every inbound request asks again.

use std::net::{IpAddr, Ipv4Addr};

use async_trait::async_trait;

use crate::error::FanoutError;

// async_trait is required here because Resolve is held as Arc<dyn Resolve>
// in the shared state and native async fn in traits does not support dyn dispatch.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Current IPv4 addresses of `hostname`. An empty set is not an error.
    async fn resolve(&self, hostname: &str) -> Result<Vec<Ipv4Addr>, FanoutError>;
}

/// Resolver backed by the operating system (`getaddrinfo`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolve for SystemResolver {
    async fn resolve(&self, hostname: &str) -> Result<Vec<Ipv4Addr>, FanoutError> {
        let addrs = tokio::net::lookup_host((hostname, 0))
            .await
            .map_err(|source| FanoutError::Resolution {
                host: hostname.to_string(),
                source,
            })?;

        Ok(ipv4_only(addrs.map(|addr| addr.ip())))
    }
}

/// Keep IPv4 results, dropping duplicates while preserving lookup order.
pub fn ipv4_only(ips: impl IntoIterator<Item = IpAddr>) -> Vec<Ipv4Addr> {
    let mut out: Vec<Ipv4Addr> = Vec::new();
    for ip in ips {
        if let IpAddr::V4(v4) = ip {
            if !out.contains(&v4) {
                out.push(v4);
            }
        }
    }
    out
}
