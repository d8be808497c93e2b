//! `dns-fanout resolve` — preview the current peer set of a target.
//!
//! Parses the target exactly like `run` does, resolves it once, and
//! prints each IPv4 address with the URL a request to `/` would be
//! forwarded to. Fails when resolution errors or yields no addresses.

use crate::cli::{OutputFormat, ResolveArgs};
use crate::config::TargetDescriptor;
use crate::error::FanoutError;
use crate::proxy::fanout::destination_url;
use crate::proxy::resolver::{Resolve, SystemResolver};

pub async fn execute(args: &ResolveArgs) -> Result<(), FanoutError> {
    let target = TargetDescriptor::parse(&args.target)?;
    let report = report(&target, &SystemResolver).await?;

    match args.format {
        OutputFormat::Text => {
            println!(
                "\u{2713} {} resolves to {} address(es)",
                target,
                report.len()
            );
            for (address, url) in &report {
                println!("  {address:<15}  {url}");
            }
        }
        OutputFormat::Json => {
            let addresses: Vec<serde_json::Value> = report
                .iter()
                .map(|(address, url)| serde_json::json!({ "address": address, "url": url }))
                .collect();
            println!(
                "{}",
                serde_json::json!({
                    "hostname": target.hostname,
                    "port": target.port,
                    "addresses": addresses,
                })
            );
        }
    }

    Ok(())
}

async fn report(
    target: &TargetDescriptor,
    resolver: &dyn Resolve,
) -> Result<Vec<(String, String)>, FanoutError> {
    let addresses = resolver.resolve(&target.hostname).await?;
    if addresses.is_empty() {
        return Err(FanoutError::NoAddresses {
            host: target.hostname.clone(),
        });
    }

    Ok(addresses
        .into_iter()
        .map(|address| {
            (
                address.to_string(),
                destination_url(address, target.port, "/"),
            )
        })
        .collect())
}
