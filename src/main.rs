use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = dns_fanout::cli::Cli::parse();
    if let Err(e) = dns_fanout::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
