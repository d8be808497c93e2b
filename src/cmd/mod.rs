//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`resolve`], or [`health`]. Each handler
//! lives in its own submodule.

pub mod health;
pub mod resolve;
pub mod run;

use crate::cli::{Cli, Commands};
use crate::error::FanoutError;

pub async fn dispatch(cli: Cli) -> Result<(), FanoutError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Resolve(ref args)) => resolve::execute(args).await,
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  dns-fanout v{version} \u{2014} DNS-based fan-out reverse proxy\n\n  \
         No command provided. To get started:\n\n    \
         dns-fanout run --target peers.svc:9000   Forward every request to all peers\n    \
         dns-fanout resolve peers.svc:9000        Preview the current peer set\n    \
         dns-fanout --help                        See all commands and options\n"
    );
}
