mod args;
mod commands;

pub use args::{Cli, Command};

use crate::domain::error::Result;

/// Dispatch a parsed command line
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Profile(args) => commands::profile(args),
        Command::Provision(args) => commands::provision(args).await,
        Command::Verify(args) => commands::verify(args).await,
        Command::Teardown(args) => commands::teardown(args).await,
        Command::StorePassword(args) => commands::store_password(args),
    }
}
