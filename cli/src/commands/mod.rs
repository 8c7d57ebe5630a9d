pub mod comments;

use anyhow::Result;

use crate::cli::{Cli, Commands};

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Comments {
            command,
        } => comments::run(command).await,
    }
}
