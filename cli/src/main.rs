//! `hn-cli`: list, post, edit and delete article comments from a terminal,
//! or render a reply tree from exported rows offline.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use howto_shared::logging::{init_tracing, LogConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Quiet by default; override via RUST_LOG if needed.
    let log_config = LogConfig::new("hn-cli").with_default_filter("warn").on_stderr();
    let _log_guard = init_tracing(log_config)?;

    let cli = cli::Cli::parse();
    commands::run(cli).await
}
