mod app;
mod cli;
mod config;
mod domain;
mod session;
mod source;
mod stream;
mod tui;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("redwatch=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(channels) = cli.channels {
        config.channels = channels;
    }

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => tui::run(config).await?,
        Commands::Stream => cli::commands::stream(config).await?,
    }

    Ok(())
}
