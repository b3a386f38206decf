pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "redwatch")]
#[command(about = "A terminal Reddit activity watcher", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/redwatch/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Channels to watch, overriding the config (comma-separated, no "r/")
    #[arg(long, global = true, value_delimiter = ',')]
    pub channels: Option<Vec<String>>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the TUI (default)
    Tui,
    /// Stream activity to stdout, headless
    Stream,
}
