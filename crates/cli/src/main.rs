//! debounce CLI - hold back stdin lines until they settle

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;
mod system_config;

/// Debounce - emit a line only once input has been quiet for a delay
#[derive(Parser)]
#[command(name = "debounce")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/debounce/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Debounce lines read from stdin and print each value that settles
    Run {
        /// Quiescence window in milliseconds (overrides config)
        #[arg(short, long)]
        delay_ms: Option<u64>,
        /// Debounce each key independently; lines are `key<separator>value`
        #[arg(short, long)]
        keyed: bool,
        /// Key/value separator for --keyed (default: tab)
        #[arg(short, long)]
        separator: Option<String>,
        /// At end of input, wait for pending values instead of flushing them
        #[arg(long)]
        no_flush: bool,
    },
    /// View configuration
    Config {
        /// Show effective configuration (the default)
        #[arg(long, conflicts_with_all = ["example", "path"])]
        list: bool,
        /// Print an example config file
        #[arg(long, conflicts_with = "path")]
        example: bool,
        /// Print the config file path
        #[arg(long)]
        path: bool,
        /// With --path, create the file if it doesn't exist
        #[arg(long, requires = "path")]
        create: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries data, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { delay_ms, keyed, separator, no_flush } => {
            let config = system_config::load(cli.config.as_deref())?;
            let options =
                cmd::run::RunOptions::resolve(&config, delay_ms, keyed, separator, no_flush)?;
            cmd::run::run(options).await
        }
        Commands::Config { list, example, path, create } => {
            if list || !(example || path) {
                cmd::config::run_list(cli.config.as_deref()).await
            } else if example {
                cmd::config::run_example().await
            } else {
                cmd::config::run_path(create).await
            }
        }
    }
}
