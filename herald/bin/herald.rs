#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

use std::path::PathBuf;

use clap::Parser;
use herald::{config::find_config_file, controller::Controller};
use herald_common::logging;

/// Keyword relay with durable at-least-once delivery
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ingest newline-delimited JSON messages from standard input
    #[arg(long)]
    stdin: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init();

    let config_path = find_config_file(cli.config)?;
    Controller::init(&config_path)?.run(cli.stdin).await
}
