//! Crossgo - Go cross compilation in containers
//!
//! CLI entry point: parses flags, loads configuration and runs the build.

use clap::Parser;
use console::style;
use crossgo::cli::Cli;
use crossgo::config::{Config, ConfigManager};
use crossgo::error::CrossgoResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CrossgoResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);

    crossgo::cli::commands::build(cli.build, &config).await
}

/// Build progress is logged at info: 0 = info, 1 = debug, 2+ = trace
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("crossgo=info"),
        1 => EnvFilter::new("crossgo=debug"),
        _ => EnvFilter::new("crossgo=trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
