//! es-watch - Esprit scan watcher
//!
//! Follows scans live over the realtime feed and manages GitHub linking and
//! usage from the terminal. Output is JSON, one value per line.
//!
//! # Examples
//!
//! ```bash
//! # Recent scans, then every change as it happens
//! es-watch scans --follow
//!
//! # One scan with its log until it finishes
//! es-watch scan <id> --pretty
//!
//! # Link a GitHub account
//! es-watch github link
//! es-watch github callback --url 'http://localhost:3000/auth/github/callback?code=...&state=...'
//! ```

mod app;
mod cli;
mod commands;
mod error;
mod logger;
mod render;

#[cfg(test)]
mod tests;

use crate::{app::App, cli::Cli, error::Result as WatchResult};

use es_config::Config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> WatchResult<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    // Relative log files live in the config directory
    let log_file = match &config.logging.file {
        Some(file) if PathBuf::from(file).is_absolute() => Some(PathBuf::from(file)),
        Some(file) => Some(Config::config_dir()?.join(file)),
        None => None,
    };
    logger::initialize(config.logging.level, log_file, config.logging.colored)?;

    info!("Starting es-watch v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let app = App::connect(config, cli.pretty).await?;
    let result = app.run(cli.command).await;
    app.shutdown().await;
    result
}
