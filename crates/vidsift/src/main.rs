// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! vidsift - mirror matched videos from source chats into one curated,
//! topic-partitioned destination.
//!
//! This is the binary entry point.

mod migrate;
mod run;
mod status;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use vidsift_config::{format_errors, validate_config, VidsiftConfig};

/// vidsift - sort incoming videos into one forum-style destination chat.
#[derive(Parser, Debug)]
#[command(name = "vidsift", version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file (default: XDG hierarchy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one full ingestion pass over the configured sources.
    Run,
    /// Show processed-state counters and destination cache summary.
    Status,
    /// Load and validate configuration, printing the effective model.
    CheckConfig,
    /// Print the dedup comparison key derived from a filename.
    Normalize {
        /// Filename to normalize.
        file_name: String,
    },
    /// Open the store, forcing legacy plaintext import and migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.run.log_level);

    let result = match cli.command {
        Commands::Run => run::run_command(config).await,
        Commands::Status => status::status_command(&config).await,
        Commands::CheckConfig => check_config_command(&config),
        Commands::Normalize { file_name } => {
            println!("{}", vidsift_ingest::normalize(&file_name));
            Ok(())
        }
        Commands::Migrate => migrate::migrate_command(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load configuration from an explicit path or the XDG hierarchy.
fn load_config(path: Option<&std::path::Path>) -> Result<VidsiftConfig, String> {
    let result = match path {
        Some(path) => vidsift_config::load_config_from_path(path),
        None => vidsift_config::load_config(),
    };
    result.map_err(|e| format!("failed to load configuration: {e}"))
}

/// Validate the loaded configuration and print the effective model.
fn check_config_command(config: &VidsiftConfig) -> Result<(), vidsift_core::VidsiftError> {
    if let Err(errors) = validate_config(config) {
        return Err(vidsift_core::VidsiftError::Config(format!(
            "configuration is invalid:\n{}",
            format_errors(&errors)
        )));
    }
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| vidsift_core::VidsiftError::Internal(format!("render failed: {e}")))?;
    println!("{rendered}");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vidsift={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
