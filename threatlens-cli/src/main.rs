//! threatlens CLI entry point

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use threatlens_core::config::{GeneralConfig, ThreatlensConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let general = logging_config(&cli).await;
    if let Err(e) = logging::init_tracing(&general) {
        eprintln!("{} {e:#}", "warning:".yellow().bold());
    }

    tracing::debug!(config = %cli.config.display(), "threatlens starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

/// Logging settings from the config file, falling back to defaults so that
/// `config validate` can still report a broken file.
async fn logging_config(cli: &Cli) -> GeneralConfig {
    let mut general = ThreatlensConfig::load_or_default(&cli.config)
        .await
        .map(|config| config.general)
        .unwrap_or_default();
    if let Some(level) = &cli.log_level {
        general.log_level = level.clone();
    }
    general
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(args, &cli.config, &writer).await,
        Commands::Rules(args) => commands::rules::execute(args, &writer),
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
