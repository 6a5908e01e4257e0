use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use nyaysetu::cli::{Cli, Commands};
use nyaysetu::commands::ask::cmd_ask;
use nyaysetu::commands::chat::cmd_chat;
use nyaysetu::commands::ingest::cmd_ingest;
use nyaysetu::commands::search::cmd_search;
use nyaysetu::commands::stats::cmd_stats;
use nyaysetu::config::Config;
use nyaysetu::error::{NyayError, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(hint) = hint_for(&e) {
                eprintln!("{} {}", "Hint:".cyan(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "nyaysetu=debug" } else { "nyaysetu=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref(), &cli.command.overrides())?;

    match cli.command {
        Commands::Ingest { .. } => cmd_ingest(&config),
        Commands::Ask { question, .. } => cmd_ask(&config, &question),
        Commands::Chat { .. } => cmd_chat(&config),
        Commands::Search { query, .. } => cmd_search(&config, &query),
        Commands::Stats { .. } => cmd_stats(&config),
    }
}

fn hint_for(error: &NyayError) -> Option<&'static str> {
    match error {
        NyayError::IndexLoad { .. } => Some("Build the index with `nyaysetu ingest` first."),
        NyayError::EmptyCorpus => Some("Add .pdf, .txt or .md files with text to the source directory."),
        NyayError::Configuration(msg) if msg.contains("API key") => {
            Some("Set the provider's API key in the environment or a .env file.")
        }
        _ => None,
    }
}
