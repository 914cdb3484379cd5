//! Paper notifier CLI
//!
//! Single-shot entry point meant to be run from a scheduler. Running it with
//! no arguments processes every topic once.

use std::path::PathBuf;

use clap::Parser;
use paper_notifier::{
    error::Result,
    models::{Config, Topics},
    pipeline::{self, Notifier, NotifyOptions, TokenSource},
    services::SlackClient,
    storage::LocalStorage,
    utils::http,
};

/// Announce new papers from arXiv and RSS feeds to Slack
#[derive(Parser, Debug)]
#[command(name = "paper-notifier", version, about)]
struct Cli {
    /// Path to the TOML settings file (defaults are used if it is missing)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the topics file from the settings
    #[arg(long)]
    topics: Option<PathBuf>,

    /// Override the posted-ID file from the settings
    #[arg(long)]
    posted_ids: Option<PathBuf>,

    /// Load and validate configuration, then exit
    #[arg(long)]
    validate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if let Some(path) = cli.topics {
        config.paths.topics_file = path;
    }
    if let Some(path) = cli.posted_ids {
        config.paths.posted_ids_file = path;
    }
    config.validate()?;

    let topics = Topics::load(&config.paths.topics_file)?;
    topics.validate()?;
    log::info!(
        "Loaded {} topics from {}",
        topics.len(),
        config.paths.topics_file.display()
    );

    if cli.validate {
        log::info!("✓ Config and topics OK");
        return Ok(());
    }

    let client = http::create_client(&config.http)?;
    let slack = SlackClient::new(client.clone(), &config.slack);
    let store = LocalStorage::new(&config.paths.posted_ids_file);
    let notifier = Notifier::new(
        &slack,
        &store,
        TokenSource::Env(config.slack.token_env.clone()),
        NotifyOptions::from(&config.slack),
    );

    let summary = pipeline::run(&config, &topics, &client, &notifier).await?;
    summary.log();

    Ok(())
}
