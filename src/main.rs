use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use sitesync::cli::args::{Cli, Commands};
use sitesync::cli::commands;
use sitesync::config::Config;
use sitesync::logging::init_logging;
use sitesync::OfflineQueue;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;
    let offline = cli.offline;

    let output = match cli.command {
        Commands::Completions { shell } => commands::completions(shell)?,
        Commands::Status => commands::status(&open_queue(offline).await?, format)?,
        Commands::List { limit } => commands::list(&open_queue(offline).await?, limit, format)?,
        Commands::Add {
            entity,
            action,
            payload,
        } => {
            let queue = open_queue(offline).await?;
            commands::add(&queue, &entity, &action, &payload, format).await?
        },
        Commands::Sync => commands::sync(&open_queue(offline).await?, format).await?,
        Commands::Clear { force } => commands::clear(&open_queue(offline).await?, force, format)?,
    };

    if !output.is_empty() {
        println!("{}", output.trim_end());
    }
    Ok(())
}

/// Load configuration, start logging and open the queue.
async fn open_queue(offline: bool) -> Result<OfflineQueue> {
    let config = Config::load().context("failed to load configuration")?;
    init_logging(&config.logging.level);

    commands::open_queue(&config, offline)
        .await
        .context("failed to open the offline queue")
}
