use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "sitesync")]
#[command(about = "Offline action queue for site tickets, diary entries and messages")]
#[command(long_about = "sitesync - capture changes offline, apply them when back online

Every change is stored locally first and replayed against the backend, oldest
first, as soon as it can be reached. Changes that fail stay queued with their
error and are retried on the next sync.

QUICK START:
  sitesync add ticket create --payload '{\"title\": \"Cracked tile\"}'
  sitesync status             Show pending and failing actions
  sitesync list               Show queued actions in sync order
  sitesync sync               Apply queued actions now

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Use 'pretty' for human-readable colored output (default),
    /// or 'json' for machine-readable output suitable for scripting.
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub output: OutputFormat,

    /// Treat the backend as unreachable without probing it
    #[arg(long, global = true, env = "SITESYNC_OFFLINE")]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show queue status
    ///
    /// Displays network state, pending and failing actions, the age of the
    /// oldest pending action and the most recent error.
    #[command(alias = "st")]
    Status,

    /// List queued actions in the order they will be applied
    #[command(alias = "ls")]
    List {
        /// Maximum actions to show
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },

    /// Queue a change
    ///
    /// The change is stored locally, then applied right away when the
    /// backend is reachable.
    ///
    /// # Examples
    ///
    ///   sitesync add ticket create --payload '{"title": "Leak in lot 4"}'
    ///   sitesync add message update --payload '{"id": "m-1", "body": "Fixed"}'
    ///   sitesync add diary-entry delete --payload '{"id": "d-7"}'
    Add {
        /// Entity type (ticket, diary-entry, message)
        entity: String,

        /// Action (create, update, delete)
        action: String,

        /// Row fields as JSON; updates and deletes need an "id"
        #[arg(long, short = 'p', default_value = "{}")]
        payload: String,
    },

    /// Apply queued actions now
    Sync,

    /// Drop every queued action without applying it
    Clear {
        /// Skip confirmation
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Generate shell completions
    ///
    /// Example: sitesync completions bash > ~/.bash_completion.d/sitesync
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
