//! Command-line argument definitions

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::account::AccountCommands;
use crate::cli::commands::batch::BatchCommands;
use crate::cli::commands::calendar::CalendarArgs;
use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::config::ConfigCommands;
use crate::cli::commands::images::ImagesArgs;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::protocol::ProtocolCommands;
use crate::cli::commands::tasks::TasksArgs;

/// difftrack - schedule and track stem-cell differentiation batches
#[derive(Parser, Debug)]
#[command(name = "difftrack", version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "auto")]
    pub output: OutputFormat,

    /// Show debug logging on stderr
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pick a format for the command (tsv for lists, yaml for single records)
    #[default]
    Auto,
    /// Boxed table
    Table,
    /// Tab-separated values
    Tsv,
    /// Comma-separated values
    Csv,
    Json,
    Yaml,
    /// Markdown
    Md,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a project in the current directory
    Init(InitArgs),

    /// Manage accounts and log in
    #[command(subcommand)]
    Account(AccountCommands),

    /// Create, list and edit batches
    #[command(subcommand)]
    Batch(BatchCommands),

    /// Day-offset heatmap of your batches
    Calendar(CalendarArgs),

    /// Tasks and media volumes for a date
    Tasks(TasksArgs),

    /// Inspect the differentiation protocol
    #[command(subcommand)]
    Protocol(ProtocolCommands),

    /// Group micrograph files by day and dish
    Images(ImagesArgs),

    /// Show the effective configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
