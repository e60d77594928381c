//! CLI interface using clap
//!
//! Provides the command-line interface for learn

mod commands;

pub use commands::*;

use crate::config::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// learn - spaced-repetition flashcards from your documents
#[derive(Parser, Debug)]
#[command(name = "learn")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// SQLite database path (overrides the config file)
    #[arg(long, global = true, env = "LEARN_DB")]
    pub db: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a PDF, Markdown or text file and generate cards
    Ingest(IngestArgs),

    /// Review due cards interactively
    Review(ReviewArgs),

    /// List the cards due now
    Due(DueArgs),

    /// Show card and review counts
    Stats,

    /// Show the review log of a card
    History(HistoryArgs),

    /// Show the configuration, or reset it to defaults
    Config(ConfigArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments for ingest command
#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Path to the document
    pub file: PathBuf,

    /// Generate cards with an LLM (falls back to heuristic cards on failure)
    #[arg(long)]
    pub use_llm: bool,
}

/// Arguments for review command
#[derive(Parser, Debug)]
pub struct ReviewArgs {
    /// Review at most this many cards
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for due command
#[derive(Parser, Debug)]
pub struct DueArgs {
    /// Evaluate due status at this RFC 3339 time instead of now
    #[arg(long)]
    pub at: Option<String>,
}

/// Arguments for history command
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Card id
    pub card_id: i64,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Reset the configuration file to defaults
    #[arg(long)]
    pub reset: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
