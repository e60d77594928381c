//! learn - spaced-repetition flashcards from your documents
//!
//! Ingests a document, derives question/answer cards from it and schedules
//! their review with an SM-2 style algorithm.

use anyhow::Result;
use clap::Parser;
use learn::cli::{
    config as show_config, due, history, ingest, open_store, print_json, resolve_now, review,
    stats, Cli, Commands, OutputFormat,
};
use learn::config::LearnConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = LearnConfig::load_or_default(&cli.config)?;

    // Execute command
    match cli.command {
        Commands::Ingest(args) => {
            let store = open_store(&config, cli.db.as_deref())?;

            // Only the LLM client is async; the core stays synchronous
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(ingest(&store, &config, &args.file, args.use_llm))?;
        }

        Commands::Review(args) => {
            let store = open_store(&config, cli.db.as_deref())?;
            let summary = review(&store, args.limit, cli.format)?;

            if cli.format == OutputFormat::Json {
                print_json(&summary)?;
            } else if summary.reviewed > 0 {
                println!(
                    "Reviewed {} card(s), {} lapse(s).",
                    summary.reviewed, summary.lapses
                );
            }
        }

        Commands::Due(args) => {
            let store = open_store(&config, cli.db.as_deref())?;
            let now = resolve_now(args.at.as_deref())?;
            due(&store, now, cli.format)?;
        }

        Commands::Stats => {
            let store = open_store(&config, cli.db.as_deref())?;
            stats(&store, cli.format)?;
        }

        Commands::History(args) => {
            let store = open_store(&config, cli.db.as_deref())?;
            history(&store, args.card_id, cli.format)?;
        }

        Commands::Config(args) => {
            show_config(&cli.config, &config, args.reset)?;
        }
    }

    Ok(())
}
