//! Command implementations

use super::OutputFormat;
use crate::cards::build_generator;
use crate::config::LearnConfig;
use crate::extract;
use crate::session::{ReviewSession, SessionSummary};
use crate::srs::{format_interval, time};
use crate::storage::{DueCard, ReviewRecord, Store, StoreStats};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::info;

/// Open the store named by `--db`, or by the configuration
pub fn open_store(config: &LearnConfig, db_override: Option<&Path>) -> Result<Store> {
    let path = db_override.unwrap_or(config.db_path.as_path());
    let store = Store::open(path)?;
    Ok(store)
}

/// Extract a document, generate cards and store them
pub async fn ingest(
    store: &Store,
    config: &LearnConfig,
    file: &Path,
    use_llm: bool,
) -> Result<usize> {
    let text = extract::extract(file)
        .with_context(|| format!("Failed to extract text from {:?}", file))?;

    let generator = build_generator(config, use_llm);
    let cards = generator.generate(&text).await?;
    info!(
        generator = generator.name(),
        count = cards.len(),
        "Cards ready to insert"
    );

    let inserted = store.add_cards(&cards)?;
    println!("Inserted {} cards into {:?}", inserted, store.path());

    Ok(inserted)
}

/// Run an interactive review session on stdin
///
/// The transcript goes to stdout, or to stderr when stdout is reserved for
/// the JSON summary.
pub fn review(
    store: &Store,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<SessionSummary> {
    let input = std::io::stdin().lock();
    let now = time::now_utc();

    match format {
        OutputFormat::Text => {
            let mut session = ReviewSession::new(store, input, std::io::stdout().lock());
            session.run(now, limit)
        }
        OutputFormat::Json => {
            let mut session = ReviewSession::new(store, input, std::io::stderr().lock());
            session.run(now, limit)
        }
    }
}

/// Parse an optional `--at` argument, defaulting to now
pub fn resolve_now(at: Option<&str>) -> Result<DateTime<Utc>> {
    match at {
        Some(s) => time::parse_iso(s).with_context(|| format!("Invalid --at time: {}", s)),
        None => Ok(time::now_utc()),
    }
}

/// List the cards due at `now`
pub fn due(store: &Store, now: DateTime<Utc>, format: OutputFormat) -> Result<()> {
    let cards = store.get_due_cards(now)?;

    match format {
        OutputFormat::Json => print_json(&cards)?,
        OutputFormat::Text => print_due_text(&cards),
    }

    Ok(())
}

/// Show store statistics
pub fn stats(store: &Store, format: OutputFormat) -> Result<()> {
    let stats = store.get_stats(time::now_utc())?;

    match format {
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Text => print_stats_text(store, &stats),
    }

    Ok(())
}

/// Show the review log of one card
pub fn history(store: &Store, card_id: i64, format: OutputFormat) -> Result<()> {
    let card = store
        .get_card(card_id)?
        .ok_or_else(|| anyhow::anyhow!("Card not found: {}", card_id))?;
    let records = store.get_history(card_id)?;

    match format {
        OutputFormat::Json => print_json(&records)?,
        OutputFormat::Text => {
            println!("Card {}: {}", card.id, card.question);
            if let Some(ref source) = card.source_ref {
                println!("  Source: {}", source);
            }
            println!("  Created: {}\n", time::to_iso(card.created_at));
            print_history_text(&records);
        }
    }

    Ok(())
}

/// Show the effective configuration, or reset the file to defaults
pub fn config(path: &Path, config: &LearnConfig, reset: bool) -> Result<()> {
    if reset {
        LearnConfig::default().save(path)?;
        println!("✓ Configuration reset to defaults in {:?}", path);
        return Ok(());
    }

    let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    let origin = if path.exists() { "" } else { " (defaults)" };
    println!("# {:?}{}", path, origin);
    println!("{}", content);

    Ok(())
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print due cards in text format
pub fn print_due_text(cards: &[DueCard]) {
    if cards.is_empty() {
        println!("No cards due.");
        return;
    }

    println!("{} card(s) due:\n", cards.len());
    for card in cards {
        println!("[{}] {}", card.id, card.question);
    }
}

fn print_stats_text(store: &Store, stats: &StoreStats) {
    println!("learn status");
    println!("============\n");

    println!("Database: {:?}", store.path());
    println!("Cards: {}", stats.cards);
    println!("Reviewed cards: {}", stats.reviewed_cards);
    println!("Reviews: {}", stats.reviews);
    println!("Due now: {}", stats.due);
}

fn print_history_text(records: &[ReviewRecord]) {
    if records.is_empty() {
        println!("Never reviewed.");
        return;
    }

    for record in records {
        let marker = if record.quality.is_lapse() { "✗" } else { "✓" };
        println!(
            "{} {}  q={}  interval={}  ease={:.2}  next={}",
            marker,
            time::to_iso(record.reviewed_at),
            record.quality,
            format_interval(record.interval),
            record.ease,
            time::to_iso(record.next_due_at),
        );
    }
}
