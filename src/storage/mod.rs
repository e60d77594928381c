//! SQLite storage layer for cards and their review history
//!
//! This module handles persistent storage of:
//! - Cards produced by ingestion (immutable once inserted)
//! - The append-only review log
//!
//! The current scheduling state of a card is never stored; it is derived
//! from the most recent review on read. Every operation opens its own
//! connection and drops it before returning.

mod schema;

pub use schema::{CONNECTION_PRAGMAS, SCHEMA};

use crate::error::{Error, Result};
use crate::srs::{time, Quality, ReviewState};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// How long a connection waits on a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A card about to be inserted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
    pub question: String,
    pub answer: String,
    /// Provenance marker, e.g. `para:3`
    pub source_ref: Option<String>,
}

impl NewCard {
    pub fn new(question: &str, answer: &str, source_ref: Option<&str>) -> Self {
        Self {
            question: question.to_string(),
            answer: answer.to_string(),
            source_ref: source_ref.map(str::to_string),
        }
    }
}

/// A stored card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub source_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A card selected for review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueCard {
    pub id: i64,
    pub question: String,
    pub answer: String,
}

/// The persisted part of a card's scheduling state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastState {
    pub interval: u32,
    pub ease: f64,
}

/// One entry of the review log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: i64,
    pub card_id: i64,
    pub quality: Quality,
    pub interval: u32,
    pub ease: f64,
    pub next_due_at: DateTime<Utc>,
    pub reviewed_at: DateTime<Utc>,
}

/// Store statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub cards: usize,
    pub reviews: usize,
    /// Cards with at least one review
    pub reviewed_cards: usize,
    /// Cards due at the time of the query
    pub due: usize,
}

/// Selects each card together with its most recent review, if any.
/// "Most recent" is `reviewed_at` descending, ties broken by `id` descending.
const LATEST_REVIEW_JOIN: &str = r#"
    FROM cards c
    LEFT JOIN reviews r ON r.id = (
        SELECT r2.id FROM reviews r2
        WHERE r2.card_id = c.id
        ORDER BY r2.reviewed_at DESC, r2.id DESC
        LIMIT 1
    )
    WHERE r.id IS NULL OR r.next_due_at <= ?1
"#;

/// File-backed review store
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Open or create a store at the given path, ensuring the schema exists
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::unavailable(parent, e))?;
        }

        let store = Self { path };
        store
            .initialize()
            .map_err(|e| match e {
                Error::Storage(source) => Error::unavailable(&store.path, source),
                other => other,
            })?;

        debug!(path = ?store.path, "Opened review store");
        Ok(store)
    }

    /// Path of the backing database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.connect()?;

        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        debug!(journal_mode = %mode, "Journal mode set");

        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn connect(&self) -> Result<Connection> {
        let conn =
            Connection::open(&self.path).map_err(|e| Error::unavailable(&self.path, e))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(conn)
    }

    // ==================== Cards ====================

    /// Insert cards in a single transaction, returning the number committed
    ///
    /// If any row is rejected nothing is committed.
    pub fn add_cards(&self, cards: &[NewCard]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let created_at = time::to_iso(time::now_utc());

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO cards (question, answer, source_ref, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;

            for card in cards {
                inserted += stmt.execute(params![
                    card.question,
                    card.answer,
                    card.source_ref,
                    created_at,
                ])?;
            }
        }
        tx.commit()?;

        info!(inserted, "Inserted cards");
        Ok(inserted)
    }

    /// Get a card by id
    pub fn get_card(&self, card_id: i64) -> Result<Option<Card>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                "SELECT id, question, answer, source_ref, created_at FROM cards WHERE id = ?1",
                params![card_id],
                |row| {
                    Ok(CardRow {
                        id: row.get(0)?,
                        question: row.get(1)?,
                        answer: row.get(2)?,
                        source_ref: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?;

        row.map(CardRow::into_card).transpose()
    }

    /// Cards that are due at `now`, ordered by ascending id
    ///
    /// A card is due when it has never been reviewed, or when its most
    /// recent review's `next_due_at` is not after `now`.
    pub fn get_due_cards(&self, now: DateTime<Utc>) -> Result<Vec<DueCard>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT c.id, c.question, c.answer {} ORDER BY c.id",
            LATEST_REVIEW_JOIN
        ))?;

        let rows = stmt.query_map(params![time::to_iso(now)], |row| {
            Ok(DueCard {
                id: row.get(0)?,
                question: row.get(1)?,
                answer: row.get(2)?,
            })
        })?;

        let mut due = Vec::new();
        for row in rows {
            due.push(row?);
        }

        debug!(count = due.len(), "Queried due cards");
        Ok(due)
    }

    // ==================== Reviews ====================

    /// Interval and ease recorded by the card's most recent review
    pub fn get_last_state(&self, card_id: i64) -> Result<Option<LastState>> {
        let conn = self.connect()?;
        let state = conn
            .query_row(
                r#"
                SELECT interval, ease FROM reviews
                WHERE card_id = ?1
                ORDER BY reviewed_at DESC, id DESC
                LIMIT 1
                "#,
                params![card_id],
                |row| {
                    Ok(LastState {
                        interval: row.get(0)?,
                        ease: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(state)
    }

    /// Full scheduler state reconstructed from the review log
    ///
    /// `reps` is the number of trailing reviews that were not lapses.
    pub fn get_review_state(&self, card_id: i64) -> Result<Option<ReviewState>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT quality, interval, ease FROM reviews
            WHERE card_id = ?1
            ORDER BY reviewed_at DESC, id DESC
            "#,
        )?;

        let mut rows = stmt.query(params![card_id])?;
        let mut latest: Option<(u32, f64)> = None;
        let mut reps = 0;

        while let Some(row) = rows.next()? {
            let quality = Quality::try_from(row.get::<_, i64>(0)?)?;
            if latest.is_none() {
                latest = Some((row.get(1)?, row.get(2)?));
            }
            if quality.is_lapse() {
                break;
            }
            reps += 1;
        }

        Ok(latest.map(|(interval, ease)| ReviewState::new(interval, ease, reps)))
    }

    /// Append a review reviewed now
    pub fn add_review(
        &self,
        card_id: i64,
        quality: Quality,
        interval: u32,
        ease: f64,
        next_due: DateTime<Utc>,
    ) -> Result<()> {
        self.add_review_at(card_id, quality, interval, ease, next_due, time::now_utc())
    }

    /// Append a review with an explicit review time
    ///
    /// Both timestamps must fall within years 0000-9999, otherwise
    /// [`Error::InvalidTimestamp`] is returned and nothing is written.
    pub fn add_review_at(
        &self,
        card_id: i64,
        quality: Quality,
        interval: u32,
        ease: f64,
        next_due: DateTime<Utc>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<()> {
        let next_due = time::ensure_storable(next_due)?;
        let reviewed_at = time::ensure_storable(reviewed_at)?;

        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO reviews (card_id, quality, interval, ease, next_due_at, reviewed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                card_id,
                quality.value(),
                interval,
                ease,
                time::to_iso(next_due),
                time::to_iso(reviewed_at),
            ],
        )?;

        debug!(
            card_id,
            quality = quality.value(),
            interval,
            "Recorded review"
        );
        Ok(())
    }

    /// The review log of a card, oldest first
    pub fn get_history(&self, card_id: i64) -> Result<Vec<ReviewRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, card_id, quality, interval, ease, next_due_at, reviewed_at
            FROM reviews WHERE card_id = ?1
            ORDER BY reviewed_at, id
            "#,
        )?;

        let rows = stmt.query_map(params![card_id], |row| {
            Ok(ReviewRow {
                id: row.get(0)?,
                card_id: row.get(1)?,
                quality: row.get(2)?,
                interval: row.get(3)?,
                ease: row.get(4)?,
                next_due_at: row.get(5)?,
                reviewed_at: row.get(6)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }

        Ok(records)
    }

    // ==================== Statistics ====================

    /// Get store statistics relative to `now`
    pub fn get_stats(&self, now: DateTime<Utc>) -> Result<StoreStats> {
        let conn = self.connect()?;

        let cards: i64 = conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;

        let reviews: i64 = conn.query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))?;

        let reviewed_cards: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT card_id) FROM reviews",
            [],
            |row| row.get(0),
        )?;

        let due: i64 = conn.query_row(
            &format!("SELECT COUNT(*) {}", LATEST_REVIEW_JOIN),
            params![time::to_iso(now)],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            cards: cards as usize,
            reviews: reviews as usize,
            reviewed_cards: reviewed_cards as usize,
            due: due as usize,
        })
    }
}

// Internal row types for database mapping

struct CardRow {
    id: i64,
    question: String,
    answer: String,
    source_ref: Option<String>,
    created_at: String,
}

impl CardRow {
    fn into_card(self) -> Result<Card> {
        Ok(Card {
            id: self.id,
            question: self.question,
            answer: self.answer,
            source_ref: self.source_ref,
            created_at: time::parse_iso(&self.created_at)?,
        })
    }
}

struct ReviewRow {
    id: i64,
    card_id: i64,
    quality: i64,
    interval: u32,
    ease: f64,
    next_due_at: String,
    reviewed_at: String,
}

impl ReviewRow {
    fn into_record(self) -> Result<ReviewRecord> {
        Ok(ReviewRecord {
            id: self.id,
            card_id: self.card_id,
            quality: Quality::try_from(self.quality)?,
            interval: self.interval,
            ease: self.ease,
            next_due_at: time::parse_iso(&self.next_due_at)?,
            reviewed_at: time::parse_iso(&self.reviewed_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("learn.db")).unwrap();
        (dir, store)
    }

    fn q(value: u8) -> Quality {
        Quality::new(value).unwrap()
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap()
    }

    fn far_future() -> DateTime<Utc> {
        time::parse_iso("2100-01-01T00:00:00+00:00").unwrap()
    }

    #[test]
    fn test_store_creation() {
        let (_dir, store) = open_temp();
        let stats = store.get_stats(far_future()).unwrap();
        assert_eq!(stats.cards, 0);
        assert_eq!(stats.reviews, 0);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("learn.db");

        Store::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unavailable_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = Store::open(blocker.join("learn.db")).unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable { .. }));
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learn.db");

        let store = Store::open(&path).unwrap();
        store.add_cards(&[NewCard::new("Q", "A", None)]).unwrap();

        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.get_due_cards(far_future()).unwrap().len(), 1);
        assert_eq!(reopened.get_stats(far_future()).unwrap().cards, 1);
    }

    #[test]
    fn test_single_card_roundtrip() {
        let (_dir, store) = open_temp();
        store.add_cards(&[NewCard::new("Q", "A", None)]).unwrap();

        let due = store.get_due_cards(far_future()).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].question, "Q");
        assert_eq!(due[0].answer, "A");

        let card = store.get_card(due[0].id).unwrap().unwrap();
        assert_eq!(card.source_ref, None);
    }

    #[test]
    fn test_batch_roundtrip_in_id_order() {
        let (_dir, store) = open_temp();
        let cards: Vec<NewCard> = (1..=7)
            .map(|i| {
                NewCard::new(
                    &format!("Question {i}"),
                    &format!("Answer {i}"),
                    Some(&format!("para:{i}")),
                )
            })
            .collect();

        assert_eq!(store.add_cards(&cards).unwrap(), 7);

        let due = store.get_due_cards(far_future()).unwrap();
        assert_eq!(due.len(), 7);
        assert!(due.windows(2).all(|w| w[0].id < w[1].id));
        for (row, card) in due.iter().zip(&cards) {
            assert_eq!(row.question, card.question);
            assert_eq!(row.answer, card.answer);
        }
    }

    #[test]
    fn test_empty_batch() {
        let (_dir, store) = open_temp();
        assert_eq!(store.add_cards(&[]).unwrap(), 0);
    }

    #[test]
    fn test_rejected_row_aborts_batch() {
        let (_dir, store) = open_temp();
        let cards = vec![
            NewCard::new("Good", "Card", None),
            NewCard::new("", "Missing question", None),
        ];

        let err = store.add_cards(&cards).unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
        assert_eq!(store.get_stats(far_future()).unwrap().cards, 0);
    }

    #[test]
    fn test_due_selection() {
        let (_dir, store) = open_temp();
        store
            .add_cards(&[
                NewCard::new("never reviewed", "a", None),
                NewCard::new("due later", "b", None),
                NewCard::new("due already", "c", None),
            ])
            .unwrap();
        let ids: Vec<i64> = store
            .get_due_cards(at(1))
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();

        store
            .add_review_at(ids[1], q(4), 6, 2.5, at(20), at(1))
            .unwrap();
        store
            .add_review_at(ids[2], q(4), 1, 2.5, at(5), at(1))
            .unwrap();

        let due: Vec<i64> = store
            .get_due_cards(at(10))
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(due, vec![ids[0], ids[2]]);

        // Exactly at next_due_at counts as due
        let due: Vec<i64> = store
            .get_due_cards(at(20))
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(due, ids);

        // Never reviewed is due for any now
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        let due = store.get_due_cards(epoch).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, ids[0]);
    }

    #[test]
    fn test_only_latest_review_decides() {
        let (_dir, store) = open_temp();
        store.add_cards(&[NewCard::new("Q", "A", None)]).unwrap();
        let id = store.get_due_cards(at(1)).unwrap()[0].id;

        // Older review scheduled far out, newer lapse due soon
        store
            .add_review_at(id, q(5), 30, 2.6, at(31), at(1))
            .unwrap();
        store.add_review_at(id, q(1), 1, 2.4, at(3), at(2)).unwrap();
        assert_eq!(store.get_due_cards(at(4)).unwrap().len(), 1);

        // Inserted last but reviewed earlier: does not override
        store
            .add_review_at(id, q(5), 1, 2.5, at(28), at(1))
            .unwrap();
        assert_eq!(store.get_due_cards(at(4)).unwrap().len(), 1);

        let last = store.get_last_state(id).unwrap().unwrap();
        assert_eq!(last.interval, 1);
        assert!((last.ease - 2.4).abs() < 1e-9);
    }

    #[test]
    fn test_same_time_ties_break_on_id() {
        let (_dir, store) = open_temp();
        store.add_cards(&[NewCard::new("Q", "A", None)]).unwrap();
        let id = store.get_due_cards(at(1)).unwrap()[0].id;

        store.add_review_at(id, q(4), 1, 2.5, at(2), at(1)).unwrap();
        store.add_review_at(id, q(4), 6, 2.5, at(7), at(1)).unwrap();

        let last = store.get_last_state(id).unwrap().unwrap();
        assert_eq!(last.interval, 6);
        assert!(store.get_due_cards(at(3)).unwrap().is_empty());
    }

    #[test]
    fn test_last_state_absent_without_reviews() {
        let (_dir, store) = open_temp();
        store.add_cards(&[NewCard::new("Q", "A", None)]).unwrap();
        assert!(store.get_last_state(1).unwrap().is_none());
        assert!(store.get_review_state(1).unwrap().is_none());
    }

    #[test]
    fn test_review_state_counts_trailing_successes() {
        let (_dir, store) = open_temp();
        store.add_cards(&[NewCard::new("Q", "A", None)]).unwrap();
        let id = 1;

        store.add_review_at(id, q(4), 1, 2.5, at(2), at(1)).unwrap();
        store.add_review_at(id, q(2), 1, 2.3, at(3), at(2)).unwrap();
        store.add_review_at(id, q(4), 6, 2.3, at(9), at(3)).unwrap();
        store
            .add_review_at(id, q(5), 15, 2.4, at(24), at(9))
            .unwrap();

        let state = store.get_review_state(id).unwrap().unwrap();
        assert_eq!(state.interval, 15);
        assert!((state.ease - 2.4).abs() < 1e-9);
        assert_eq!(state.reps, 2);
    }

    #[test]
    fn test_review_for_missing_card_is_rejected() {
        let (_dir, store) = open_temp();
        let err = store
            .add_review(42, q(3), 1, 2.5, far_future())
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[test]
    fn test_out_of_range_timestamps_are_rejected() {
        let (_dir, store) = open_temp();
        store.add_cards(&[NewCard::new("Q", "A", None)]).unwrap();

        let beyond = time::latest() + Duration::days(1);
        let err = store
            .add_review_at(1, q(5), 100, 2.6, beyond, at(1))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp(_)));

        let err = store
            .add_review_at(1, q(5), 100, 2.6, at(2), beyond)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp(_)));

        // Nothing was written, the card stays new and its history readable
        assert!(store.get_history(1).unwrap().is_empty());
        assert_eq!(store.get_due_cards(at(1)).unwrap().len(), 1);

        // The latest storable instant sorts after everything else
        store
            .add_review_at(1, q(5), 100, 2.6, time::latest(), at(1))
            .unwrap();
        assert!(store.get_due_cards(far_future()).unwrap().is_empty());
        let history = store.get_history(1).unwrap();
        assert_eq!(history[0].next_due_at, time::latest());
    }

    #[test]
    fn test_long_streak_stays_scheduled() {
        let (_dir, store) = open_temp();
        store.add_cards(&[NewCard::new("Q", "A", None)]).unwrap();

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        for _ in 0..20 {
            let state = store.get_review_state(1).unwrap();
            let (next, due) = crate::srs::review_at(state.as_ref(), q(5), now);
            store
                .add_review_at(1, q(5), next.interval, next.ease, due, now)
                .unwrap();
        }

        assert!(store.get_due_cards(now).unwrap().is_empty());
        let history = store.get_history(1).unwrap();
        assert_eq!(history.len(), 20);
        assert!(time::to_iso(history[19].next_due_at).starts_with("2124-"));
    }

    #[test]
    fn test_column_defaults_are_canonical() {
        let (_dir, store) = open_temp();
        let before = time::now_utc();

        let conn = store.connect().unwrap();
        conn.execute("INSERT INTO cards (question, answer) VALUES ('Q', 'A')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO reviews (card_id, quality, interval, ease, next_due_at) \
             VALUES (1, 4, 1, 2.5, '2024-01-02T09:00:00+00:00')",
            [],
        )
        .unwrap();

        let card = store.get_card(1).unwrap().unwrap();
        assert!(card.created_at >= before);

        let history = store.get_history(1).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].reviewed_at >= before);
        assert!(time::to_iso(history[0].reviewed_at).ends_with("+00:00"));
    }

    #[test]
    fn test_history_and_stats() {
        let (_dir, store) = open_temp();
        store
            .add_cards(&[
                NewCard::new("Q1", "A1", None),
                NewCard::new("Q2", "A2", None),
            ])
            .unwrap();

        store.add_review_at(1, q(4), 6, 2.5, at(10), at(4)).unwrap();
        store.add_review_at(1, q(3), 1, 2.5, at(2), at(1)).unwrap();

        let history = store.get_history(1).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].reviewed_at, at(1));
        assert_eq!(history[1].quality, q(4));
        assert_eq!(history[1].next_due_at, at(10));

        let stats = store.get_stats(at(5)).unwrap();
        assert_eq!(stats.cards, 2);
        assert_eq!(stats.reviews, 2);
        assert_eq!(stats.reviewed_cards, 1);
        assert_eq!(stats.due, 1);

        let stats = store.get_stats(at(10) + Duration::seconds(1)).unwrap();
        assert_eq!(stats.due, 2);
    }
}
