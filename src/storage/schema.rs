//! Database schema definition

/// SQL schema for the flashcard database
///
/// Timestamps are canonical UTC RFC 3339 strings. The application always
/// writes them; the column defaults produce the same form, never SQLite's
/// naive `CURRENT_TIMESTAMP`.
pub const SCHEMA: &str = r#"
-- Study material, immutable once inserted
CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question TEXT NOT NULL CHECK (length(question) > 0),
    answer TEXT NOT NULL CHECK (length(answer) > 0),
    source_ref TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%S+00:00', 'now'))
);

-- Append-only review log
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    card_id INTEGER NOT NULL,
    quality INTEGER NOT NULL CHECK (quality BETWEEN 0 AND 5),
    interval INTEGER NOT NULL CHECK (interval >= 0),
    ease REAL NOT NULL,
    next_due_at TEXT NOT NULL,
    reviewed_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%S+00:00', 'now')),
    FOREIGN KEY (card_id) REFERENCES cards(id)
);

CREATE INDEX IF NOT EXISTS idx_reviews_card_latest ON reviews(card_id, reviewed_at, id);
CREATE INDEX IF NOT EXISTS idx_reviews_next_due ON reviews(next_due_at);
"#;

/// Per-connection settings, applied every time a connection is opened
pub const CONNECTION_PRAGMAS: &str = r#"
PRAGMA foreign_keys = ON;
"#;
