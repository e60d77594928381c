//! learn - local-first spaced-repetition flashcards
//!
//! This library provides the scheduling engine, the SQLite review store and
//! the collaborators around them: text extraction, card generation and the
//! interactive review session.

pub mod cards;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod session;
pub mod srs;
pub mod storage;

/// Re-export commonly used types
pub use cards::{CardGenerator, FallbackGenerator, HeuristicGenerator, LlmGenerator};
pub use error::{Error, Result};
pub use srs::{review, Quality, ReviewState};
pub use storage::{Card, DueCard, NewCard, ReviewRecord, Store};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "learn";
