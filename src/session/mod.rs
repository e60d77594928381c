//! Interactive review session
//!
//! Walks through the cards due now: shows the question, reveals the answer
//! on Enter, reads a quality score and records the review. Input and output
//! are generic so the loop runs the same against a terminal or a test buffer.

use crate::srs::{self, time, Quality, QUALITY_MAX};
use crate::storage::{DueCard, Store};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{BufRead, Write};
use tracing::{debug, info};

/// Outcome of a review session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Cards reviewed and recorded
    pub reviewed: usize,
    /// Reviews that were lapses
    pub lapses: usize,
    /// Due cards left unreviewed because input ended
    pub remaining: usize,
}

/// A review session over one store
pub struct ReviewSession<'a, R, W> {
    store: &'a Store,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> ReviewSession<'a, R, W> {
    /// Create a new session
    pub fn new(store: &'a Store, input: R, output: W) -> Self {
        Self {
            store,
            input,
            output,
        }
    }

    /// Review the cards due at `now`, at most `limit` of them
    pub fn run(&mut self, now: DateTime<Utc>, limit: Option<usize>) -> Result<SessionSummary> {
        let mut due = self.store.get_due_cards(now)?;
        if let Some(limit) = limit {
            due.truncate(limit);
        }

        if due.is_empty() {
            writeln!(self.output, "🎉 No cards due. You're all caught up!")?;
            return Ok(SessionSummary::default());
        }

        writeln!(self.output, "{} card(s) due.\n", due.len())?;

        let mut summary = SessionSummary::default();
        for (i, card) in due.iter().enumerate() {
            match self.review_card(card)? {
                Some(quality) => {
                    summary.reviewed += 1;
                    if quality.is_lapse() {
                        summary.lapses += 1;
                    }
                }
                None => {
                    summary.remaining = due.len() - i;
                    writeln!(self.output, "\nInput closed, ending session.")?;
                    break;
                }
            }
        }

        info!(
            reviewed = summary.reviewed,
            lapses = summary.lapses,
            remaining = summary.remaining,
            "Review session finished"
        );
        Ok(summary)
    }

    /// Review one card; `None` when input ended first
    fn review_card(&mut self, card: &DueCard) -> Result<Option<Quality>> {
        writeln!(self.output, "Q: {}", card.question)?;
        write!(self.output, "Press Enter to reveal answer...")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        writeln!(self.output, "A: {}\n", card.answer)?;

        let state = self.store.get_review_state(card.id)?;
        debug!(card_id = card.id, ?state, "Resuming card state");

        let preview = srs::preview(state.as_ref());
        writeln!(
            self.output,
            "   0-2: {}  3: {}  4: {}  5: {}",
            srs::format_interval(preview[0]),
            srs::format_interval(preview[3]),
            srs::format_interval(preview[4]),
            srs::format_interval(preview[5]),
        )?;

        let quality = match self.read_quality()? {
            Some(quality) => quality,
            None => return Ok(None),
        };

        let (next, next_due) = srs::review(state.as_ref(), quality);
        self.store
            .add_review(card.id, quality, next.interval, next.ease, next_due)?;

        writeln!(
            self.output,
            "Next due in {} day(s) @ {}\n",
            next.interval,
            time::to_iso(next_due)
        )?;

        Ok(Some(quality))
    }

    /// Prompt until a valid quality is entered; `None` on end of input
    fn read_quality(&mut self) -> Result<Option<Quality>> {
        loop {
            write!(self.output, "Quality 0-{}: ", QUALITY_MAX)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }

            match line.parse::<Quality>() {
                Ok(quality) => return Ok(Some(quality)),
                Err(_) => writeln!(
                    self.output,
                    "Please enter a number between 0 and {}.",
                    QUALITY_MAX
                )?,
            }
        }
    }
}
