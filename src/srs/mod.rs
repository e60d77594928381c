//! SM-2 style review scheduler
//!
//! Maps a card's previous review state and a recall quality score to the
//! next review state and due time. Everything here is pure apart from the
//! wall-clock read in [`review`].
//!
//! Quality ratings (0-5):
//! - 0-2: lapse, the card starts over at a one day interval
//! - 3: correct with serious difficulty
//! - 4: correct after hesitation
//! - 5: perfect recall

pub mod time;

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ease factor assigned to a card that has never been reviewed
pub const EASE_START: f64 = 2.5;
/// Lower bound for the ease factor
pub const EASE_MIN: f64 = 1.3;
/// Ease penalty applied on a lapse
pub const LAPSE_EASE_PENALTY: f64 = 0.2;
/// Qualities below this are lapses
pub const QUALITY_LAPSE_THRESHOLD: u8 = 3;
/// Highest accepted quality
pub const QUALITY_MAX: u8 = 5;
/// Interval after the first success, and after any lapse
pub const INTERVAL_FIRST: u32 = 1;
/// Interval after the second consecutive success
pub const INTERVAL_SECOND: u32 = 6;
/// Longest interval the scheduler hands out, in days
pub const INTERVAL_MAX: u32 = 36_500;

/// A recall quality score, guaranteed to be in `0..=5`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// Validate a raw score
    pub fn new(value: u8) -> Result<Self> {
        if value <= QUALITY_MAX {
            Ok(Self(value))
        } else {
            Err(Error::InvalidQuality(value.to_string()))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether this score resets the card's progress
    pub fn is_lapse(self) -> bool {
        self.0 < QUALITY_LAPSE_THRESHOLD
    }

    /// Every valid quality, lowest first
    pub fn all() -> impl Iterator<Item = Quality> {
        (0..=QUALITY_MAX).map(Quality)
    }
}

impl TryFrom<u8> for Quality {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<i64> for Quality {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        u8::try_from(value)
            .map_err(|_| Error::InvalidQuality(value.to_string()))
            .and_then(Self::new)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        trimmed
            .parse::<u8>()
            .map_err(|_| Error::InvalidQuality(trimmed.to_string()))
            .and_then(Self::new)
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scheduler working state for one card
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    /// Days until the next exposure; 0 means never successfully reviewed
    pub interval: u32,
    /// Interval multiplier, never below [`EASE_MIN`]
    pub ease: f64,
    /// Consecutive successful reviews
    pub reps: u32,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            interval: 0,
            ease: EASE_START,
            reps: 0,
        }
    }
}

impl ReviewState {
    /// Rebuild a state from persisted values
    pub fn new(interval: u32, ease: f64, reps: u32) -> Self {
        Self {
            interval,
            ease: ease.max(EASE_MIN),
            reps,
        }
    }
}

/// Ease adjustment for a successful review
///
/// `0.1` at quality 5, `0.0` at 4 and negative at 3.
pub fn ease_delta(quality: Quality) -> f64 {
    let miss = f64::from(QUALITY_MAX - quality.value());
    0.1 - miss * (0.08 + miss * 0.02)
}

/// Schedule the next review using the current wall clock
pub fn review(state: Option<&ReviewState>, quality: Quality) -> (ReviewState, DateTime<Utc>) {
    review_at(state, quality, time::now_utc())
}

/// Schedule the next review relative to `now`
///
/// The returned due time is `now` truncated to whole seconds plus the new
/// interval in days, clamped to [`time::latest`].
pub fn review_at(
    state: Option<&ReviewState>,
    quality: Quality,
    now: DateTime<Utc>,
) -> (ReviewState, DateTime<Utc>) {
    let prev = state.copied().unwrap_or_default();

    let next = if quality.is_lapse() {
        ReviewState {
            interval: INTERVAL_FIRST,
            ease: (prev.ease - LAPSE_EASE_PENALTY).max(EASE_MIN),
            reps: 0,
        }
    } else {
        let ease = (prev.ease + ease_delta(quality)).max(EASE_MIN);

        // Progression keys off the previous interval, not reps
        let interval = match prev.interval {
            0 => INTERVAL_FIRST,
            INTERVAL_FIRST => INTERVAL_SECOND,
            days => scale_interval(days, ease),
        };

        ReviewState {
            interval,
            ease,
            reps: prev.reps + 1,
        }
    };

    let latest = time::latest();
    let due = time::truncate(now)
        .checked_add_signed(Duration::days(i64::from(next.interval)))
        .map_or(latest, |due| due.min(latest));
    (next, due)
}

/// Intervals each quality would produce from `state`, indexed by quality
pub fn preview(state: Option<&ReviewState>) -> [u32; 6] {
    let now = time::now_utc();
    let mut intervals = [0; 6];
    for quality in Quality::all() {
        intervals[quality.value() as usize] = review_at(state, quality, now).0.interval;
    }
    intervals
}

fn scale_interval(days: u32, ease: f64) -> u32 {
    let scaled = (f64::from(days) * ease).round_ties_even();
    if scaled < 1.0 {
        1
    } else if scaled >= f64::from(INTERVAL_MAX) {
        INTERVAL_MAX
    } else {
        scaled as u32
    }
}

/// Human-readable interval, e.g. `6d`, `3w`, `2mo`
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{}d", days),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}
