//! Canonical timestamp representation
//!
//! Every timestamp that is stored or compared goes through this module:
//! UTC, whole seconds, RFC 3339 with an explicit `+00:00` offset. Strings in
//! this form sort lexicographically in chronological order, which is what the
//! due-card query relies on.

use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// 9999-12-31T23:59:59Z, the last instant with a four-digit year
const LATEST_SECS: i64 = 253_402_300_799;
/// 0000-01-01T00:00:00Z
const EARLIEST_SECS: i64 = -62_167_219_200;

/// Current UTC time truncated to whole seconds
pub fn now_utc() -> DateTime<Utc> {
    truncate(Utc::now())
}

/// Drop sub-second precision
pub fn truncate(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(0)
}

/// Format a timestamp in the canonical storage form
pub fn to_iso(ts: DateTime<Utc>) -> String {
    truncate(ts).to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Latest timestamp that can be stored
pub fn latest() -> DateTime<Utc> {
    DateTime::from_timestamp(LATEST_SECS, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Reject timestamps whose canonical form would not have a four-digit year
///
/// Outside that range RFC 3339 output gains a sign prefix and no longer
/// sorts with the rest.
pub fn ensure_storable(ts: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let secs = ts.timestamp();
    if (EARLIEST_SECS..=LATEST_SECS).contains(&secs) {
        Ok(ts)
    } else {
        Err(Error::InvalidTimestamp(to_iso(ts)))
    }
}

/// Parse any RFC 3339 timestamp into canonical UTC
pub fn parse_iso(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| truncate(ts.with_timezone(&Utc)))
        .map_err(|_| Error::InvalidTimestamp(s.to_string()))
}
