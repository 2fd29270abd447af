//! Timestamp helpers. Every persisted timestamp is UTC, RFC 3339.

use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::errors::ParsingError;

/// Current UTC instant. The only place either service calls into the
/// system clock directly — everything downstream takes a `OffsetDateTime`
/// so it stays testable.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub fn to_rfc3339(value: OffsetDateTime) -> Result<String, ParsingError> {
    value
        .format(&Rfc3339)
        .map_err(|_| ParsingError::CanonicalizationError)
}

pub fn from_rfc3339(value: &str) -> Result<OffsetDateTime, ParsingError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|_| ParsingError::CanonicalizationError)
}

/// Seconds between `now` and `since`; negative if `since` is in the future.
pub fn elapsed_secs(since: OffsetDateTime, now: OffsetDateTime) -> i64 {
    (now - since).whole_seconds()
}
