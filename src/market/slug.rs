//! Deterministic slug derivation for each cadence.
//!
//! The hourly slug reproduces Polymarket's naming exactly, e.g.
//! `bitcoin-up-or-down-october-19-3pm-et`. Any drift in case, padding or
//! the 12-hour conversion makes the directory lookup miss.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::America::New_York;

use super::types::Cadence;
use crate::error::MarketError;

/// Prefix of the 15-minute series.
pub const FIFTEEN_MINUTE_PREFIX: &str = "btc-updown-15m";

/// Prefix of the 1-hour series.
pub const HOURLY_PREFIX: &str = "bitcoin-up-or-down";

/// Slug of the 15-minute market whose window starts at `bucket_start`.
pub fn fifteen_minute_slug(bucket_start: i64) -> String {
    format!("{}-{}", FIFTEEN_MINUTE_PREFIX, bucket_start)
}

/// Slug of the 1-hour market containing `reference`.
pub fn hourly_slug(reference: DateTime<Utc>) -> String {
    let et = reference.with_timezone(&New_York);
    let month = et.format("%B").to_string().to_lowercase();
    let (is_pm, hour12) = et.hour12();

    format!(
        "{}-{}-{}-{}{}-et",
        HOURLY_PREFIX,
        month,
        et.format("%-d"),
        hour12,
        if is_pm { "pm" } else { "am" }
    )
}

/// Slug of the active market for `cadence` at `reference`.
pub fn market_slug(cadence: Cadence, reference: DateTime<Utc>) -> Result<String, MarketError> {
    let ts = reference.timestamp();
    if ts < 0 {
        return Err(MarketError::InvalidReferenceTime(ts));
    }

    Ok(match cadence {
        Cadence::FifteenMinute => fifteen_minute_slug(cadence.bucket_start(ts)),
        Cadence::OneHour => hourly_slug(reference),
    })
}
