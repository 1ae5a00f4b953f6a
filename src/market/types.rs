//! Market-related types for the 15-minute and 1-hour BTC up/down markets.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::MarketError;

/// Recurrence period of a market series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Cadence {
    /// `btc-updown-15m-{ts}` markets.
    #[strum(serialize = "15m")]
    FifteenMinute,
    /// `bitcoin-up-or-down-{month}-{day}-{hour}-et` markets.
    #[strum(serialize = "1h")]
    OneHour,
}

impl Cadence {
    /// Window length in seconds.
    pub const fn window_seconds(self) -> i64 {
        match self {
            Cadence::FifteenMinute => 900,
            Cadence::OneHour => 3600,
        }
    }

    /// Start of the window containing `unix_ts`.
    ///
    /// The hourly bucket is aligned to UTC hours, which coincide with
    /// New York hours because that zone only uses whole-hour offsets.
    pub fn bucket_start(self, unix_ts: i64) -> i64 {
        let w = self.window_seconds();
        unix_ts.div_euclid(w) * w
    }
}

/// Binary outcome of a market (the side a leg holds).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// BTC goes up (first token).
    #[strum(to_string = "YES", serialize = "yes", serialize = "up", serialize = "UP")]
    #[default]
    Yes,
    /// BTC goes down (second token).
    #[strum(to_string = "NO", serialize = "no", serialize = "down", serialize = "DOWN")]
    No,
}

impl Outcome {
    /// Get the opposite outcome.
    pub fn opposite(&self) -> Self {
        match self {
            Outcome::Yes => Outcome::No,
            Outcome::No => Outcome::Yes,
        }
    }
}

/// One resolved, time-boxed market instance.
///
/// Built fresh on every tick and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketInstance {
    /// Series this instance belongs to.
    pub cadence: Cadence,
    /// Deterministic slug used for the directory lookup.
    pub slug: String,
    /// Up (YES) token ID for CLOB.
    pub yes_token_id: String,
    /// Down (NO) token ID for CLOB.
    pub no_token_id: String,
    /// Market question text (display label).
    pub question: String,
    /// Unix timestamp of the window start.
    pub bucket_start: i64,
}

impl MarketInstance {
    /// Get the token ID for a given outcome.
    pub fn token_id(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::Yes => &self.yes_token_id,
            Outcome::No => &self.no_token_id,
        }
    }

    /// Unix timestamp when the window closes.
    pub fn end_timestamp(&self) -> i64 {
        self.bucket_start + self.cadence.window_seconds()
    }

    /// Seconds left in the window at `now_ts`, or `None` once closed.
    pub fn seconds_remaining(&self, now_ts: i64) -> Option<i64> {
        let remaining = self.end_timestamp() - now_ts;
        (remaining > 0).then_some(remaining)
    }
}

/// Market record as returned by the Gamma directory.
#[derive(Debug, Clone, Deserialize)]
pub struct GammaMarket {
    /// Market slug.
    pub slug: Option<String>,
    /// Market question.
    pub question: Option<String>,
    /// CLOB token IDs.
    #[serde(rename = "clobTokenIds", default)]
    pub clob_token_ids: Option<TokenIds>,
    /// Whether market is closed.
    pub closed: Option<bool>,
}

/// `clobTokenIds` arrives either as a JSON-encoded string or a native array.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TokenIds {
    /// `["123", "456"]`
    Native(Vec<String>),
    /// `"[\"123\", \"456\"]"`
    Encoded(String),
}

impl TokenIds {
    /// Decode into a list of token identifiers.
    pub fn decode(&self) -> Result<Vec<String>, MarketError> {
        match self {
            TokenIds::Native(ids) => Ok(ids.clone()),
            TokenIds::Encoded(raw) => serde_json::from_str(raw).map_err(|e| {
                MarketError::ParseError(format!("clobTokenIds is not a JSON array: {}", e))
            }),
        }
    }
}

impl GammaMarket {
    /// Decode the outcome pair, requiring exactly two ids.
    pub fn token_pair(&self) -> Result<(String, String), MarketError> {
        let ids = match &self.clob_token_ids {
            Some(ids) => ids.decode()?,
            None => Vec::new(),
        };

        match <[String; 2]>::try_from(ids) {
            Ok([yes, no]) => Ok((yes, no)),
            Err(ids) => Err(MarketError::ParseError(format!(
                "Expected 2 token IDs, got {}",
                ids.len()
            ))),
        }
    }
}
