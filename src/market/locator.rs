//! Market locator: wall-clock time to a resolved market instance.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use super::slug::market_slug;
use super::types::{Cadence, GammaMarket, MarketInstance};
use crate::error::MarketError;

/// Lookup of market records by slug.
///
/// `Ok(None)` means the directory answered "not found".
#[allow(async_fn_in_trait)]
pub trait MarketDirectory {
    /// Fetch the market record for `slug`.
    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<GammaMarket>, MarketError>;
}

/// Resolves the active market instance for a cadence.
///
/// Nothing is cached: every call re-derives the slug from the reference time
/// and re-queries the directory, so bucket rollovers are picked up on the
/// next tick.
#[derive(Debug, Clone)]
pub struct MarketLocator<D> {
    directory: D,
}

impl<D: MarketDirectory> MarketLocator<D> {
    /// Create a locator over a directory.
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Resolve the market for `cadence` at `reference_time`.
    ///
    /// Directory failures, missing markets and malformed token pairs all
    /// resolve to `Ok(None)`. `Err` is reserved for a reference time that
    /// cannot be turned into a slug at all.
    #[instrument(skip(self, reference_time), fields(cadence = %cadence))]
    pub async fn resolve(
        &self,
        cadence: Cadence,
        reference_time: DateTime<Utc>,
    ) -> Result<Option<MarketInstance>, MarketError> {
        let slug = market_slug(cadence, reference_time)?;
        let bucket_start = cadence.bucket_start(reference_time.timestamp());

        match self.lookup(cadence, &slug, bucket_start).await {
            Ok(instance) => Ok(Some(instance)),
            Err(MarketError::NotFound { slug }) => {
                debug!(slug = %slug, "Market not active yet");
                Ok(None)
            }
            Err(e) => {
                warn!(slug = %slug, error = %e, "Market lookup failed, treating as not found");
                Ok(None)
            }
        }
    }

    async fn lookup(
        &self,
        cadence: Cadence,
        slug: &str,
        bucket_start: i64,
    ) -> Result<MarketInstance, MarketError> {
        let market = self
            .directory
            .fetch_by_slug(slug)
            .await?
            .ok_or_else(|| MarketError::NotFound {
                slug: slug.to_string(),
            })?;

        let (yes_token_id, no_token_id) = market.token_pair()?;

        Ok(MarketInstance {
            cadence,
            slug: slug.to_string(),
            yes_token_id,
            no_token_id,
            question: market.question.unwrap_or_else(|| slug.to_string()),
            bucket_start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::mock::MockDirectory;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        // 2025-10-19 19:31:40 UTC, 15m bucket 19:30:00
        Utc.with_ymd_and_hms(2025, 10, 19, 19, 31, 40).unwrap()
    }

    #[tokio::test]
    async fn resolves_fifteen_minute_market() {
        let directory = MockDirectory::new();
        let bucket = Cadence::FifteenMinute.bucket_start(reference().timestamp());
        let slug = format!("btc-updown-15m-{}", bucket);
        directory.insert_market(&slug, "Bitcoin Up or Down - 3:30PM ET", &["up", "down"]);

        let locator = MarketLocator::new(directory.clone());
        let market = locator
            .resolve(Cadence::FifteenMinute, reference())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(market.slug, slug);
        assert_eq!(market.yes_token_id, "up");
        assert_eq!(market.no_token_id, "down");
        assert_eq!(market.bucket_start, bucket);
        assert_eq!(market.question, "Bitcoin Up or Down - 3:30PM ET");
        assert_eq!(directory.lookups(), vec![slug]);
    }

    #[tokio::test]
    async fn resolves_hourly_market_with_encoded_token_ids() {
        let directory = MockDirectory::new();
        directory.insert_raw(
            "bitcoin-up-or-down-october-19-3pm-et",
            serde_json::json!({
                "question": "Bitcoin Up or Down - October 19, 3PM ET",
                "clobTokenIds": "[\"h-up\", \"h-down\"]"
            }),
        );

        let locator = MarketLocator::new(directory);
        let market = locator
            .resolve(Cadence::OneHour, reference())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(market.cadence, Cadence::OneHour);
        assert_eq!(market.yes_token_id, "h-up");
        assert_eq!(market.no_token_id, "h-down");
    }

    #[tokio::test]
    async fn not_found_and_failures_resolve_to_none() {
        let directory = MockDirectory::new();
        let locator = MarketLocator::new(directory.clone());
        assert!(locator
            .resolve(Cadence::FifteenMinute, reference())
            .await
            .unwrap()
            .is_none());

        directory.set_fail(true);
        assert!(locator
            .resolve(Cadence::OneHour, reference())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn wrong_token_count_is_not_found() {
        let directory = MockDirectory::new();
        directory.insert_market("bitcoin-up-or-down-october-19-3pm-et", "q", &["only-one"]);

        let locator = MarketLocator::new(directory);
        assert!(locator
            .resolve(Cadence::OneHour, reference())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn every_call_queries_the_directory() {
        let directory = MockDirectory::new();
        let locator = MarketLocator::new(directory.clone());

        let _ = locator.resolve(Cadence::FifteenMinute, reference()).await;
        let _ = locator.resolve(Cadence::FifteenMinute, reference()).await;

        assert_eq!(directory.lookups().len(), 2);
    }
}
