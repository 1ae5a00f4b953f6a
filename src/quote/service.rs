//! Quote service: bid/ask/mid per token, never failing the caller.

use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::types::Quote;
use crate::error::MarketError;
use crate::trading::order::Side;

/// Best-price lookup for one side of a token's book.
///
/// `Side::Sell` yields the best bid, `Side::Buy` the best ask.
#[allow(async_fn_in_trait)]
pub trait PriceSource {
    /// Fetch the best price on `side` for `token_id`.
    async fn fetch_price(&self, token_id: &str, side: Side) -> Result<Decimal, MarketError>;
}

/// Wraps a [`PriceSource`] and normalizes every failure to the zero sentinel.
#[derive(Debug, Clone)]
pub struct QuoteService<P> {
    source: P,
}

impl<P: PriceSource> QuoteService<P> {
    /// Create a quote service over a price source.
    pub fn new(source: P) -> Self {
        Self { source }
    }

    /// Best bid for a token (0 if unavailable).
    pub async fn best_bid(&self, token_id: &str) -> Decimal {
        self.side_or_zero(token_id, Side::Sell).await
    }

    /// Best ask for a token (0 if unavailable).
    pub async fn best_ask(&self, token_id: &str) -> Decimal {
        self.side_or_zero(token_id, Side::Buy).await
    }

    /// Full quote for a token. Each side degrades independently.
    #[instrument(skip(self))]
    pub async fn get_quote(&self, token_id: &str) -> Quote {
        let bid = self.best_bid(token_id).await;
        let ask = self.best_ask(token_id).await;
        Quote::from_sides(bid, ask)
    }

    async fn side_or_zero(&self, token_id: &str, side: Side) -> Decimal {
        match self.source.fetch_price(token_id, side).await {
            Ok(price) => price,
            Err(e) => {
                debug!(token_id = %token_id, side = %side, error = %e, "Price unavailable");
                Decimal::ZERO
            }
        }
    }
}
