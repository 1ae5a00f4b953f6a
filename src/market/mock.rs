//! Mock Polymarket collaborators for unit testing.
//!
//! These implement the directory, price-source, execution-service and
//! gateway seams without making network requests. Each mock is cheap to
//! clone and clones share state, so a test can hand one copy to the code
//! under test and inspect another.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;

use super::locator::MarketDirectory;
use super::types::GammaMarket;
use crate::error::{MarketError, TradingError};
use crate::quote::PriceSource;
use crate::trading::gateway::{ExecutionService, OrderGateway, OrderOutcome};
use crate::trading::order::{OrderParams, Side};

/// Mock market directory keyed by slug.
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
    markets: Arc<Mutex<HashMap<String, serde_json::Value>>>,
    lookups: Arc<Mutex<Vec<String>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockDirectory {
    /// Create an empty directory (every lookup is "not found").
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a market with a native token-id array.
    pub fn insert_market(&self, slug: &str, question: &str, token_ids: &[&str]) {
        self.insert_raw(
            slug,
            serde_json::json!({
                "slug": slug,
                "question": question,
                "clobTokenIds": token_ids,
            }),
        );
    }

    /// Register an arbitrary JSON record.
    pub fn insert_raw(&self, slug: &str, record: serde_json::Value) {
        self.markets.lock().unwrap().insert(slug.to_string(), record);
    }

    /// Remove every registered market.
    pub fn clear(&self) {
        self.markets.lock().unwrap().clear();
    }

    /// Make every lookup fail with a transport-style error.
    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// Slugs looked up so far, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl MarketDirectory for MockDirectory {
    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<GammaMarket>, MarketError> {
        self.lookups.lock().unwrap().push(slug.to_string());

        if *self.fail.lock().unwrap() {
            return Err(MarketError::FetchFailed {
                target: slug.to_string(),
                reason: "Mock directory failure".to_string(),
            });
        }

        match self.markets.lock().unwrap().get(slug) {
            Some(record) => serde_json::from_value(record.clone())
                .map(Some)
                .map_err(|e| MarketError::ParseError(e.to_string())),
            None => Ok(None),
        }
    }
}

/// Mock price endpoint keyed by (token, side).
#[derive(Debug, Clone, Default)]
pub struct MockPriceSource {
    prices: Arc<Mutex<HashMap<(String, Side), Decimal>>>,
    failing: Arc<Mutex<Vec<String>>>,
}

impl MockPriceSource {
    /// Create a source with no prices (every request fails).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bid (side=SELL) and ask (side=BUY) for a token.
    pub fn set_book(&self, token_id: &str, bid: Decimal, ask: Decimal) {
        let mut prices = self.prices.lock().unwrap();
        prices.insert((token_id.to_string(), Side::Sell), bid);
        prices.insert((token_id.to_string(), Side::Buy), ask);
    }

    /// Make requests for this token fail.
    pub fn fail_token(&self, token_id: &str) {
        self.failing.lock().unwrap().push(token_id.to_string());
    }
}

impl PriceSource for MockPriceSource {
    async fn fetch_price(&self, token_id: &str, side: Side) -> Result<Decimal, MarketError> {
        if self.failing.lock().unwrap().iter().any(|t| t == token_id) {
            return Err(MarketError::FetchFailed {
                target: token_id.to_string(),
                reason: "Mock price failure".to_string(),
            });
        }

        self.prices
            .lock()
            .unwrap()
            .get(&(token_id.to_string(), side))
            .copied()
            .ok_or_else(|| MarketError::FetchFailed {
                target: token_id.to_string(),
                reason: "no mock price".to_string(),
            })
    }
}

/// Order recorded by a mock gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    /// Token bought.
    pub token_id: String,
    /// Shares.
    pub size: Decimal,
    /// Limit price.
    pub price: Decimal,
    /// Caller-supplied label.
    pub label: String,
}

/// Mock order gateway with scripted outcomes.
///
/// Outcomes are consumed in order; once the script runs out every order
/// is accepted.
#[derive(Debug, Clone, Default)]
pub struct MockOrderGateway {
    script: Arc<Mutex<VecDeque<OrderOutcome>>>,
    placed: Arc<Mutex<Vec<PlacedOrder>>>,
}

impl MockOrderGateway {
    /// Create a gateway that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gateway answering with `outcomes` in order.
    pub fn scripted(outcomes: impl IntoIterator<Item = OrderOutcome>) -> Self {
        let gateway = Self::default();
        gateway.script.lock().unwrap().extend(outcomes);
        gateway
    }

    /// Orders placed so far.
    pub fn placed(&self) -> Vec<PlacedOrder> {
        self.placed.lock().unwrap().clone()
    }
}

impl OrderGateway for MockOrderGateway {
    async fn place_limit_buy(
        &self,
        token_id: &str,
        size: Decimal,
        price: Decimal,
        label: &str,
    ) -> OrderOutcome {
        let mut placed = self.placed.lock().unwrap();
        placed.push(PlacedOrder {
            token_id: token_id.to_string(),
            size,
            price,
            label: label.to_string(),
        });
        let n = placed.len();

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| OrderOutcome::Accepted {
                order_id: Some(format!("mock-{}", n)),
            })
    }
}

/// Mock execution service returning canned responses.
#[derive(Debug, Clone, Default)]
pub struct MockExecutionService {
    responses: Arc<Mutex<VecDeque<Result<serde_json::Value, String>>>>,
}

impl MockExecutionService {
    /// Create a service answering with `responses` in order (`Err` = transport failure).
    pub fn new(responses: impl IntoIterator<Item = Result<serde_json::Value, String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().collect())),
        }
    }
}

impl ExecutionService for MockExecutionService {
    async fn post_order(&self, _params: &OrderParams) -> Result<serde_json::Value, TradingError> {
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(body)) => Ok(body),
            Some(Err(reason)) => Err(TradingError::SubmissionFailed(reason)),
            None => Err(TradingError::SubmissionFailed("no mock response".to_string())),
        }
    }
}
