//! Polymarket HTTP client wrapper (Gamma directory, CLOB prices and orders).

use std::time::Instant;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::locator::MarketDirectory;
use super::types::GammaMarket;
use crate::config::{Config, Credentials};
use crate::error::{BotError, MarketError, TradingError};
use crate::metrics;
use crate::quote::{parse_price, PriceSource};
use crate::signing::{self, ApiCredentials, SignatureType};
use crate::trading::execution::submit_order;
use crate::trading::gateway::ExecutionService;
use crate::trading::order::{OrderParams, Side};

/// Polymarket API client.
#[derive(Clone)]
pub struct PolymarketClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL for CLOB API.
    clob_url: String,
    /// Base URL for Gamma API.
    gamma_url: String,
    /// Per-request timeout for price lookups.
    quote_timeout: std::time::Duration,
    /// Wallet private key.
    private_key: String,
    /// Funder (proxy wallet) address.
    funder: String,
    /// L2 API credentials.
    api_creds: ApiCredentials,
    /// Signature type of the funder wallet.
    signature_type: SignatureType,
    /// Chain ID (137 for Polygon).
    chain_id: u64,
}

/// Price response from the CLOB `/price` endpoint.
#[derive(Debug, Clone, Deserialize)]
struct PriceResponse {
    /// Price as string or number.
    #[serde(default)]
    price: serde_json::Value,
}

impl std::fmt::Debug for PolymarketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolymarketClient")
            .field("clob_url", &self.clob_url)
            .field("gamma_url", &self.gamma_url)
            .field("funder", &self.funder)
            .field("signature_type", &self.signature_type)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl PolymarketClient {
    /// Create a new Polymarket client from config.
    ///
    /// Fails if credentials are missing or the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, BotError> {
        let creds: Credentials = config.credentials()?;

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .connect_timeout(std::time::Duration::from_millis(1500))
            .tcp_nodelay(true)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            clob_url: config.clob_url.trim_end_matches('/').to_string(),
            gamma_url: config.gamma_url.trim_end_matches('/').to_string(),
            quote_timeout: config.quote_timeout(),
            private_key: creds.private_key,
            funder: creds.funder_address,
            api_creds: ApiCredentials {
                api_key: creds.api_key,
                api_secret: creds.api_secret,
                api_passphrase: creds.api_passphrase,
            },
            signature_type: config.signature_type(),
            chain_id: config.chain_id,
        })
    }

    /// Get the HTTP client reference.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Get the private key (for direct signing operations).
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Get the funder address.
    pub fn funder(&self) -> &str {
        &self.funder
    }

    /// Get the L2 API credentials.
    pub fn api_creds(&self) -> &ApiCredentials {
        &self.api_creds
    }

    /// Get the signature type.
    pub fn signature_type(&self) -> SignatureType {
        self.signature_type
    }

    /// Get the wallet address derived from the private key.
    pub fn get_address(&self) -> Result<String, TradingError> {
        signing::address_from_private_key(&self.private_key)
    }

    /// Get the CLOB base URL.
    pub fn clob_url(&self) -> &str {
        &self.clob_url
    }

    /// Get the Gamma base URL.
    pub fn gamma_url(&self) -> &str {
        &self.gamma_url
    }

    /// Get the chain ID.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Get the best price on one side of a token's book.
    #[instrument(skip(self), fields(token_id = %token_id, side = %side))]
    pub async fn get_price(&self, token_id: &str, side: Side) -> Result<Decimal, MarketError> {
        let start = Instant::now();
        let url = format!("{}/price", self.clob_url);
        let side_str = side.to_string();

        let response = self
            .http
            .get(&url)
            .query(&[("token_id", token_id), ("side", side_str.as_str())])
            .timeout(self.quote_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MarketError::FetchFailed {
                target: token_id.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let body: PriceResponse = response
            .json()
            .await
            .map_err(|e| MarketError::ParseError(format!("Failed to parse price: {}", e)))?;

        metrics::record_quote_fetch_latency(start);
        Ok(parse_price(&body.price))
    }

    /// Fetch a market record from the Gamma directory.
    #[instrument(skip(self))]
    pub async fn get_market_by_slug(&self, slug: &str) -> Result<Option<GammaMarket>, MarketError> {
        let url = format!("{}/markets/slug/{}", self.gamma_url, slug);

        let response = self.http.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(slug = %slug, "Directory returned 404");
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(MarketError::FetchFailed {
                target: slug.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let market: GammaMarket = response
            .json()
            .await
            .map_err(|e| MarketError::ParseError(format!("Failed to parse market: {}", e)))?;

        Ok(Some(market))
    }
}

impl MarketDirectory for PolymarketClient {
    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<GammaMarket>, MarketError> {
        self.get_market_by_slug(slug).await
    }
}

impl PriceSource for PolymarketClient {
    async fn fetch_price(&self, token_id: &str, side: Side) -> Result<Decimal, MarketError> {
        self.get_price(token_id, side).await
    }
}

impl ExecutionService for PolymarketClient {
    async fn post_order(&self, params: &OrderParams) -> Result<serde_json::Value, TradingError> {
        submit_order(self, params).await
    }
}
