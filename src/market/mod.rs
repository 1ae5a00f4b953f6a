//! Market module for the 15-minute and 1-hour BTC up/down markets.
//!
//! This module handles:
//! - Market types and data structures
//! - Slug derivation from wall-clock time
//! - Market location (slug to outcome tokens)
//! - Polymarket API client
//! - Mock collaborators for testing

pub mod client;
pub mod locator;
pub mod mock;
pub mod slug;
pub mod types;

pub use client::PolymarketClient;
pub use locator::{MarketDirectory, MarketLocator};
pub use mock::{MockDirectory, MockExecutionService, MockOrderGateway, MockPriceSource, PlacedOrder};
pub use types::{Cadence, GammaMarket, MarketInstance, Outcome, TokenIds};
