//! BTC up/down relative-value bot for Polymarket.
//!
//! Every few seconds the bot resolves the current 15-minute market
//! (`btc-updown-15m-{ts}`) and the current 1-hour market
//! (`bitcoin-up-or-down-{month}-{day}-{hour}-et`) and trades two ways:
//!
//! - **Relative value**: the 15-minute and 1-hour Yes mids should agree.
//!   When they diverge by at least the open threshold, buy the cheap side
//!   of each market; when they converge within the close threshold, exit
//!   by buying the other outcome of each held leg.
//! - **Momentum**: in the last minutes of each 15-minute interval, buy the
//!   outcome with the higher bid, once per interval.
//!
//! ```text
//! 15m Yes mid:  0.70
//! 1h  Yes mid:  0.55
//! ─────────────────
//! signal:      +0.15 >= 0.08  →  buy 15m No + 1h Yes
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Slugs, market location and the Polymarket client
//! - [`quote`]: Bid/ask/mid per token
//! - [`strategy`]: Relative-value engine and momentum trade
//! - [`trading`]: Orders, signed submission and the order gateway
//! - [`runner`]: The control loop
//! - [`api`]: HTTP API for health/status/metrics
//! - [`utils`]: Shutdown handling

pub mod api;
pub mod config;
pub mod error;
pub mod market;
pub mod metrics;
pub mod quote;
pub mod runner;
pub mod signing;
pub mod strategy;
pub mod trading;
pub mod utils;

pub use config::Config;
pub use error::{BotError, Result};
