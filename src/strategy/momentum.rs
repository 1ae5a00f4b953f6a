//! Late-interval momentum trade on the 15-minute market.
//!
//! In the final minutes of each 15-minute interval, buy whichever outcome
//! the book currently favours, at most once per interval.

use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use super::state::MomentumTradeState;
use crate::config::Config;
use crate::market::{MarketInstance, Outcome};
use crate::metrics;
use crate::trading::{OrderGateway, OrderOutcome};

/// Seconds in one momentum interval.
pub const INTERVAL_SECONDS: i64 = 900;

/// Tunables for the momentum trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MomentumSettings {
    /// Trade only when this many minutes or fewer remain.
    pub window_minutes: u32,
    /// Shares per order.
    pub size: Decimal,
    /// Limit price.
    pub limit_price: Decimal,
}

impl MomentumSettings {
    /// Settings from validated config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            window_minutes: config.buy_in_last_minutes,
            size: config.shares_to_buy,
            limit_price: config.buy_price,
        }
    }
}

/// Absolute 15-minute interval index of a unix timestamp.
pub fn interval_index(unix_ts: i64) -> i64 {
    unix_ts.div_euclid(INTERVAL_SECONDS)
}

/// Whole minutes elapsed in the current 15-minute interval (0..=14).
pub fn minute_in_interval(unix_ts: i64) -> i64 {
    unix_ts.rem_euclid(INTERVAL_SECONDS) / 60
}

/// What the momentum trade wants to do this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MomentumDecision {
    /// Too early in the interval.
    OutsideWindow {
        /// Minute within the interval.
        minute: i64,
    },
    /// Already traded this interval.
    AlreadyTraded {
        /// Interval index.
        interval: i64,
    },
    /// Bids are equal (including both unavailable).
    Tie,
    /// Buy this outcome.
    Buy {
        /// Interval index.
        interval: i64,
        /// Outcome with the higher bid.
        outcome: Outcome,
        /// Its bid.
        bid: Decimal,
    },
}

/// What happened on one momentum step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MomentumOutcome {
    /// Nothing attempted.
    Idle(MomentumDecision),
    /// Order accepted; interval recorded.
    Bought {
        /// Outcome bought.
        outcome: Outcome,
        /// Interval index recorded.
        interval: i64,
    },
    /// Order rejected; may retry later in the same interval.
    Rejected {
        /// Rejection reason.
        reason: String,
    },
}

/// Momentum trader.
#[derive(Debug, Clone)]
pub struct MomentumTrader {
    settings: MomentumSettings,
}

impl MomentumTrader {
    /// Create a trader.
    pub fn new(settings: MomentumSettings) -> Self {
        Self { settings }
    }

    /// Decide from the interval clock and both bids.
    pub fn evaluate(
        &self,
        state: &MomentumTradeState,
        now_ts: i64,
        yes_bid: Decimal,
        no_bid: Decimal,
    ) -> MomentumDecision {
        let minute = minute_in_interval(now_ts);
        if minute < 15 - i64::from(self.settings.window_minutes) {
            return MomentumDecision::OutsideWindow { minute };
        }

        let interval = interval_index(now_ts);
        if state.last_traded_interval == Some(interval) {
            return MomentumDecision::AlreadyTraded { interval };
        }

        if yes_bid > no_bid {
            MomentumDecision::Buy {
                interval,
                outcome: Outcome::Yes,
                bid: yes_bid,
            }
        } else if no_bid > yes_bid {
            MomentumDecision::Buy {
                interval,
                outcome: Outcome::No,
                bid: no_bid,
            }
        } else {
            MomentumDecision::Tie
        }
    }

    /// Evaluate, place the order if due, and record the interval on acceptance.
    #[instrument(skip_all, fields(slug = %market.slug))]
    pub async fn step<G: OrderGateway>(
        &self,
        state: &mut MomentumTradeState,
        market: &MarketInstance,
        now_ts: i64,
        yes_bid: Decimal,
        no_bid: Decimal,
        gateway: &G,
    ) -> MomentumOutcome {
        let (interval, outcome, bid) = match self.evaluate(state, now_ts, yes_bid, no_bid) {
            MomentumDecision::Buy {
                interval,
                outcome,
                bid,
            } => (interval, outcome, bid),
            idle => {
                debug!(decision = ?idle, "Momentum idle");
                return MomentumOutcome::Idle(idle);
            }
        };

        info!(
            outcome = %outcome,
            bid = %bid,
            yes_bid = %yes_bid,
            no_bid = %no_bid,
            "Momentum buy"
        );

        let label = format!("Momentum 15m {}", outcome);
        match gateway
            .place_limit_buy(
                market.token_id(outcome),
                self.settings.size,
                self.settings.limit_price,
                &label,
            )
            .await
        {
            OrderOutcome::Accepted { .. } => {
                state.last_traded_interval = Some(interval);
                metrics::inc_momentum_trades();
                MomentumOutcome::Bought { outcome, interval }
            }
            OrderOutcome::Rejected { reason } => MomentumOutcome::Rejected { reason },
        }
    }
}
