//! Relative-value engine between the 15-minute and 1-hour markets.
//!
//! The engine compares the Yes mids of the two horizons. When the spread
//! is wide it buys the cheap side of each market, and when the spread
//! narrows it exits by buying the other outcome of each held leg. Both
//! transitions need both legs accepted; a single accepted leg is
//! surfaced as an [`UnreconciledLeg`] and never unwound automatically.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use strum::Display;
use tracing::{debug, info, instrument, warn};

use super::signal::{Direction, RvInputs, SkipReason};
use super::state::{Leg, RvPositionState};
use crate::config::Config;
use crate::metrics;
use crate::trading::{OrderGateway, OrderOutcome};

/// Tunables for the relative-value engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RvSettings {
    /// Open when `|signal| >= open_threshold`.
    pub open_threshold: Decimal,
    /// Close when `|signal| <= close_threshold`.
    pub close_threshold: Decimal,
    /// Minimum time between state changes.
    pub cooldown: TimeDelta,
    /// Shares per leg.
    pub leg_size: Decimal,
    /// Limit price per leg.
    pub limit_price: Decimal,
}

impl RvSettings {
    /// Settings from validated config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            open_threshold: config.rv_open_threshold,
            close_threshold: config.rv_close_threshold,
            cooldown: config.rv_cooldown(),
            leg_size: config.rv_leg_size,
            limit_price: config.buy_price,
        }
    }
}

/// Which transition a two-leg placement belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum RvPhase {
    /// Entering a paired position.
    Open,
    /// Leaving a paired position.
    Close,
}

/// Exactly one leg of a two-leg placement was accepted.
///
/// The accepted leg is real exposure the engine does not track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreconciledLeg {
    /// Transition being attempted.
    pub phase: RvPhase,
    /// The order that went through.
    pub accepted: Leg,
    /// The order that did not.
    pub rejected: Leg,
    /// Rejection reason of the failed order.
    pub reason: String,
}

/// What the engine wants to do this tick, before any order is placed.
#[derive(Debug, Clone, PartialEq)]
pub enum RvDecision {
    /// Inputs incomplete.
    Skip(SkipReason),
    /// A transition happened too recently.
    Cooldown {
        /// Current signal.
        signal: Decimal,
    },
    /// No transition warranted.
    Hold {
        /// Current signal.
        signal: Decimal,
    },
    /// Buy these two legs to open.
    Open {
        /// Current signal.
        signal: Decimal,
        /// Leg on the 15-minute market.
        short_leg: Leg,
        /// Leg on the 1-hour market.
        long_leg: Leg,
    },
    /// Buy these two orders to close.
    Close {
        /// Current signal.
        signal: Decimal,
        /// Flip of the held 15-minute leg.
        short_exit: Leg,
        /// Flip of the held 1-hour leg.
        long_exit: Leg,
    },
}

/// What happened on one engine step.
#[derive(Debug, Clone, PartialEq)]
pub enum RvOutcome {
    /// Inputs incomplete; nothing evaluated.
    Skipped(SkipReason),
    /// Blocked by cooldown.
    Cooldown,
    /// No transition warranted.
    Hold,
    /// Position opened.
    Opened,
    /// Open attempted but not completed; state unchanged.
    OpenFailed {
        /// Set when one leg was accepted.
        unreconciled: Option<UnreconciledLeg>,
    },
    /// Position closed.
    Closed,
    /// Close attempted but not completed; state unchanged.
    CloseFailed {
        /// Set when one leg was accepted.
        unreconciled: Option<UnreconciledLeg>,
    },
}

/// Relative-value engine.
#[derive(Debug, Clone)]
pub struct RelativeValueEngine {
    settings: RvSettings,
}

impl RelativeValueEngine {
    /// Create an engine.
    pub fn new(settings: RvSettings) -> Self {
        Self { settings }
    }

    /// Engine tunables.
    pub fn settings(&self) -> &RvSettings {
        &self.settings
    }

    /// Decide without placing orders or touching state.
    pub fn evaluate(
        &self,
        state: &RvPositionState,
        inputs: &RvInputs<'_>,
        now: DateTime<Utc>,
    ) -> RvDecision {
        let signal = match inputs.signal() {
            Ok(signal) => signal,
            Err(reason) => return RvDecision::Skip(reason),
        };
        let value = signal.value;

        if let Some(last) = state.last_action() {
            if now - last < self.settings.cooldown {
                return RvDecision::Cooldown { signal: value };
            }
        }

        match state.legs() {
            None => match Direction::of(value) {
                Some(direction) if value.abs() >= self.settings.open_threshold => {
                    let (short_outcome, long_outcome) = direction.outcomes();
                    RvDecision::Open {
                        signal: value,
                        short_leg: Leg::on(signal.short_market, short_outcome),
                        long_leg: Leg::on(signal.long_market, long_outcome),
                    }
                }
                _ => RvDecision::Hold { signal: value },
            },
            Some((short_leg, long_leg)) => {
                if value.abs() <= self.settings.close_threshold {
                    RvDecision::Close {
                        signal: value,
                        short_exit: short_leg.flipped(),
                        long_exit: long_leg.flipped(),
                    }
                } else {
                    RvDecision::Hold { signal: value }
                }
            }
        }
    }

    /// Evaluate, place orders if a transition is due, and update state.
    #[instrument(skip_all)]
    pub async fn step<G: OrderGateway>(
        &self,
        state: &mut RvPositionState,
        inputs: &RvInputs<'_>,
        now: DateTime<Utc>,
        gateway: &G,
    ) -> RvOutcome {
        match self.evaluate(state, inputs, now) {
            RvDecision::Skip(reason) => {
                debug!(reason = %reason, "RV skipped");
                RvOutcome::Skipped(reason)
            }
            RvDecision::Cooldown { signal } => {
                debug!(signal = %signal, "RV cooldown active");
                RvOutcome::Cooldown
            }
            RvDecision::Hold { signal } => {
                debug!(signal = %signal, is_open = state.is_open(), "RV hold");
                RvOutcome::Hold
            }
            RvDecision::Open {
                signal,
                short_leg,
                long_leg,
            } => {
                info!(
                    signal = %signal,
                    short = %short_leg.outcome,
                    long = %long_leg.outcome,
                    "RV opening paired position"
                );
                let (short_res, long_res) = self
                    .place_pair(gateway, &short_leg, &long_leg, "RV open")
                    .await;

                match (short_res.is_accepted(), long_res.is_accepted()) {
                    (true, true) => {
                        state.mark_open(short_leg, long_leg, now);
                        metrics::inc_rv_opens();
                        info!(signal = %signal, "RV position opened");
                        RvOutcome::Opened
                    }
                    _ => {
                        let unreconciled = unreconciled(
                            RvPhase::Open,
                            (&short_leg, &short_res),
                            (&long_leg, &long_res),
                        );
                        warn!(signal = %signal, "RV open failed, staying flat");
                        RvOutcome::OpenFailed { unreconciled }
                    }
                }
            }
            RvDecision::Close {
                signal,
                short_exit,
                long_exit,
            } => {
                info!(signal = %signal, "RV closing paired position");
                let (short_res, long_res) = self
                    .place_pair(gateway, &short_exit, &long_exit, "RV close")
                    .await;

                match (short_res.is_accepted(), long_res.is_accepted()) {
                    (true, true) => {
                        state.mark_closed(now);
                        metrics::inc_rv_closes();
                        info!(signal = %signal, "RV position closed");
                        RvOutcome::Closed
                    }
                    _ => {
                        let unreconciled = unreconciled(
                            RvPhase::Close,
                            (&short_exit, &short_res),
                            (&long_exit, &long_res),
                        );
                        warn!(signal = %signal, "RV close failed, position still open");
                        RvOutcome::CloseFailed { unreconciled }
                    }
                }
            }
        }
    }

    /// Place both legs in order; the second is sent whatever the first returned.
    async fn place_pair<G: OrderGateway>(
        &self,
        gateway: &G,
        short_leg: &Leg,
        long_leg: &Leg,
        label: &str,
    ) -> (OrderOutcome, OrderOutcome) {
        let short_res = gateway
            .place_limit_buy(
                &short_leg.token_id,
                self.settings.leg_size,
                self.settings.limit_price,
                &format!("{} 15m {}", label, short_leg.outcome),
            )
            .await;
        let long_res = gateway
            .place_limit_buy(
                &long_leg.token_id,
                self.settings.leg_size,
                self.settings.limit_price,
                &format!("{} 1h {}", label, long_leg.outcome),
            )
            .await;
        (short_res, long_res)
    }
}

/// Build and report the unreconciled event when exactly one leg went through.
fn unreconciled(
    phase: RvPhase,
    short: (&Leg, &OrderOutcome),
    long: (&Leg, &OrderOutcome),
) -> Option<UnreconciledLeg> {
    let (accepted, rejected, reason) = match (short.1, long.1) {
        (OrderOutcome::Accepted { .. }, OrderOutcome::Rejected { reason }) => {
            (short.0, long.0, reason)
        }
        (OrderOutcome::Rejected { reason }, OrderOutcome::Accepted { .. }) => {
            (long.0, short.0, reason)
        }
        _ => return None,
    };

    metrics::inc_rv_unreconciled_legs();
    warn!(
        phase = %phase,
        accepted_slug = %accepted.slug,
        accepted_token = %accepted.token_id,
        accepted_outcome = %accepted.outcome,
        rejected_slug = %rejected.slug,
        reason = %reason,
        "UNRECONCILED LEG: one order filled without its pair"
    );

    Some(UnreconciledLeg {
        phase,
        accepted: accepted.clone(),
        rejected: rejected.clone(),
        reason: reason.clone(),
    })
}
