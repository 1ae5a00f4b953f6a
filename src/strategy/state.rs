//! Strategy state owned by the control loop.
//!
//! Nothing here is persisted; a restart begins flat.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::market::{MarketInstance, Outcome};

/// One held side of a paired position.
///
/// Carries both token ids of its market so the close can buy the other
/// outcome even after that market has rolled off the current window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leg {
    /// Market the leg was bought on.
    pub slug: String,
    /// Outcome held.
    pub outcome: Outcome,
    /// Token of the held outcome.
    pub token_id: String,
    /// Token of the other outcome on the same market.
    pub opposite_token_id: String,
}

impl Leg {
    /// Leg holding `outcome` on `market`.
    pub fn on(market: &MarketInstance, outcome: Outcome) -> Self {
        Self {
            slug: market.slug.clone(),
            outcome,
            token_id: market.token_id(outcome).to_string(),
            opposite_token_id: market.token_id(outcome.opposite()).to_string(),
        }
    }

    /// The same market with the other outcome.
    pub fn flipped(&self) -> Self {
        Self {
            slug: self.slug.clone(),
            outcome: self.outcome.opposite(),
            token_id: self.opposite_token_id.clone(),
            opposite_token_id: self.token_id.clone(),
        }
    }
}

/// Paired relative-value position.
///
/// Both legs are present exactly when the position is open; the pair is
/// stored as one `Option` so no other combination can be represented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RvPositionState {
    legs: Option<(Leg, Leg)>,
    last_action: Option<DateTime<Utc>>,
}

/// Serializable view of [`RvPositionState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RvSnapshot {
    /// Whether a paired position is held.
    pub is_open: bool,
    /// Leg on the 15-minute market.
    pub short_leg: Option<Leg>,
    /// Leg on the 1-hour market.
    pub long_leg: Option<Leg>,
    /// Time of the last open or close.
    pub last_action: Option<DateTime<Utc>>,
}

impl RvPositionState {
    /// A flat position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a paired position is held.
    pub fn is_open(&self) -> bool {
        self.legs.is_some()
    }

    /// Leg on the 15-minute market.
    pub fn short_leg(&self) -> Option<&Leg> {
        self.legs.as_ref().map(|(short, _)| short)
    }

    /// Leg on the 1-hour market.
    pub fn long_leg(&self) -> Option<&Leg> {
        self.legs.as_ref().map(|(_, long)| long)
    }

    /// Both legs, if open.
    pub fn legs(&self) -> Option<(&Leg, &Leg)> {
        self.legs.as_ref().map(|(short, long)| (short, long))
    }

    /// Time of the last open or close.
    pub fn last_action(&self) -> Option<DateTime<Utc>> {
        self.last_action
    }

    /// Record a completed open.
    pub(crate) fn mark_open(&mut self, short_leg: Leg, long_leg: Leg, now: DateTime<Utc>) {
        self.legs = Some((short_leg, long_leg));
        self.last_action = Some(now);
    }

    /// Record a completed close.
    pub(crate) fn mark_closed(&mut self, now: DateTime<Utc>) {
        self.legs = None;
        self.last_action = Some(now);
    }

    /// Serializable copy for the status API.
    pub fn snapshot(&self) -> RvSnapshot {
        RvSnapshot {
            is_open: self.is_open(),
            short_leg: self.short_leg().cloned(),
            long_leg: self.long_leg().cloned(),
            last_action: self.last_action,
        }
    }
}

/// Once-per-interval guard for the momentum trade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MomentumTradeState {
    /// Absolute 15-minute interval index (`unix_ts / 900`) of the last
    /// accepted momentum order.
    pub last_traded_interval: Option<i64>,
}

/// All mutable strategy state, owned by the runner.
#[derive(Debug, Clone, Default)]
pub struct BotState {
    /// Relative-value position.
    pub rv: RvPositionState,
    /// Momentum trade guard.
    pub momentum: MomentumTradeState,
}
