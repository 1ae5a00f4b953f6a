//! Trading strategies.
//!
//! - [`relative_value`]: paired 15-minute vs 1-hour spread trade
//! - [`momentum`]: once-per-interval late buy on the 15-minute market

pub mod momentum;
pub mod relative_value;
pub mod signal;
pub mod state;

pub use momentum::{MomentumDecision, MomentumOutcome, MomentumSettings, MomentumTrader};
pub use relative_value::{
    RelativeValueEngine, RvDecision, RvOutcome, RvPhase, RvSettings, UnreconciledLeg,
};
pub use signal::{compute_signal, Direction, RvInputs, Signal, SkipReason};
pub use state::{BotState, Leg, MomentumTradeState, RvPositionState, RvSnapshot};
