//! Relative-value signal and its input guard.

use rust_decimal::Decimal;
use serde::Serialize;
use strum::Display;

use crate::market::{MarketInstance, Outcome};

/// Why a tick produced no signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// The 15-minute market could not be resolved.
    ShortMarketMissing,
    /// The 1-hour market could not be resolved.
    LongMarketMissing,
    /// The 15-minute Yes mid is the zero sentinel.
    ShortQuoteUnavailable,
    /// The 1-hour Yes mid is the zero sentinel.
    LongQuoteUnavailable,
}

/// Per-tick inputs to the relative-value engine.
#[derive(Debug, Clone, Copy)]
pub struct RvInputs<'a> {
    /// Current 15-minute market, if resolved.
    pub short_market: Option<&'a MarketInstance>,
    /// Current 1-hour market, if resolved.
    pub long_market: Option<&'a MarketInstance>,
    /// Mid of the 15-minute Yes token.
    pub short_mid: Decimal,
    /// Mid of the 1-hour Yes token.
    pub long_mid: Decimal,
}

/// A signal computed from fully available inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal<'a> {
    /// 15-minute market.
    pub short_market: &'a MarketInstance,
    /// 1-hour market.
    pub long_market: &'a MarketInstance,
    /// `short_mid - long_mid`.
    pub value: Decimal,
}

/// Which side of the spread is rich.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum Direction {
    /// Short horizon priced above long: buy short No and long Yes.
    ShortRich,
    /// Short horizon priced below long: buy short Yes and long No.
    LongRich,
}

impl Direction {
    /// Direction of a non-zero signal.
    pub fn of(signal: Decimal) -> Option<Self> {
        if signal > Decimal::ZERO {
            Some(Direction::ShortRich)
        } else if signal < Decimal::ZERO {
            Some(Direction::LongRich)
        } else {
            None
        }
    }

    /// Outcomes to buy on (short market, long market).
    pub fn outcomes(self) -> (Outcome, Outcome) {
        match self {
            Direction::ShortRich => (Outcome::No, Outcome::Yes),
            Direction::LongRich => (Outcome::Yes, Outcome::No),
        }
    }
}

/// `short_mid - long_mid`.
pub fn compute_signal(short_mid: Decimal, long_mid: Decimal) -> Decimal {
    short_mid - long_mid
}

impl<'a> RvInputs<'a> {
    /// Apply the guard and compute the signal.
    ///
    /// Missing markets are reported before unavailable quotes.
    pub fn signal(&self) -> Result<Signal<'a>, SkipReason> {
        let short_market = self.short_market.ok_or(SkipReason::ShortMarketMissing)?;
        let long_market = self.long_market.ok_or(SkipReason::LongMarketMissing)?;

        if self.short_mid <= Decimal::ZERO {
            return Err(SkipReason::ShortQuoteUnavailable);
        }
        if self.long_mid <= Decimal::ZERO {
            return Err(SkipReason::LongQuoteUnavailable);
        }

        Ok(Signal {
            short_market,
            long_market,
            value: compute_signal(self.short_mid, self.long_mid),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Cadence;
    use rust_decimal_macros::dec;

    fn market(cadence: Cadence) -> MarketInstance {
        MarketInstance {
            cadence,
            slug: format!("slug-{}", cadence),
            yes_token_id: "yes".to_string(),
            no_token_id: "no".to_string(),
            question: "q".to_string(),
            bucket_start: 0,
        }
    }

    #[test]
    fn signal_is_difference_of_mids() {
        assert_eq!(compute_signal(dec!(0.70), dec!(0.55)), dec!(0.15));
        assert_eq!(compute_signal(dec!(0.45), dec!(0.55)), dec!(-0.10));
    }

    #[test]
    fn signal_stays_within_unit_range() {
        let mids = [dec!(0.01), dec!(0.25), dec!(0.5), dec!(0.75), dec!(0.99), dec!(1)];
        for a in mids {
            for b in mids {
                let s = compute_signal(a, b);
                assert!(s >= dec!(-1) && s <= dec!(1), "signal {} out of range", s);
            }
        }
    }

    #[test]
    fn guard_reports_first_missing_input() {
        let short = market(Cadence::FifteenMinute);
        let long = market(Cadence::OneHour);

        let inputs = RvInputs {
            short_market: None,
            long_market: None,
            short_mid: Decimal::ZERO,
            long_mid: Decimal::ZERO,
        };
        assert_eq!(inputs.signal(), Err(SkipReason::ShortMarketMissing));

        let inputs = RvInputs {
            short_market: Some(&short),
            ..inputs
        };
        assert_eq!(inputs.signal(), Err(SkipReason::LongMarketMissing));

        let inputs = RvInputs {
            long_market: Some(&long),
            long_mid: dec!(0.5),
            ..inputs
        };
        assert_eq!(inputs.signal(), Err(SkipReason::ShortQuoteUnavailable));

        let inputs = RvInputs {
            short_mid: dec!(0.6),
            long_mid: Decimal::ZERO,
            ..inputs
        };
        assert_eq!(inputs.signal(), Err(SkipReason::LongQuoteUnavailable));
    }

    #[test]
    fn guard_passes_complete_inputs() {
        let short = market(Cadence::FifteenMinute);
        let long = market(Cadence::OneHour);
        let inputs = RvInputs {
            short_market: Some(&short),
            long_market: Some(&long),
            short_mid: dec!(0.70),
            long_mid: dec!(0.55),
        };

        let signal = inputs.signal().unwrap();
        assert_eq!(signal.value, dec!(0.15));
        assert_eq!(signal.short_market.cadence, Cadence::FifteenMinute);
    }

    #[test]
    fn direction_picks_legs() {
        assert_eq!(Direction::of(dec!(0.1)), Some(Direction::ShortRich));
        assert_eq!(Direction::of(dec!(-0.1)), Some(Direction::LongRich));
        assert_eq!(Direction::of(Decimal::ZERO), None);
        assert_eq!(Direction::ShortRich.outcomes(), (Outcome::No, Outcome::Yes));
        assert_eq!(Direction::LongRich.outcomes(), (Outcome::Yes, Outcome::No));
    }
}
