//! Quote types.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

/// Best bid / best ask / mid for one outcome token.
///
/// Zero means "unavailable" (no liquidity or the fetch failed) and must
/// never be used as a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Quote {
    /// Best bid, or zero.
    pub bid: Decimal,
    /// Best ask, or zero.
    pub ask: Decimal,
    /// Derived mid, or zero.
    pub mid: Decimal,
}

impl Quote {
    /// Quote with every field at the zero sentinel.
    pub const UNAVAILABLE: Quote = Quote {
        bid: Decimal::ZERO,
        ask: Decimal::ZERO,
        mid: Decimal::ZERO,
    };

    /// Build a quote from both sides, deriving `mid`.
    ///
    /// Negative inputs are treated as unavailable.
    pub fn from_sides(bid: Decimal, ask: Decimal) -> Self {
        let bid = bid.max(Decimal::ZERO);
        let ask = ask.max(Decimal::ZERO);

        let mid = if bid > Decimal::ZERO && ask > Decimal::ZERO {
            (bid + ask) / Decimal::TWO
        } else {
            bid.max(ask)
        };

        Self { bid, ask, mid }
    }

    /// Whether `mid` can be used for decisions.
    pub fn has_mid(&self) -> bool {
        self.mid > Decimal::ZERO
    }
}

/// Parse the `price` field of a price response.
///
/// Accepts a string or a number; anything else, or a negative value, is 0.
pub fn parse_price(value: &serde_json::Value) -> Decimal {
    let parsed = match value {
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    };

    parsed
        .filter(|p| *p >= Decimal::ZERO)
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn mid_is_average_when_both_sides_present() {
        let q = Quote::from_sides(dec!(0.48), dec!(0.52));
        assert_eq!(q.mid, dec!(0.50));
        assert!(q.has_mid());
    }

    #[test]
    fn mid_falls_back_to_available_side() {
        assert_eq!(Quote::from_sides(dec!(0.40), Decimal::ZERO).mid, dec!(0.40));
        assert_eq!(Quote::from_sides(Decimal::ZERO, dec!(0.61)).mid, dec!(0.61));
    }

    #[test]
    fn mid_is_zero_when_nothing_available() {
        let q = Quote::from_sides(Decimal::ZERO, Decimal::ZERO);
        assert_eq!(q, Quote::UNAVAILABLE);
        assert!(!q.has_mid());
    }

    #[test]
    fn negative_sides_are_unavailable() {
        let q = Quote::from_sides(dec!(-0.1), dec!(0.5));
        assert_eq!(q.bid, Decimal::ZERO);
        assert_eq!(q.mid, dec!(0.5));
    }

    #[test]
    fn parse_price_formats() {
        assert_eq!(parse_price(&json!("0.55")), dec!(0.55));
        assert_eq!(parse_price(&json!(0.55)), dec!(0.55));
        assert_eq!(parse_price(&json!(1)), dec!(1));
        assert_eq!(parse_price(&json!(null)), Decimal::ZERO);
        assert_eq!(parse_price(&json!("abc")), Decimal::ZERO);
        assert_eq!(parse_price(&json!({"p": 1})), Decimal::ZERO);
        assert_eq!(parse_price(&json!("-0.2")), Decimal::ZERO);
    }
}
