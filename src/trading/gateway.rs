//! Order gateway: the single boundary where orders leave the bot.
//!
//! Every failure below this point (transport, signing, HTTP status, body
//! parsing) is folded into [`OrderOutcome::Rejected`], so strategies only
//! ever see accepted or rejected.

use std::sync::atomic::{AtomicU64, Ordering};

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::execution::extract_order_id;
use super::order::OrderParams;
use crate::error::TradingError;
use crate::metrics;

/// Result of one order placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    /// The venue took the order.
    Accepted {
        /// Venue order id, when the response carried one.
        order_id: Option<String>,
    },
    /// The order was not placed.
    Rejected {
        /// Human-readable reason.
        reason: String,
    },
}

impl OrderOutcome {
    /// Whether the order was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, OrderOutcome::Accepted { .. })
    }
}

/// Places aggressive limit buys.
#[allow(async_fn_in_trait)]
pub trait OrderGateway {
    /// Buy `size` shares of `token_id` at limit `price`. `label` only
    /// appears in logs.
    async fn place_limit_buy(
        &self,
        token_id: &str,
        size: Decimal,
        price: Decimal,
        label: &str,
    ) -> OrderOutcome;
}

/// Signed order submission service.
#[allow(async_fn_in_trait)]
pub trait ExecutionService {
    /// Submit an order, returning the raw response body of a 2xx reply.
    async fn post_order(&self, params: &OrderParams) -> Result<serde_json::Value, TradingError>;
}

/// Classify a 2xx order response.
///
/// Accepted if `success` is true or an order id is present; otherwise the
/// reason is taken from `errorMsg`, `message`, `error`, in that order.
pub fn classify_response(body: &serde_json::Value) -> OrderOutcome {
    let success = body.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
    let order_id = extract_order_id(body);

    if success || order_id.is_some() {
        return OrderOutcome::Accepted { order_id };
    }

    let reason = ["errorMsg", "message", "error"]
        .iter()
        .filter_map(|key| body.get(*key))
        .filter_map(|v| match v {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::String(_) | serde_json::Value::Null => None,
            other => Some(other.to_string()),
        })
        .next()
        .unwrap_or_else(|| "unknown".to_string());

    OrderOutcome::Rejected { reason }
}

/// Gateway submitting real orders through an [`ExecutionService`].
#[derive(Debug, Clone)]
pub struct LiveGateway<S> {
    service: S,
}

impl<S: ExecutionService> LiveGateway<S> {
    /// Create a live gateway.
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

impl<S: ExecutionService> OrderGateway for LiveGateway<S> {
    #[instrument(skip(self, size, price))]
    async fn place_limit_buy(
        &self,
        token_id: &str,
        size: Decimal,
        price: Decimal,
        label: &str,
    ) -> OrderOutcome {
        let params = OrderParams::buy(token_id, price, size);

        let outcome = match self.service.post_order(&params).await {
            Ok(body) => classify_response(&body),
            Err(e) => OrderOutcome::Rejected {
                reason: e.to_string(),
            },
        };

        match &outcome {
            OrderOutcome::Accepted { order_id } => {
                metrics::inc_orders_accepted();
                info!(
                    label = %label,
                    token_id = %token_id,
                    size = %size,
                    price = %price,
                    order_id = ?order_id,
                    "Order accepted"
                );
            }
            OrderOutcome::Rejected { reason } => {
                metrics::inc_orders_rejected();
                warn!(
                    label = %label,
                    token_id = %token_id,
                    size = %size,
                    price = %price,
                    reason = %reason,
                    "Order rejected"
                );
            }
        }

        outcome
    }
}

/// Dry-run gateway: accepts every order with a synthetic id.
#[derive(Debug, Default)]
pub struct SimulatedGateway {
    counter: AtomicU64,
}

impl SimulatedGateway {
    /// Create a simulated gateway.
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderGateway for SimulatedGateway {
    async fn place_limit_buy(
        &self,
        token_id: &str,
        size: Decimal,
        price: Decimal,
        label: &str,
    ) -> OrderOutcome {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let order_id = format!("dry-run-{}", n);

        metrics::inc_orders_accepted();
        info!(
            label = %label,
            token_id = %token_id,
            size = %size,
            price = %price,
            order_id = %order_id,
            "DRY RUN: order not sent"
        );

        OrderOutcome::Accepted {
            order_id: Some(order_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MockExecutionService;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn rejected(reason: &str) -> OrderOutcome {
        OrderOutcome::Rejected {
            reason: reason.to_string(),
        }
    }

    #[test]
    fn success_flag_or_order_id_is_accepted() {
        assert_eq!(
            classify_response(&json!({"success": true})),
            OrderOutcome::Accepted { order_id: None }
        );
        assert_eq!(
            classify_response(&json!({"success": false, "orderID": "0xabc"})),
            OrderOutcome::Accepted {
                order_id: Some("0xabc".to_string())
            }
        );
    }

    #[test]
    fn rejection_reason_precedence() {
        assert_eq!(
            classify_response(&json!({"errorMsg": "a", "message": "b", "error": "c"})),
            rejected("a")
        );
        assert_eq!(
            classify_response(&json!({"message": "b", "error": "c"})),
            rejected("b")
        );
        assert_eq!(classify_response(&json!({"error": "c"})), rejected("c"));
        assert_eq!(classify_response(&json!({"success": false})), rejected("unknown"));
        assert_eq!(classify_response(&json!({"errorMsg": ""})), rejected("unknown"));
    }

    #[tokio::test]
    async fn live_gateway_maps_service_errors_to_rejected() {
        let service = MockExecutionService::new([
            Ok(json!({"success": true, "orderID": "1"})),
            Err("connection reset".to_string()),
            Ok(json!({"errorMsg": "not enough balance"})),
        ]);
        let gateway = LiveGateway::new(service);

        let first = gateway.place_limit_buy("t", dec!(6), dec!(0.99), "first").await;
        assert_eq!(
            first,
            OrderOutcome::Accepted {
                order_id: Some("1".to_string())
            }
        );

        let second = gateway.place_limit_buy("t", dec!(6), dec!(0.99), "second").await;
        match second {
            OrderOutcome::Rejected { reason } => assert!(reason.contains("connection reset")),
            other => panic!("expected rejection, got {:?}", other),
        }

        let third = gateway.place_limit_buy("t", dec!(6), dec!(0.99), "third").await;
        assert_eq!(third, rejected("not enough balance"));
    }

    #[tokio::test]
    async fn simulated_gateway_accepts_with_unique_ids() {
        let gateway = SimulatedGateway::new();
        let a = gateway.place_limit_buy("t", dec!(6), dec!(0.99), "a").await;
        let b = gateway.place_limit_buy("t", dec!(6), dec!(0.99), "b").await;

        assert!(a.is_accepted());
        assert!(b.is_accepted());
        assert_ne!(a, b);
    }
}
