//! Signed order submission to the CLOB.

use serde::Serialize;
use tracing::{debug, instrument};

use super::order::OrderParams;
use crate::error::TradingError;
use crate::market::PolymarketClient;
use crate::metrics;
use crate::signing;

/// Path of the order endpoint, also part of the L2 signature payload.
const ORDER_PATH: &str = "/order";

/// Seconds an order signature stays valid.
const ORDER_EXPIRATION_SECS: i64 = 3600;

/// Order submission request body.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Token ID to trade.
    pub token_id: String,
    /// Order side (BUY/SELL).
    pub side: String,
    /// Limit price.
    pub price: String,
    /// Order size.
    pub size: String,
    /// Fee rate basis points.
    pub fee_rate_bps: String,
    /// Nonce for order uniqueness.
    pub nonce: String,
    /// Expiration timestamp.
    pub expiration: String,
    /// Taker address.
    pub taker: String,
    /// Maker (funder) address.
    pub maker: String,
    /// Signer address.
    pub signer: String,
    /// Signature type.
    pub signature_type: u8,
    /// Order signature.
    pub signature: String,
    /// Time in force.
    pub order_type: String,
    /// API key owning the order.
    pub owner: String,
}

/// Submit a single order and return the raw response body.
///
/// Any non-2xx status is an error; interpreting a 2xx body is left to the
/// gateway.
#[instrument(skip(client, params), fields(token = %params.token_id, side = %params.side))]
pub async fn submit_order(
    client: &PolymarketClient,
    params: &OrderParams,
) -> Result<serde_json::Value, TradingError> {
    params.validate().map_err(TradingError::InvalidParams)?;
    let _timer = metrics::timer_order_submit();

    debug!(
        price = %params.price,
        size = %params.size,
        tif = %params.tif,
        "Submitting order"
    );

    let address = client.get_address()?;

    let now = chrono::Utc::now();
    let nonce = now.timestamp_millis().to_string();
    let expiration = (now.timestamp() + ORDER_EXPIRATION_SECS).to_string();

    // token_id:side:price:size:nonce:expiration
    let order_message = format!(
        "{}:{}:{}:{}:{}:{}",
        params.token_id, params.side, params.price, params.size, nonce, expiration
    );

    let signature_bytes =
        signing::sign_message(client.private_key(), order_message.as_bytes()).await?;
    let signature = format!("0x{}", hex::encode(&signature_bytes));

    let order_request = OrderRequest {
        token_id: params.token_id.clone(),
        side: params.side.to_string(),
        price: params.price.to_string(),
        size: params.size.to_string(),
        fee_rate_bps: "0".to_string(),
        nonce,
        expiration,
        taker: "0x0000000000000000000000000000000000000000".to_string(),
        maker: client.funder().to_string(),
        signer: address.clone(),
        signature_type: client.signature_type().as_u8(),
        signature,
        order_type: params.tif.to_string(),
        owner: client.api_creds().api_key.clone(),
    };

    let body = serde_json::to_string(&order_request).map_err(|e| {
        TradingError::SubmissionFailed(format!("Failed to encode order: {}", e))
    })?;
    let auth_headers = signing::l2_headers(client.api_creds(), &address, "POST", ORDER_PATH, &body)?;

    let url = format!("{}{}", client.clob_url(), ORDER_PATH);
    let mut request = client
        .http()
        .post(&url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body);
    for (key, value) in auth_headers {
        request = request.header(key, value);
    }

    let response = request
        .send()
        .await
        .map_err(|e| TradingError::SubmissionFailed(format!("HTTP request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TradingError::SubmissionFailed(format!(
            "HTTP {} - {}",
            status, body
        )));
    }

    let result: serde_json::Value = response.json().await.map_err(|e| {
        TradingError::SubmissionFailed(format!("Failed to parse response: {}", e))
    })?;

    debug!(order_id = ?extract_order_id(&result), "Order response received");
    Ok(result)
}

/// Extract order ID from API response.
pub fn extract_order_id(result: &serde_json::Value) -> Option<String> {
    for key in ["orderID", "orderId", "order_id", "id"] {
        if let Some(id) = result.get(key).and_then(|v| v.as_str()) {
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
    }

    for key in ["order", "data", "result"] {
        if let Some(nested) = result.get(key) {
            if let Some(id) = extract_order_id(nested) {
                return Some(id);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use rust_decimal_macros::dec;

    #[test]
    fn extract_order_id_various_formats() {
        let json1 = serde_json::json!({"orderID": "abc123"});
        assert_eq!(extract_order_id(&json1), Some("abc123".to_string()));

        let json2 = serde_json::json!({"orderId": "def456"});
        assert_eq!(extract_order_id(&json2), Some("def456".to_string()));

        let json3 = serde_json::json!({"order": {"id": "ghi789"}});
        assert_eq!(extract_order_id(&json3), Some("ghi789".to_string()));

        let json4 = serde_json::json!({"error": "something"});
        assert_eq!(extract_order_id(&json4), None);

        let json5 = serde_json::json!({"orderID": ""});
        assert_eq!(extract_order_id(&json5), None);
    }

    #[tokio::test]
    async fn invalid_params_fail_before_network() {
        let client = PolymarketClient::new(&test_config()).unwrap();
        let params = OrderParams::buy("", dec!(0.99), dec!(6));

        let err = submit_order(&client, &params).await.unwrap_err();
        assert!(matches!(err, TradingError::InvalidParams(_)));
    }
}
