//! Signing and authentication utilities for Polymarket.
//!
//! This module provides utilities for:
//! - Parsing the configured wallet signature type
//! - Creating signers from private keys
//! - Computing wallet addresses
//! - Cached signer for repeated order signing
//! - L2 (API key) HMAC request headers

use std::collections::HashMap;
use std::sync::RwLock;

use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use base64::Engine;
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use sha2::Sha256;
use strum::Display;
use tracing::debug;

use crate::error::TradingError;

type HmacSha256 = Hmac<Sha256>;

/// Global signer cache - stores signers by private key hash to avoid recreation.
static SIGNER_CACHE: Lazy<RwLock<HashMap<u64, PrivateKeySigner>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Compute a simple hash of the private key for cache lookup.
fn key_hash(private_key: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    private_key.hash(&mut hasher);
    hasher.finish()
}

/// Wallet signature scheme used for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SignatureType {
    /// Externally owned account - standard wallet.
    #[strum(serialize = "EOA")]
    Eoa,
    /// Magic.link proxy wallet.
    #[strum(serialize = "POLY_PROXY")]
    Proxy,
    /// Gnosis Safe proxy wallet.
    #[strum(serialize = "POLY_GNOSIS_SAFE")]
    GnosisSafe,
}

impl SignatureType {
    /// Convert a u8 signature type from config.
    ///
    /// Unknown values fall back to EOA.
    pub fn from_u8(sig_type: u8) -> Self {
        match sig_type {
            1 => SignatureType::Proxy,
            2 => SignatureType::GnosisSafe,
            _ => SignatureType::Eoa,
        }
    }

    /// Numeric code sent with each order.
    pub fn as_u8(self) -> u8 {
        match self {
            SignatureType::Eoa => 0,
            SignatureType::Proxy => 1,
            SignatureType::GnosisSafe => 2,
        }
    }
}

/// CLOB API key triple.
#[derive(Clone)]
pub struct ApiCredentials {
    /// API key.
    pub api_key: String,
    /// Base64 (URL-safe) encoded secret.
    pub api_secret: String,
    /// Passphrase.
    pub api_passphrase: String,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

/// Create a LocalSigner from a hex-encoded private key.
///
/// The private key can be with or without the "0x" prefix.
pub fn create_signer(private_key: &str) -> Result<PrivateKeySigner, TradingError> {
    let key = private_key.strip_prefix("0x").unwrap_or(private_key);
    let bytes = hex::decode(key).map_err(|e| {
        TradingError::SigningError(format!("Invalid private key hex: {}", e))
    })?;

    if bytes.len() != 32 {
        return Err(TradingError::SigningError(format!(
            "Private key must be 32 bytes, got {}",
            bytes.len()
        )));
    }

    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&bytes);

    PrivateKeySigner::from_bytes(&key_bytes.into()).map_err(|e| {
        TradingError::SigningError(format!("Failed to create signer: {}", e))
    })
}

/// Get or create a cached signer for the given private key.
pub fn get_or_create_signer(private_key: &str) -> Result<PrivateKeySigner, TradingError> {
    let hash = key_hash(private_key);

    {
        let cache = SIGNER_CACHE.read().map_err(|e| {
            TradingError::SigningError(format!("Failed to acquire cache read lock: {}", e))
        })?;

        if let Some(signer) = cache.get(&hash) {
            return Ok(signer.clone());
        }
    }

    let signer = create_signer(private_key)?;

    let mut cache = SIGNER_CACHE.write().map_err(|e| {
        TradingError::SigningError(format!("Failed to acquire cache write lock: {}", e))
    })?;

    debug!("Caching new signer");
    Ok(cache.entry(hash).or_insert(signer).clone())
}

/// Get the wallet address from a private key.
pub fn address_from_private_key(private_key: &str) -> Result<String, TradingError> {
    let signer = create_signer(private_key)?;
    Ok(format!("{:?}", signer.address()))
}

/// Sign a message with the private key (uses cached signer).
pub async fn sign_message(private_key: &str, message: &[u8]) -> Result<Vec<u8>, TradingError> {
    let signer = get_or_create_signer(private_key)?;
    let signature = signer.sign_message(message).await.map_err(|e| {
        TradingError::SigningError(format!("Failed to sign message: {}", e))
    })?;
    Ok(signature.as_bytes().to_vec())
}

/// Compute the L2 request signature.
///
/// Payload is `timestamp + METHOD + path + body`, keyed with the decoded
/// secret, output URL-safe base64. Query strings are not part of the path.
pub fn l2_signature(
    secret: &str,
    timestamp: &str,
    method: &str,
    path: &str,
    body: &str,
) -> Result<String, TradingError> {
    let engine = base64::engine::general_purpose::URL_SAFE;
    let key = engine.decode(secret).map_err(|e| {
        TradingError::AuthenticationFailed(format!("API secret is not base64: {}", e))
    })?;

    let path_only = path.split('?').next().unwrap_or(path);
    let payload = format!("{}{}{}{}", timestamp, method.to_uppercase(), path_only, body);

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| TradingError::AuthenticationFailed(format!("bad HMAC key: {}", e)))?;
    mac.update(payload.as_bytes());

    Ok(engine.encode(mac.finalize().into_bytes()))
}

/// Generate CLOB L2 authentication headers for one request.
pub fn l2_headers(
    creds: &ApiCredentials,
    address: &str,
    method: &str,
    path: &str,
    body: &str,
) -> Result<Vec<(String, String)>, TradingError> {
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = l2_signature(&creds.api_secret, &timestamp, method, path, body)?;

    Ok(vec![
        ("POLY_ADDRESS".to_string(), address.to_string()),
        ("POLY_SIGNATURE".to_string(), signature),
        ("POLY_TIMESTAMP".to_string(), timestamp),
        ("POLY_API_KEY".to_string(), creds.api_key.clone()),
        ("POLY_PASSPHRASE".to_string(), creds.api_passphrase.clone()),
    ])
}
