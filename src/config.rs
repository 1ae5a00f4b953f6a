//! Application configuration loaded from environment variables.

use std::time::Duration;

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::signing::{self, SignatureType};

/// Application configuration loaded from environment variables.
///
/// Credentials accept both the short and the long variable names
/// (`PK`/`PRIVATE_KEY`, `FUNDER`/`FUNDER_ADDRESS`). Trading tunables default
/// to fixed constants and only change if explicitly overridden.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Credentials (all required) ===
    /// Wallet private key, short name. Wins over `PRIVATE_KEY`.
    #[serde(default)]
    pub pk: Option<String>,

    /// Wallet private key (hex, with or without 0x).
    #[serde(default)]
    pub private_key: Option<String>,

    /// Proxy wallet address, short name. Wins over `FUNDER_ADDRESS`.
    #[serde(default)]
    pub funder: Option<String>,

    /// Proxy wallet address that holds the funds.
    #[serde(default)]
    pub funder_address: Option<String>,

    /// CLOB API key.
    #[serde(default)]
    pub poly_api_key: Option<String>,

    /// CLOB API secret (base64).
    #[serde(default)]
    pub poly_api_secret: Option<String>,

    /// CLOB API passphrase.
    #[serde(default)]
    pub poly_passphrase: Option<String>,

    // === Wallet Configuration ===
    /// Signature type: 0=EOA, 1=Magic.link proxy, 2=Gnosis Safe proxy.
    #[serde(default = "default_signature_type")]
    pub signature_type: u8,

    /// Chain ID (137 for Polygon mainnet).
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    // === Momentum Trade ===
    /// Only trade in the final N minutes of each 15-minute interval.
    #[serde(default = "default_momentum_window")]
    pub buy_in_last_minutes: u32,

    /// Shares per momentum order.
    #[serde(default = "default_trade_size")]
    pub shares_to_buy: Decimal,

    /// Limit price for every order (aggressive, acts as marketable limit).
    #[serde(default = "default_buy_price")]
    pub buy_price: Decimal,

    // === Relative-Value Engine ===
    /// Open a paired position when |signal| reaches this value.
    #[serde(default = "default_rv_open")]
    pub rv_open_threshold: Decimal,

    /// Close the paired position when |signal| falls to this value.
    #[serde(default = "default_rv_close")]
    pub rv_close_threshold: Decimal,

    /// Minimum seconds between RV state changes.
    #[serde(default = "default_rv_cooldown")]
    pub rv_cooldown_seconds: u64,

    /// Shares per RV leg.
    #[serde(default = "default_trade_size")]
    pub rv_leg_size: Decimal,

    // === Loop Timing ===
    /// Seconds between ticks.
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,

    /// Seconds to wait when the 15-minute market cannot be resolved.
    #[serde(default = "default_retry_delay")]
    pub market_retry_seconds: u64,

    /// Seconds to wait after a failed tick.
    #[serde(default = "default_retry_delay")]
    pub error_backoff_seconds: u64,

    // === HTTP ===
    /// CLOB API base URL.
    #[serde(default = "default_clob_url")]
    pub clob_url: String,

    /// Gamma (market directory) API base URL.
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,

    /// Timeout for directory lookups and order submission.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    /// Timeout for each price request.
    #[serde(default = "default_quote_timeout")]
    pub quote_timeout_ms: u64,

    // === Operation Modes ===
    /// Simulation mode (orders are accepted locally, nothing is sent).
    #[serde(default)]
    pub dry_run: bool,

    // === Server / Logging ===
    /// HTTP port for health/status/metrics (0 disables the server).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Append-only log file.
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

/// Validated credentials, produced by [`Config::credentials`].
#[derive(Clone)]
pub struct Credentials {
    /// Wallet private key.
    pub private_key: String,
    /// Funder (proxy wallet) address.
    pub funder_address: String,
    /// CLOB API key.
    pub api_key: String,
    /// CLOB API secret.
    pub api_secret: String,
    /// CLOB API passphrase.
    pub api_passphrase: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("funder_address", &self.funder_address)
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

fn default_signature_type() -> u8 {
    2
}

fn default_chain_id() -> u64 {
    137
}

fn default_momentum_window() -> u32 {
    5
}

fn default_trade_size() -> Decimal {
    Decimal::new(6, 0) // 6 shares
}

fn default_buy_price() -> Decimal {
    Decimal::new(99, 2) // 0.99
}

fn default_rv_open() -> Decimal {
    Decimal::new(8, 2) // 0.08
}

fn default_rv_close() -> Decimal {
    Decimal::new(3, 2) // 0.03
}

fn default_rv_cooldown() -> u64 {
    60
}

fn default_check_interval() -> u64 {
    5
}

fn default_retry_delay() -> u64 {
    10
}

fn default_clob_url() -> String {
    "https://clob.polymarket.com".to_string()
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}

fn default_http_timeout() -> u64 {
    5000
}

fn default_quote_timeout() -> u64 {
    3000
}

fn default_port() -> u16 {
    8080
}

fn default_log_file() -> String {
    "bot.log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pk: None,
            private_key: None,
            funder: None,
            funder_address: None,
            poly_api_key: None,
            poly_api_secret: None,
            poly_passphrase: None,
            signature_type: default_signature_type(),
            chain_id: default_chain_id(),
            buy_in_last_minutes: default_momentum_window(),
            shares_to_buy: default_trade_size(),
            buy_price: default_buy_price(),
            rv_open_threshold: default_rv_open(),
            rv_close_threshold: default_rv_close(),
            rv_cooldown_seconds: default_rv_cooldown(),
            rv_leg_size: default_trade_size(),
            check_interval_seconds: default_check_interval(),
            market_retry_seconds: default_retry_delay(),
            error_backoff_seconds: default_retry_delay(),
            clob_url: default_clob_url(),
            gamma_url: default_gamma_url(),
            http_timeout_ms: default_http_timeout(),
            quote_timeout_ms: default_quote_timeout(),
            dry_run: false,
            port: default_port(),
            log_file: default_log_file(),
            rust_log: default_log_level(),
        }
    }
}

/// Upper bound for `RV_COOLDOWN_SECONDS` (one day).
pub const MAX_RV_COOLDOWN_SECONDS: u64 = 86_400;

/// First non-blank value, in order.
fn first_set<'a>(values: &[&'a Option<String>]) -> Option<&'a str> {
    values
        .iter()
        .filter_map(|v| v.as_deref().map(str::trim))
        .find(|v| !v.is_empty())
}

fn required(values: &[&Option<String>], name: &'static str) -> Result<String, ConfigError> {
    first_set(values)
        .map(str::to_string)
        .ok_or(ConfigError::MissingCredential(name))
}

/// `0x` followed by 20 hex-encoded bytes.
fn is_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .filter(|hex_part| hex_part.len() == 40)
        .is_some_and(|hex_part| hex::decode(hex_part).is_ok())
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Return the five credentials, failing on the first one missing.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        Ok(Credentials {
            private_key: required(&[&self.pk, &self.private_key], "PK or PRIVATE_KEY")?,
            funder_address: required(
                &[&self.funder, &self.funder_address],
                "FUNDER or FUNDER_ADDRESS",
            )?,
            api_key: required(&[&self.poly_api_key], "POLY_API_KEY")?,
            api_secret: required(&[&self.poly_api_secret], "POLY_API_SECRET")?,
            api_passphrase: required(&[&self.poly_passphrase], "POLY_PASSPHRASE")?,
        })
    }

    /// Check that credentials are present and tunables are consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let creds = self.credentials()?;

        signing::create_signer(&creds.private_key)
            .map_err(|e| ConfigError::Invalid(format!("PRIVATE_KEY unusable: {}", e)))?;

        if !is_address(&creds.funder_address) {
            return Err(ConfigError::Invalid(
                "FUNDER must be a 0x-prefixed 20-byte hex address".to_string(),
            ));
        }

        if self.rv_close_threshold <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "RV_CLOSE_THRESHOLD must be positive".to_string(),
            ));
        }

        // Hysteresis band: a freshly opened position must not be closable.
        if self.rv_close_threshold >= self.rv_open_threshold {
            return Err(ConfigError::Invalid(format!(
                "RV_CLOSE_THRESHOLD ({}) must be below RV_OPEN_THRESHOLD ({})",
                self.rv_close_threshold, self.rv_open_threshold
            )));
        }

        if self.rv_open_threshold > Decimal::ONE {
            return Err(ConfigError::Invalid(
                "RV_OPEN_THRESHOLD must be at most 1.0".to_string(),
            ));
        }

        if self.buy_price <= Decimal::ZERO || self.buy_price >= Decimal::ONE {
            return Err(ConfigError::Invalid(
                "BUY_PRICE must be strictly between 0 and 1".to_string(),
            ));
        }

        if self.shares_to_buy <= Decimal::ZERO || self.rv_leg_size <= Decimal::ZERO {
            return Err(ConfigError::Invalid("order sizes must be positive".to_string()));
        }

        if self.buy_in_last_minutes == 0 || self.buy_in_last_minutes > 15 {
            return Err(ConfigError::Invalid(
                "BUY_IN_LAST_MINUTES must be between 1 and 15".to_string(),
            ));
        }

        if self.rv_cooldown_seconds > MAX_RV_COOLDOWN_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "RV_COOLDOWN_SECONDS must be at most {}",
                MAX_RV_COOLDOWN_SECONDS
            )));
        }

        if self.check_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "CHECK_INTERVAL_SECONDS must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed signature type.
    pub fn signature_type(&self) -> SignatureType {
        SignatureType::from_u8(self.signature_type)
    }

    /// Minimum time between RV state changes, saturating for out-of-range values.
    pub fn rv_cooldown(&self) -> TimeDelta {
        i64::try_from(self.rv_cooldown_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Interval between ticks.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    /// Wait after a tick that could not resolve the 15-minute market.
    pub fn market_retry(&self) -> Duration {
        Duration::from_secs(self.market_retry_seconds)
    }

    /// Wait after a failed tick.
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_seconds)
    }

    /// Per-request price timeout.
    pub fn quote_timeout(&self) -> Duration {
        Duration::from_millis(self.quote_timeout_ms)
    }

    /// Client-level HTTP timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Short, log-safe form of the funder address.
    pub fn funder_display(&self) -> String {
        let Some(funder) = first_set(&[&self.funder, &self.funder_address]) else {
            return "<unset>".to_string();
        };
        let chars: Vec<char> = funder.chars().collect();
        if chars.len() <= 10 {
            return funder.to_string();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn test_config() -> Config {
        Config {
            private_key: Some(
                "0x0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef".to_string(),
            ),
            funder_address: Some("0xF00D000000000000000000000000000000000001".to_string()),
            poly_api_key: Some("key".to_string()),
            poly_api_secret: Some("c2VjcmV0".to_string()),
            poly_passphrase: Some("pass".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn default_values_are_sensible() {
        let config = Config::default();
        assert_eq!(config.shares_to_buy, dec!(6));
        assert_eq!(config.buy_price, dec!(0.99));
        assert_eq!(config.rv_open_threshold, dec!(0.08));
        assert_eq!(config.rv_close_threshold, dec!(0.03));
        assert_eq!(config.check_interval(), Duration::from_secs(5));
        assert!(!config.dry_run);
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_each_missing_credential() {
        let strip: [fn(&mut Config); 5] = [
            |c| c.private_key = None,
            |c| c.funder_address = None,
            |c| c.poly_api_key = None,
            |c| c.poly_api_secret = Some("  ".to_string()),
            |c| c.poly_passphrase = None,
        ];

        for f in strip {
            let mut config = test_config();
            f(&mut config);
            assert!(matches!(
                config.validate(),
                Err(ConfigError::MissingCredential(_))
            ));
        }
    }

    #[test]
    fn validate_rejects_inverted_thresholds() {
        let mut config = test_config();
        config.rv_close_threshold = dec!(0.08);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.rv_close_threshold = dec!(0.10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_private_key() {
        let mut config = test_config();
        config.private_key = Some("0x1234".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn funder_display_is_abbreviated() {
        assert_eq!(test_config().funder_display(), "0xF00D...0001");
    }

    #[test]
    fn funder_display_handles_non_ascii() {
        let mut config = test_config();
        config.funder_address = Some("0xé€€€€€€€€€€€€".to_string());
        assert_eq!(config.funder_display(), "0xé€€€...€€€€");
    }

    #[test]
    fn validate_rejects_malformed_funder() {
        for funder in [
            "0x1234",
            "F00D000000000000000000000000000000000001",
            "0xZZ0D000000000000000000000000000000000001",
            "0xé€€€€€€€€€€€€",
        ] {
            let mut config = test_config();
            config.funder_address = Some(funder.to_string());
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "{} should be rejected",
                funder
            );
        }
    }

    #[test]
    fn short_and_long_credential_names_coexist() {
        let vars = [
            ("PK", "0xshort"),
            ("PRIVATE_KEY", "0xlong"),
            ("FUNDER", "0xfunder-short"),
            ("FUNDER_ADDRESS", "0xfunder-long"),
            ("POLY_API_KEY", "key"),
            ("POLY_API_SECRET", "c2VjcmV0"),
            ("POLY_PASSPHRASE", "pass"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()));

        let config: Config = envy::from_iter(vars).unwrap();
        let creds = config.credentials().unwrap();
        assert_eq!(creds.private_key, "0xshort");
        assert_eq!(creds.funder_address, "0xfunder-short");
    }

    #[test]
    fn long_credential_names_alone_are_enough() {
        let vars = [("PRIVATE_KEY", "0xlong"), ("FUNDER_ADDRESS", "0xfunder-long")]
            .map(|(k, v)| (k.to_string(), v.to_string()));

        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.private_key.as_deref(), Some("0xlong"));
        assert_eq!(config.funder_display(), "0xfund...long");
    }

    #[test]
    fn blank_short_name_falls_back_to_long_name() {
        let mut config = test_config();
        config.pk = Some("   ".to_string());
        let creds = config.credentials().unwrap();
        assert_eq!(creds.private_key, test_config().private_key.unwrap());
    }

    #[test]
    fn validate_bounds_rv_cooldown() {
        let mut config = test_config();
        config.rv_cooldown_seconds = MAX_RV_COOLDOWN_SECONDS;
        assert!(config.validate().is_ok());

        config.rv_cooldown_seconds = u64::MAX / 2;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        // Unvalidated values still map without panicking.
        assert_eq!(config.rv_cooldown(), TimeDelta::MAX);
    }
}
