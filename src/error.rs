//! Unified error types for the trading bot.

use thiserror::Error;

/// Unified error type for the trading bot.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Market-related error.
    #[error("market error: {0}")]
    Market(#[from] MarketError),

    /// Trading/order error.
    #[error("trading error: {0}")]
    Trading(#[from] TradingError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration errors. All of these are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment could not be deserialized.
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    /// A required credential is absent or empty.
    #[error("missing required credential {0}")]
    MissingCredential(&'static str),

    /// A value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Market resolution and quote errors.
#[derive(Error, Debug)]
pub enum MarketError {
    /// The directory has no market for this slug.
    #[error("market {slug} not found")]
    NotFound {
        /// The slug that was looked up.
        slug: String,
    },

    /// Failed to fetch market or price information.
    #[error("failed to fetch {target}: {reason}")]
    FetchFailed {
        /// The slug or token that failed.
        target: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to parse market data.
    #[error("failed to parse market data: {0}")]
    ParseError(String),

    /// Reference time cannot be bucketed into a market window.
    #[error("reference time {0} is before the unix epoch")]
    InvalidReferenceTime(i64),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Trading and order execution errors.
#[derive(Error, Debug)]
pub enum TradingError {
    /// Order submission failed.
    #[error("order submission failed: {0}")]
    SubmissionFailed(String),

    /// Invalid order parameters.
    #[error("invalid order parameters: {0}")]
    InvalidParams(String),

    /// Signing error.
    #[error("signing error: {0}")]
    SigningError(String),

    /// API credentials could not be used to authenticate.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, BotError>;
