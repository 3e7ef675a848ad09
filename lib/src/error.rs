//! Error types for the stx402 library.

use crate::http::HttpResponse;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for stx402 operations.
pub type Result<T> = std::result::Result<T, Stx402Error>;

#[derive(Error, Debug)]
pub enum Stx402Error {
    // ==================== Challenge Errors ====================
    /// The response handed to the challenge handler was not a 402.
    ///
    /// The response is carried back unchanged so the caller can deal with it.
    #[error("Expected a 402 Payment Required response, got HTTP {}", .0.status_code)]
    NotAPaymentChallenge(Box<HttpResponse>),

    #[error("The server's 402 response did not include usable payment requirements: {0}")]
    MissingPaymentRequirements(String),

    #[error("Could not build the payment transaction: {0}")]
    TransactionConstructionFailed(String),

    /// The paid retry failed before any response arrived.
    #[error("The paid request failed: {0}")]
    RetryTransportFailure(#[source] Box<Stx402Error>),

    #[error("Request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    // ==================== Payment Errors ====================
    #[error("Payment amount {required} exceeds your limit of {max}. Increase your limit with `--max-amount` or decline this payment.")]
    AmountExceedsMax { required: u128, max: u128 },

    #[error("Invalid amount '{0}'. Expected a non-negative integer in micro-STX.")]
    InvalidAmount(String),

    // ==================== Key & Address Errors ====================
    #[error("{0}")]
    InvalidKey(String),

    #[error("{0}")]
    InvalidAddress(String),

    #[error("Unknown network '{0}'. Use `mainnet` or `testnet`.")]
    UnknownNetwork(String),

    // ==================== Config Errors ====================
    #[error("{0}")]
    ConfigMissing(String),

    #[error("{0}")]
    InvalidConfig(String),

    #[error("Could not find config directory. Set the STX402_CONFIG_DIR environment variable or ensure your home directory is accessible.")]
    NoConfigDir,

    // ==================== HTTP Errors ====================
    #[error("{0}")]
    Http(String),

    #[error("Stacks node request failed: {0}")]
    NodeApi(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config file format: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid hex encoding: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Invalid base64 encoding: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    // ==================== External Library Errors ====================
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network request failed: {0}")]
    Curl(#[from] curl::Error),

    #[error("Server returned invalid text encoding. The response may be corrupted.")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("System clock error: {0}")]
    SystemTime(#[from] std::time::SystemTimeError),
}

impl Stx402Error {
    /// Create a transaction construction error
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::TransactionConstructionFailed(msg.into())
    }

    /// Create a missing requirements error
    pub fn missing_requirements(msg: impl Into<String>) -> Self {
        Self::MissingPaymentRequirements(msg.into())
    }

    /// Create an invalid address error
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    /// Create a config missing error
    pub fn config_missing(msg: impl Into<String>) -> Self {
        Self::ConfigMissing(msg.into())
    }

    /// True if this error, or the failure it wraps, is a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Stx402Error::Timeout(_) => true,
            Stx402Error::Curl(e) => e.is_operation_timedout(),
            Stx402Error::RetryTransportFailure(inner) => inner.is_timeout(),
            _ => false,
        }
    }
}
