//! Configuration management for stx402.
//!
//! The config file never holds key material: unknown fields are rejected, so
//! a stray `private_key = ...` line fails loudly instead of being read.

use crate::constants::{DEFAULT_FALLBACK_RECIPIENT, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::error::{Result, Stx402Error};
use crate::network::StacksNetwork;
use crate::stacks::Principal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Network payments are made on
    #[serde(default)]
    pub network: StacksNetwork,
    /// Stacks node API base URL; defaults to the network's public node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_url: Option<String>,
    /// Recipient used when a payment option names no address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_recipient: Option<String>,
    /// Fixed fee in micro-STX; skips the node fee lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<u64>,
    /// Fixed nonce; skips the node account lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    /// Per-call network timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Refuse to pay more than this many micro-STX
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<u64>,
}

/// Macro to reduce builder pattern boilerplate
macro_rules! builder_method {
    ($name:ident, $field:ident, $value_type:ty) => {
        pub fn $name(mut self, value: impl Into<$value_type>) -> Self {
            self.config.$field = Some(value.into());
            self
        }
    };
}

/// Builder for creating Config instances
///
/// # Examples
///
/// ```
/// use stx402_lib::config::Config;
/// use stx402_lib::network::StacksNetwork;
///
/// let config = Config::builder()
///     .network(StacksNetwork::Testnet)
///     .with_fee(180u64)
///     .with_nonce(0u64)
///     .build()
///     .unwrap();
/// assert_eq!(config.node_url(), "https://api.testnet.hiro.so");
/// ```
#[derive(Debug, Default)]
#[must_use]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn network(mut self, network: StacksNetwork) -> Self {
        self.config.network = network;
        self
    }

    builder_method!(with_node_url, node_url, String);
    builder_method!(with_fallback_recipient, fallback_recipient, String);
    builder_method!(with_fee, fee, u64);
    builder_method!(with_nonce, nonce, u64);
    builder_method!(with_timeout_secs, timeout_secs, u64);
    builder_method!(with_max_amount, max_amount, u64);

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Node API base URL, without a trailing slash.
    pub fn node_url(&self) -> String {
        self.node_url
            .as_deref()
            .unwrap_or(self.network.default_node_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// Parsed fallback recipient.
    pub fn fallback_recipient(&self) -> Result<Principal> {
        self.fallback_recipient
            .as_deref()
            .unwrap_or(DEFAULT_FALLBACK_RECIPIENT)
            .parse()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    /// Load config from the specified path or default location (~/.stx402/config.toml)
    pub fn load_from(config_path: Option<impl AsRef<Path>>) -> Result<Self> {
        let config_path = Self::resolve_path(config_path)?;

        if !config_path.exists() {
            return Err(Stx402Error::config_missing(format!(
                "Config file not found at {}",
                config_path.display()
            )));
        }
        Self::read(&config_path)
    }

    /// Load config, returning default if file doesn't exist.
    ///
    /// Invalid or unreadable files are still errors.
    pub fn load_or_default(config_path: Option<impl AsRef<Path>>) -> Result<Self> {
        let config_path = Self::resolve_path(config_path)?;

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::read(&config_path)
    }

    fn resolve_path(config_path: Option<impl AsRef<Path>>) -> Result<PathBuf> {
        match config_path {
            Some(path) => Ok(PathBuf::from(path.as_ref())),
            None => Self::default_config_path(),
        }
    }

    fn read(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path).map_err(|e| {
            Stx402Error::InvalidConfig(format!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let config = Self::parse(&content).map_err(|e| {
            Stx402Error::InvalidConfig(format!(
                "Invalid configuration in {}: {}",
                config_path.display(),
                e
            ))
        })?;
        tracing::debug!(path = %config_path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate TOML config text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path (~/.stx402/config.toml)
    pub fn default_config_path() -> Result<PathBuf> {
        crate::constants::default_config_path().ok_or(Stx402Error::NoConfigDir)
    }

    pub fn validate(&self) -> Result<()> {
        let recipient = self.fallback_recipient().map_err(|e| {
            Stx402Error::InvalidConfig(format!("fallback_recipient is invalid: {e}"))
        })?;
        if let Some(network) = recipient.address().network() {
            if network != self.network {
                tracing::warn!(
                    recipient = %recipient,
                    configured = %self.network,
                    "fallback recipient belongs to a different network"
                );
            }
        }

        let node_url = self.node_url();
        if !(node_url.starts_with("http://") || node_url.starts_with("https://")) {
            return Err(Stx402Error::InvalidConfig(format!(
                "node_url must be an http(s) URL, got '{node_url}'"
            )));
        }

        if self.timeout_secs == Some(0) {
            return Err(Stx402Error::InvalidConfig(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
