//! Constants used throughout the stx402 library

use std::path::PathBuf;

/// Application name, used for the home directory and the User-Agent
pub const APP_NAME: &str = "stx402";

/// Config file name
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "STX402_CONFIG_DIR";

/// Environment variable holding the hex-encoded signing key
pub const PRIVATE_KEY_ENV: &str = "CLIENT_PRIVATE_KEY";

/// x402 protocol version written into every payment proof
pub const X402_VERSION: u32 = 2;

/// Default per-call network timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Maximum memo length of a token transfer, in bytes
pub const MEMO_MAX_LENGTH_BYTES: usize = 34;

/// Prefix of the memo attached to every payment transfer
pub const MEMO_PREFIX: &str = "x402:";

/// Recipient used when a payment option names no address.
///
/// A testnet address; override it with `fallback_recipient` in the config.
pub const DEFAULT_FALLBACK_RECIPIENT: &str = "ST1TKZ1BA0Q7JGY10MSQX1FHBWZKSX3M7X3EZE9FS";

/// Asset name of the native token
pub const STX_ASSET: &str = "STX";

/// Get the stx402 home directory (`~/.stx402/`)
///
/// `STX402_CONFIG_DIR` takes precedence when set.
pub fn stx402_home_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    dirs::home_dir().map(|h| h.join(format!(".{APP_NAME}")))
}

/// Get the default config file path (`~/.stx402/config.toml`)
///
/// # Returns
///
/// - `Some(PathBuf)` pointing to the config file location
/// - `None` if the home directory cannot be determined
pub fn default_config_path() -> Option<PathBuf> {
    stx402_home_dir().map(|p| p.join(CONFIG_FILE))
}
