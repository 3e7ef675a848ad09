//! Common test utilities for stx402 CLI tests

#![allow(dead_code)]

use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Private key 1 with the compressed-public-key suffix
pub const TEST_PRIVATE_KEY: &str =
    "000000000000000000000000000000000000000000000000000000000000000101";

/// Address of [`TEST_PRIVATE_KEY`] on testnet
pub const TEST_TESTNET_ADDRESS: &str = "ST1THWXQ8368SDN2MJGE4BMDKMCHZ2GSVTSQDA7QF";

/// Address of [`TEST_PRIVATE_KEY`] on mainnet
pub const TEST_MAINNET_ADDRESS: &str = "SP1THWXQ8368SDN2MJGE4BMDKMCHZ2GSVTS1X0BPM";

/// Create a config directory holding `config.toml` with the given content.
pub fn setup_test_config(content: &str) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    fs::write(temp_dir.path().join("config.toml"), content).expect("Failed to write config");
    temp_dir
}

/// A command isolated from the caller's config directory and key.
pub fn test_command(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stx402"));
    cmd.env("STX402_CONFIG_DIR", temp_dir.path())
        .env_remove("CLIENT_PRIVATE_KEY")
        .env_remove("STX402_NETWORK")
        .env_remove("STX402_MAX_AMOUNT")
        .env_remove("RUST_LOG");
    cmd
}
