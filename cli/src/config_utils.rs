use anyhow::{Context, Result};
use stx402_lib::{Config, StacksSigner, WalletOpts, WalletSource};

use crate::cli::Cli;

/// Load the config file (defaults when absent) and apply command-line overrides.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_or_default(cli.config.as_ref())
        .context("Failed to load configuration")?;

    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(seconds) = cli.max_time {
        config.timeout_secs = Some(seconds);
    }
    if let Some(max_amount) = cli.max_amount {
        config.max_amount = Some(max_amount);
    }
    config.validate()?;
    Ok(config)
}

/// The key from `--private-key`, else `CLIENT_PRIVATE_KEY`.
pub fn wallet_opts(cli: &Cli) -> WalletOpts {
    match &cli.private_key {
        Some(key) => WalletOpts::PrivateKey { key: key.clone() },
        None => WalletOpts::from_default_env(),
    }
}

pub fn load_signer(cli: &Cli) -> Result<StacksSigner> {
    Ok(wallet_opts(cli).load_signer()?)
}
