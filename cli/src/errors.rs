//! Error display helpers with actionable suggestions.
//!
//! Provides user-friendly error messages that include suggestions
//! for how to fix common problems.

use crate::colors::Colors;
use stx402_lib::constants::PRIVATE_KEY_ENV;
use stx402_lib::Stx402Error;

/// Get a suggestion for how to fix an error, if available.
pub fn get_suggestion(err: &anyhow::Error) -> Option<String> {
    if let Some(lib_err) = err.downcast_ref::<Stx402Error>() {
        return get_lib_error_suggestion(lib_err);
    }

    // Check error message for common patterns
    let msg = err.to_string().to_lowercase();

    if msg.contains("permission denied") {
        return Some("Check file permissions or run with appropriate privileges.".into());
    }

    if msg.contains("payment was not accepted") {
        return Some(
            "The server rejected the signed transfer. Check that the sender has enough STX \
             and that the network matches the server's (see 'stx402 address')."
                .into(),
        );
    }

    None
}

/// Get suggestion for a specific library error.
fn get_lib_error_suggestion(err: &Stx402Error) -> Option<String> {
    if err.is_timeout() {
        return Some(
            "The request timed out. Try again or increase the timeout with --max-time.".into(),
        );
    }

    match err {
        Stx402Error::ConfigMissing(_) => Some(format!(
            "Set the {PRIVATE_KEY_ENV} environment variable (a .env file works too) \
             or pass --private-key."
        )),

        Stx402Error::NoConfigDir => {
            Some("Could not determine home directory. Set the HOME environment variable.".into())
        }

        Stx402Error::InvalidConfig(_) | Stx402Error::TomlParse(_) => Some(
            "Run 'stx402 config' to view your current configuration.\n\
             Private keys are not allowed in the config file."
                .into(),
        ),

        Stx402Error::InvalidKey(_) => Some(
            "Stacks private keys are 64 hex characters, or 66 ending in 01 for a \
             compressed key (with optional 0x prefix)."
                .into(),
        ),

        Stx402Error::InvalidAddress(_) => {
            Some("Stacks addresses start with SP (mainnet) or ST (testnet).".into())
        }

        Stx402Error::UnknownNetwork(_) => {
            Some("Use --network mainnet or --network testnet.".into())
        }

        Stx402Error::AmountExceedsMax { required, max } => Some(format!(
            "The server requires {required} micro-STX but your max is {max}.\n\
             Increase with --max-amount or remove the limit."
        )),

        Stx402Error::MissingPaymentRequirements(_) => Some(
            "The server answered 402 but did not say how to pay. \
             Check that it speaks x402 version 2."
                .into(),
        ),

        Stx402Error::TransactionConstructionFailed(msg) => {
            if msg.contains("look up") {
                Some("Check the node_url in your config, or pin fee and nonce there.".into())
            } else if msg.contains("network") {
                Some("Switch networks with --network to match the server.".into())
            } else {
                None
            }
        }

        Stx402Error::Curl(_) | Stx402Error::Http(_) | Stx402Error::RetryTransportFailure(_) => {
            Some("Check that the server is running and reachable, then try again.".into())
        }

        _ => None,
    }
}

/// Format an error with its suggestion for display.
pub fn format_error_with_suggestion(err: &anyhow::Error) -> String {
    let mut output = format!("{} {err:#}", Colors::error("Error:"));

    if let Some(suggestion) = get_suggestion(err) {
        output.push_str(&format!("\n\n{}:\n", Colors::info("Suggestion")));
        output.push_str(&suggestion);
    }

    output
}
