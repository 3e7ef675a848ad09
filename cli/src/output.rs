//! Output formatting and display utilities for the CLI

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use stx402_lib::x402::SettlementResponse;
use stx402_lib::{Config, DryRunInfo, HttpResponse, PaymentPayload, StacksAddress};

use crate::cli::{Cli, OutputFormat};
use crate::colors::Colors;

/// Print a response body in the requested format.
pub fn handle_response(cli: &Cli, response: &HttpResponse) -> Result<()> {
    let format = cli.output_format.resolve();

    match format {
        OutputFormat::Auto => unreachable!("Auto should be resolved"),
        OutputFormat::Json => {
            if let Ok(json_value) = serde_json::from_slice::<serde_json::Value>(&response.body) {
                let output = serde_json::to_string_pretty(&json_value)?;
                write_output(cli, output)?;
            } else {
                output_response_body(cli, &response.body)?;
            }
        }
        OutputFormat::Yaml => {
            if let Ok(json_value) = serde_json::from_slice::<serde_json::Value>(&response.body) {
                let output = serde_yaml::to_string(&json_value)?;
                write_output(cli, output)?;
            } else {
                output_response_body(cli, &response.body)?;
            }
        }
        OutputFormat::Text => {
            if cli.include_headers {
                println!("HTTP {}", response.status_code);
                let mut headers: Vec<_> = response.headers.iter().collect();
                headers.sort();
                for (name, value) in headers {
                    println!("{name}: {value}");
                }
                println!();
            }
            output_response_body(cli, &response.body)?;
        }
    }

    Ok(())
}

/// Summarize a payment on stderr so stdout stays the response body.
pub fn print_payment_summary(
    cli: &Cli,
    config: &Config,
    payment: &PaymentPayload,
    settlement: Option<&SettlementResponse>,
) {
    if !cli.should_show_output() {
        return;
    }

    let amount = payment
        .accepted
        .amount()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "?".to_string());
    eprintln!(
        "{} {} micro-STX on {}",
        Colors::success("Paid"),
        Colors::amount(&amount),
        Colors::network(config.network.display_name())
    );

    let txid = settlement
        .filter(|s| !s.transaction.is_empty())
        .map(|s| s.transaction.clone())
        .or_else(|| payment.payload.txid().ok());
    if let Some(txid) = txid {
        eprintln!("  {} {}", Colors::key("TxID:"), Colors::dim(&config.network.tx_url(&txid)));
    }

    if let Some(settlement) = settlement {
        if !settlement.success {
            eprintln!(
                "  {} {}",
                Colors::warning("Settlement failed:"),
                settlement.error_reason.as_deref().unwrap_or("no reason given")
            );
        }
    }
}

/// Print what a payment would do.
pub fn print_dry_run(cli: &Cli, info: &DryRunInfo) -> Result<()> {
    match cli.output_format.resolve() {
        OutputFormat::Json => write_output(cli, serde_json::to_string_pretty(info)?),
        OutputFormat::Yaml => write_output(cli, serde_yaml::to_string(info)?),
        _ => {
            let text = format!(
                "[DRY RUN] Payment would be made:\n\
                 Provider: {}\n\
                 Network:  {}\n\
                 Amount:   {} micro-STX\n\
                 From:     {}\n\
                 To:       {}\n\
                 Memo:     {}",
                info.provider, info.network, info.amount, info.from, info.to, info.memo
            );
            write_output(cli, text)
        }
    }
}

/// Write response body to file or stdout
pub fn output_response_body(cli: &Cli, body: &[u8]) -> Result<()> {
    if let Some(output_file) = &cli.output {
        std::fs::write(output_file, body).context("Failed to write output file")?;
        if cli.is_verbose() && cli.should_show_output() {
            eprintln!("Saved to: {output_file}");
        }
    } else {
        use std::io::Write;
        let mut stdout = std::io::stdout();
        stdout
            .write_all(body)
            .context("Failed to write response to stdout")?;
        stdout.write_all(b"\n").context("Failed to write newline")?;
    }
    Ok(())
}

/// Write string output to file or stdout based on CLI options
pub fn write_output(cli: &Cli, content: impl AsRef<str>) -> Result<()> {
    let content = content.as_ref();
    if let Some(output_file) = &cli.output {
        std::fs::write(output_file, content).context("Failed to write output file")?;
        if cli.is_verbose() && cli.should_show_output() {
            eprintln!("Saved to: {output_file}");
        }
    } else {
        println!("{content}");
    }
    Ok(())
}

// ==================== Config Display Helpers ====================

/// Build configuration display data for all output formats.
///
/// The key is never included; only the address derived from it.
pub fn build_config_display(
    config: &Config,
    config_path: &Path,
    sender: Option<&StacksAddress>,
) -> serde_json::Value {
    json!({
        "config_path": config_path.display().to_string(),
        "network": config.network.as_str(),
        "node_url": config.node_url(),
        "fallback_recipient": config
            .fallback_recipient()
            .map(|p| p.to_string())
            .unwrap_or_default(),
        "fee": config.fee,
        "nonce": config.nonce,
        "timeout_secs": config.timeout().as_secs(),
        "max_amount": config.max_amount,
        "sender": sender.map(|a| a.to_string()),
    })
}
