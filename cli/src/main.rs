//! stx402 CLI - A curl-like tool that pays x402 challenges with STX

mod cli;
mod colors;
mod config_utils;
mod demo;
mod errors;
mod exit_codes;
mod output;
mod request;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use cli::{Cli, ColorMode, Commands, OutputFormat};
use colored::control;
use colors::Colors;
use exit_codes::ExitCode;
use std::path::PathBuf;
use std::time::Duration;
use stx402_lib::{Config, PaymentResult};
use tracing_subscriber::EnvFilter;

use config_utils::{load_config, load_signer};
use output::{build_config_display, handle_response, print_dry_run, print_payment_summary, write_output};
use request::RequestContext;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("Interrupted");
        std::process::exit(ExitCode::Interrupted.code());
    }) {
        eprintln!("Warning: could not install Ctrl+C handler: {e}");
    }

    let result = run().await;

    if let Err(e) = result {
        eprintln!("{}", errors::format_error_with_suggestion(&e));
        ExitCode::from(&e).exit();
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_color_support(&cli);
    init_tracing(&cli);

    if let Some(ref command) = cli.command {
        return handle_command(&cli, command).await;
    }

    if cli.url.is_none() {
        Cli::command().print_help()?;
        return Ok(());
    }

    make_request(cli).await
}

/// Handle CLI subcommands
async fn handle_command(cli: &Cli, command: &Commands) -> Result<()> {
    match command {
        Commands::Config { output_format } => show_config(cli, *output_format),
        Commands::Address => show_address(cli),
        Commands::Demo { api_base, delay_ms } => {
            let config = load_config(cli)?;
            let signer = load_signer(cli)?;
            let client = request::build_client(cli, config, signer);
            demo::demo_command(&client, api_base, Duration::from_millis(*delay_ms)).await
        }
        Commands::Version => show_version(),
    }
}

/// Make an HTTP request, paying a 402 challenge if one comes back.
async fn make_request(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let signer = load_signer(&cli)?;
    let request_ctx = RequestContext::new(cli);

    let url = request_ctx
        .cli
        .url
        .as_deref()
        .context("URL is required. Run 'stx402 --help' for usage.")?;
    let request = request_ctx.build_request(url)?;
    let client = request_ctx.build_client(config.clone(), signer);

    tracing::info!(method = %request_ctx.method, url, "sending request");

    match client.send(request).await? {
        PaymentResult::Success(response) => handle_response(&request_ctx.cli, &response),
        PaymentResult::Paid {
            response,
            payment,
            settlement,
        } => {
            print_payment_summary(&request_ctx.cli, &config, &payment, settlement.as_ref());
            if response.is_payment_required() {
                anyhow::bail!("Payment was not accepted by the server (HTTP 402)");
            }
            handle_response(&request_ctx.cli, &response)
        }
        PaymentResult::DryRun(info) => print_dry_run(&request_ctx.cli, &info),
    }
}

// ==================== Config Display ====================

fn show_config(cli: &Cli, output_format: OutputFormat) -> Result<()> {
    let config = load_config(cli)?;
    let config_path = match cli.config {
        Some(ref path) => PathBuf::from(path),
        None => Config::default_config_path()?,
    };

    // The sender is shown when a key is available; the key itself never is.
    let sender = load_signer(cli)
        .ok()
        .map(|signer| signer.address(config.network));

    match output_format.resolve() {
        OutputFormat::Auto => unreachable!("Auto should be resolved"),
        OutputFormat::Json => {
            let display_data = build_config_display(&config, &config_path, sender.as_ref());
            write_output(cli, serde_json::to_string_pretty(&display_data)?)?;
        }
        OutputFormat::Yaml => {
            let display_data = build_config_display(&config, &config_path, sender.as_ref());
            write_output(cli, serde_yaml::to_string(&display_data)?)?;
        }
        OutputFormat::Text => {
            println!("Config file: {}", Colors::path(&config_path.display().to_string()));
            println!();
            println!(
                "  {} {}",
                Colors::key("network:"),
                Colors::network(config.network.display_name())
            );
            println!("  {} {}", Colors::key("node_url:"), config.node_url());
            if let Ok(recipient) = config.fallback_recipient() {
                println!(
                    "  {} {}",
                    Colors::key("fallback_recipient:"),
                    Colors::address(&recipient.to_string())
                );
            }
            let fee = config
                .fee
                .map(|f| f.to_string())
                .unwrap_or_else(|| "from node fee rate".to_string());
            println!("  {} {}", Colors::key("fee:"), fee);
            let nonce = config
                .nonce
                .map(|n| n.to_string())
                .unwrap_or_else(|| "from node".to_string());
            println!("  {} {}", Colors::key("nonce:"), nonce);
            println!("  {} {}s", Colors::key("timeout:"), config.timeout().as_secs());
            let max_amount = config
                .max_amount
                .map(|m| m.to_string())
                .unwrap_or_else(|| "unlimited".to_string());
            println!("  {} {}", Colors::key("max_amount:"), Colors::amount(&max_amount));
            match sender {
                Some(address) => println!(
                    "  {} {}",
                    Colors::key("sender:"),
                    Colors::address(&address.to_string())
                ),
                None => println!(
                    "  {} {}",
                    Colors::key("sender:"),
                    Colors::dim("no key (set CLIENT_PRIVATE_KEY)")
                ),
            }
        }
    }

    Ok(())
}

// ==================== Simple Commands ====================

/// Print the address payments are sent from on the configured network.
fn show_address(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let signer = load_signer(cli)?;
    let address = signer.address(config.network);

    if cli.is_verbose() && cli.should_show_output() {
        eprintln!(
            "{} {}",
            Colors::dim("Network:"),
            Colors::network(config.network.display_name())
        );
    }
    println!("{}", Colors::address(&address.to_string()));
    Ok(())
}

/// Show version information
fn show_version() -> Result<()> {
    const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

    println!("stx402 CLI: v{CLI_VERSION}");
    println!("stx402-lib: v{}", stx402_lib::VERSION);

    Ok(())
}

/// Initialize color support based on user preference and NO_COLOR env var
fn init_color_support(cli: &Cli) {
    use std::io::IsTerminal;
    let no_color_env = std::env::var_os("NO_COLOR").is_some();

    match cli.color {
        ColorMode::Always => control::set_override(true),
        mode if !color_enabled(mode, no_color_env, std::io::stdout().is_terminal()) => {
            control::set_override(false)
        }
        _ => {}
    }
}

/// Whether a stream gets ANSI colors under `mode`.
fn color_enabled(mode: ColorMode, no_color_env: bool, is_terminal: bool) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => !no_color_env && is_terminal,
    }
}

/// Log to stderr, filtered by `RUST_LOG` or else by `-v`/`-q`.
fn init_tracing(cli: &Cli) {
    use std::io::IsTerminal;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(cli.verbosity, cli.quiet)));
    let ansi = color_enabled(
        cli.color,
        std::env::var_os("NO_COLOR").is_some(),
        std::io::stderr().is_terminal(),
    );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .init();
}

fn log_level(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0, false), "warn");
        assert_eq!(log_level(1, false), "info");
        assert_eq!(log_level(2, false), "debug");
        assert_eq!(log_level(5, false), "trace");
        assert_eq!(log_level(3, true), "error");
    }

    #[test]
    fn test_color_enabled() {
        let test_cases = [
            (ColorMode::Always, true, false, true),
            (ColorMode::Never, false, true, false),
            (ColorMode::Auto, false, true, true),
            (ColorMode::Auto, true, true, false),
            (ColorMode::Auto, false, false, false),
        ];

        for (mode, no_color_env, is_terminal, expected) in test_cases {
            assert_eq!(
                color_enabled(mode, no_color_env, is_terminal),
                expected,
                "{mode:?} NO_COLOR={no_color_env} tty={is_terminal}"
            );
        }
    }
}
