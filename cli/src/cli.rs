use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand, ValueEnum};
use http::header::HeaderName;
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use stx402_lib::StacksNetwork;

/// Green headers, cyan literals
fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
}

/// How response bodies and command output are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Text on a terminal, JSON when piped
    #[default]
    Auto,
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Resolve `Auto` to `Text` on a terminal and `Json` otherwise.
    pub fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Parser, Debug)]
#[command(name = "stx402")]
#[command(about = "A curl-like tool that pays x402 challenges with STX", long_about = None)]
#[command(version)]
#[command(styles = styles())]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// URL to request
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Configuration file path
    #[arg(short = 'C', long = "config", value_name = "PATH", global = true)]
    pub config: Option<String>,

    // Payment Options
    /// Maximum amount willing to pay (in micro-STX)
    #[arg(
        long,
        value_name = "AMOUNT",
        env = "STX402_MAX_AMOUNT",
        help_heading = "Payment Options"
    )]
    pub max_amount: Option<u64>,

    /// Network to pay on (mainnet or testnet); overrides the config file
    #[arg(
        long,
        value_name = "NETWORK",
        env = "STX402_NETWORK",
        global = true,
        help_heading = "Payment Options"
    )]
    pub network: Option<StacksNetwork>,

    /// Dry run mode - show what would be paid without signing anything
    #[arg(long, help_heading = "Payment Options")]
    pub dry_run: bool,

    // Display Options
    /// Verbosity level (can be used multiple times: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbosity", action = clap::ArgAction::Count, global = true, help_heading = "Display Options")]
    pub verbosity: u8,

    /// Control color output
    #[arg(
        long,
        value_name = "MODE",
        default_value = "auto",
        global = true,
        help_heading = "Display Options"
    )]
    pub color: ColorMode,

    /// Do not print log messages (aliases: -s, --silent)
    #[arg(
        short = 'q',
        long = "quiet",
        visible_short_alias = 's',
        visible_alias = "silent",
        global = true,
        help_heading = "Display Options"
    )]
    pub quiet: bool,

    /// Include HTTP headers in output
    #[arg(short = 'i', long = "include", help_heading = "Display Options")]
    pub include_headers: bool,

    /// Output format for response (auto detects: text for terminal, json for pipes)
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "auto",
        help_heading = "Display Options"
    )]
    pub output_format: OutputFormat,

    /// Write output to file
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Display Options"
    )]
    pub output: Option<String>,

    // HTTP Options
    /// Custom request method
    #[arg(
        short = 'X',
        long = "request",
        value_name = "METHOD",
        help_heading = "HTTP Options"
    )]
    pub method: Option<String>,

    /// Add custom header
    #[arg(
        short = 'H',
        long = "header",
        value_name = "HEADER",
        help_heading = "HTTP Options"
    )]
    pub headers: Vec<String>,

    /// Follow redirects
    #[arg(short = 'L', long = "location", help_heading = "HTTP Options")]
    pub follow_redirects: bool,

    /// Maximum time for each network call, including node lookups
    #[arg(
        short = 'm',
        long = "max-time",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP Options"
    )]
    pub max_time: Option<u64>,

    /// POST data
    #[arg(
        short = 'd',
        long = "data",
        value_name = "DATA",
        help_heading = "HTTP Options"
    )]
    pub data: Option<String>,

    /// Send JSON data with Content-Type header
    #[arg(long = "json", value_name = "JSON", help_heading = "HTTP Options")]
    pub json: Option<String>,

    // Wallet Options
    /// Raw private key (hex); defaults to the CLIENT_PRIVATE_KEY environment variable
    #[arg(
        long = "private-key",
        value_name = "KEY",
        global = true,
        help_heading = "Wallet Options"
    )]
    pub private_key: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the resolved configuration
    #[command(
        alias = "c",
        after_help = "\
Examples:
  stx402 config                          # Show current config
  stx402 config --output-format json     # Output as JSON
  stx402 config -C ./stx402.toml         # Show a specific file"
    )]
    Config {
        /// Output format
        #[arg(long, value_name = "FORMAT", default_value = "text")]
        output_format: OutputFormat,
    },

    /// Print the address payments are sent from
    #[command(after_help = "\
Examples:
  stx402 address                         # Address on the configured network
  stx402 address --network mainnet       # Mainnet address for the same key")]
    Address,

    /// Run the paid AI chat and summarization calls against a demo server
    #[command(after_help = "\
Examples:
  stx402 demo                            # Against http://localhost:3000
  stx402 demo --api-base http://host:3000 --delay-ms 0")]
    Demo {
        /// Base URL of the demo server
        #[arg(
            long,
            value_name = "URL",
            env = "STX402_API_BASE",
            default_value = "http://localhost:3000"
        )]
        api_base: String,

        /// Pause between calls, in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 1000)]
        delay_ms: u64,
    },

    /// Show version information
    #[command(alias = "v")]
    Version,
}

/// Split a `-H "Name: value"` argument and check both halves.
///
/// Names must be RFC 7230 tokens; values may not smuggle in CR, LF or NUL.
fn parse_header(raw: &str) -> Result<(String, String), String> {
    let Some((name, value)) = raw.split_once(':') else {
        return Err(format!("'{raw}' is not of the form 'Name: Value'"));
    };
    let (name, value) = (name.trim(), value.trim());

    if name.is_empty() {
        return Err(format!("'{raw}' has an empty header name"));
    }
    if let Err(e) = HeaderName::from_bytes(name.as_bytes()) {
        return Err(format!("'{name}' is not a valid header name: {e}"));
    }
    if let Some(c) = value.chars().find(|c| matches!(c, '\r' | '\n' | '\0')) {
        return Err(format!(
            "value of '{name}' contains a forbidden control character {c:?}"
        ));
    }
    Ok((name.to_string(), value.to_string()))
}

impl Cli {
    /// The `-H` headers in the order given.
    pub fn parse_headers(&self) -> Result<Vec<(String, String)>, String> {
        self.headers.iter().map(|h| parse_header(h)).collect()
    }

    /// `-v` or more
    pub fn is_verbose(&self) -> bool {
        self.verbosity >= 1
    }

    pub fn should_show_output(&self) -> bool {
        !self.quiet
    }
}
