//! Colors for stx402 output, picked by what a value is rather than where it
//! is printed.

use colored::{ColoredString, Colorize};

/// Palette used by every command.
///
/// Addresses and warnings share yellow, amounts and success share green.
/// `--color never` and `NO_COLOR` turn all of it off.
pub struct Colors;

impl Colors {
    pub fn success(s: &str) -> ColoredString {
        s.green()
    }

    pub fn error(s: &str) -> ColoredString {
        s.red().bold()
    }

    pub fn warning(s: &str) -> ColoredString {
        s.yellow()
    }

    /// Progress lines and suggestion headers
    pub fn info(s: &str) -> ColoredString {
        s.cyan()
    }

    /// Config file locations
    pub fn path(s: &str) -> ColoredString {
        s.blue()
    }

    /// Stacks principals (sender, recipient)
    pub fn address(s: &str) -> ColoredString {
        s.yellow()
    }

    /// Micro-STX values
    pub fn amount(s: &str) -> ColoredString {
        s.green().bold()
    }

    pub fn network(s: &str) -> ColoredString {
        s.magenta()
    }

    /// Field labels such as `TxID:` or `network:`
    pub fn key(s: &str) -> ColoredString {
        s.bold()
    }

    /// Explorer links and placeholders
    pub fn dim(s: &str) -> ColoredString {
        s.dimmed()
    }
}
