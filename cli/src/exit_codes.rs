//! Exit codes for the stx402 CLI.
//!
//! Following standard Unix conventions and providing specific codes
//! for different error categories to aid scripting and automation.

use stx402_lib::Stx402Error;

/// Exit codes for the stx402 CLI.
///
/// These codes follow Unix conventions where possible:
/// - 0: Success
/// - 1: General error
/// - 2: Misuse of shell command (e.g., invalid arguments)
/// - 130: Script terminated by Ctrl+C (128 + SIGINT)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// General/unknown error
    GeneralError = 1,

    /// Invalid usage (bad arguments, invalid flags)
    InvalidUsage = 2,

    /// Configuration error (missing config, invalid config)
    ConfigError = 3,

    /// Network/connection error
    NetworkError = 4,

    /// Payment could not be built or was not accepted
    PaymentFailed = 5,

    /// Payment exceeds the configured maximum
    AmountExceedsMax = 6,

    /// Key or address error
    AuthError = 8,

    /// Operation timed out
    Timeout = 10,

    /// Interrupted by signal (Ctrl+C)
    /// Standard Unix convention: 128 + signal number (SIGINT = 2)
    Interrupted = 130,
}

impl ExitCode {
    /// Convert to process exit code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Exit the process with this code
    pub fn exit(self) -> ! {
        std::process::exit(self.code())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.code()
    }
}

impl From<&anyhow::Error> for ExitCode {
    fn from(err: &anyhow::Error) -> Self {
        if let Some(lib_err) = err.downcast_ref::<Stx402Error>() {
            return ExitCode::from(lib_err);
        }

        // Check error message for common patterns
        let msg = err.to_string().to_lowercase();

        if msg.contains("timed out") || msg.contains("timeout") {
            ExitCode::Timeout
        } else if msg.contains("payment was not accepted") {
            ExitCode::PaymentFailed
        } else if msg.contains("invalid header") {
            ExitCode::InvalidUsage
        } else if msg.contains("connection") || msg.contains("network") {
            ExitCode::NetworkError
        } else if msg.contains("config") {
            ExitCode::ConfigError
        } else {
            ExitCode::GeneralError
        }
    }
}

impl From<&Stx402Error> for ExitCode {
    fn from(err: &Stx402Error) -> Self {
        if err.is_timeout() {
            return ExitCode::Timeout;
        }

        match err {
            // Configuration errors
            Stx402Error::ConfigMissing(_)
            | Stx402Error::InvalidConfig(_)
            | Stx402Error::NoConfigDir
            | Stx402Error::TomlParse(_) => ExitCode::ConfigError,

            Stx402Error::AmountExceedsMax { .. } => ExitCode::AmountExceedsMax,

            Stx402Error::MissingPaymentRequirements(_)
            | Stx402Error::TransactionConstructionFailed(_)
            | Stx402Error::InvalidAmount(_) => ExitCode::PaymentFailed,

            // Network errors
            Stx402Error::RetryTransportFailure(_)
            | Stx402Error::Http(_)
            | Stx402Error::NodeApi(_)
            | Stx402Error::Curl(_) => ExitCode::NetworkError,

            Stx402Error::InvalidKey(_) | Stx402Error::InvalidAddress(_) => ExitCode::AuthError,

            Stx402Error::UnknownNetwork(_) => ExitCode::InvalidUsage,

            _ => ExitCode::GeneralError,
        }
    }
}
