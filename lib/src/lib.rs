//! stx402-lib - Library for paying x402 HTTP challenges with STX
//!
//! This library provides the core functionality for answering 402 Payment
//! Required responses on the Stacks network: challenge parsing, option
//! selection, STX transfer construction and signing, the HTTP transport and
//! configuration management.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod challenge;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod http;
pub mod negotiator;
pub mod network;
pub mod payment_provider;
pub mod providers;
pub mod signer;
pub mod stacks;
pub mod utils;
pub mod x402;

pub use challenge::{PaidResponse, PaymentChallengeHandler};
pub use client::{PaymentClient, PaymentResult};
pub use config::{Config, ConfigBuilder};
pub use error::{Result, Stx402Error};
pub use http::{CurlTransport, HttpMethod, HttpRequest, HttpResponse, Transport};
pub use negotiator::{select_payment_option, PaymentNegotiator};
pub use network::StacksNetwork;
pub use payment_provider::{DryRunInfo, PaymentProvider};
pub use providers::StacksProvider;
pub use signer::{StacksSigner, WalletOpts, WalletSource};
pub use stacks::{Principal, StacksAddress};
pub use x402::{PaymentOption, PaymentPayload, PaymentRequired, ResourceInfo, SettlementResponse};
