//! Payment provider abstraction.
//!
//! A provider turns a selected payment option into a signed proof. The
//! challenge handler only talks to this trait, so tests and alternative
//! chains can plug in their own.

use crate::error::Result;
use crate::x402::{PaymentOption, PaymentPayload, PaymentRequired};
use async_trait::async_trait;
use serde::Serialize;

/// What a payment would do, without signing anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DryRunInfo {
    pub provider: String,
    pub network: String,
    /// Micro-STX
    pub amount: String,
    pub asset: String,
    pub from: String,
    pub to: String,
    pub memo: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Get the name of this provider
    fn name(&self) -> &str;

    /// Check if this provider can pay on the given network identifier
    fn supports_network(&self, network: &str) -> bool;

    /// Build and sign a payment for `option`, one of `requirements.accepts`.
    async fn create_payment(
        &self,
        requirements: &PaymentRequired,
        option: &PaymentOption,
    ) -> Result<PaymentPayload>;

    /// Describe the payment `create_payment` would make.
    fn dry_run(&self, option: &PaymentOption) -> Result<DryRunInfo>;
}
