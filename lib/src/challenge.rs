//! Answering a 402 challenge: pick an option, pay, replay the request.

use crate::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use crate::error::{Result, Stx402Error};
use crate::http::{send_with_timeout, HttpRequest, HttpResponse, Transport};
use crate::negotiator::PaymentNegotiator;
use crate::payment_provider::{DryRunInfo, PaymentProvider};
use crate::x402::{
    payment_requirements_from_response, PaymentOption, PaymentPayload, PaymentRequired,
    PAYMENT_SIGNATURE_HEADER,
};
use std::sync::Arc;
use std::time::Duration;

/// The retried response together with the proof that was attached to it.
#[derive(Debug, Clone)]
pub struct PaidResponse {
    pub response: HttpResponse,
    pub payment: PaymentPayload,
}

/// Turns a 402 response into a paid retry of the original request.
///
/// One challenge, one payment, one retry. A server that answers the retry
/// with another 402 gets that response handed back, not a second payment.
pub struct PaymentChallengeHandler {
    transport: Arc<dyn Transport>,
    provider: Arc<dyn PaymentProvider>,
    negotiator: PaymentNegotiator,
    timeout: Duration,
}

impl PaymentChallengeHandler {
    pub fn new(transport: Arc<dyn Transport>, provider: Arc<dyn PaymentProvider>) -> Self {
        Self {
            transport,
            provider,
            negotiator: PaymentNegotiator::new(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Refuse challenges asking for more than `amount` micro-STX.
    #[must_use]
    pub fn with_max_amount(mut self, amount: Option<u128>) -> Self {
        self.negotiator = self.negotiator.with_max_amount(amount);
        self
    }

    /// Deadline for the paid retry.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Handle the outcome of a request that may have been challenged.
    ///
    /// A transport failure is passed through untouched and a non-402
    /// response is refused with [`Stx402Error::NotAPaymentChallenge`].
    pub async fn handle_challenge(
        &self,
        outcome: Result<HttpResponse>,
        original: &HttpRequest,
    ) -> Result<HttpResponse> {
        let challenge = outcome?;
        Ok(self.pay(&challenge, original).await?.response)
    }

    /// Pay `challenge` and replay `original` with the proof attached.
    pub async fn pay(&self, challenge: &HttpResponse, original: &HttpRequest) -> Result<PaidResponse> {
        let (requirements, option) = self.negotiate(challenge)?;

        let payment = self
            .provider
            .create_payment(&requirements, &option)
            .await
            .map_err(construction_error)?;
        let proof = payment.to_base64().map_err(construction_error)?;

        let retry = original.with_header(PAYMENT_SIGNATURE_HEADER, proof);
        tracing::debug!(method = %retry.method, url = %retry.url, "retrying request with payment");

        let response = send_with_timeout(self.transport.as_ref(), &retry, self.timeout)
            .await
            .map_err(|e| Stx402Error::RetryTransportFailure(Box::new(e)))?;

        if response.is_payment_required() {
            tracing::warn!("server answered the paid request with another 402");
        } else {
            tracing::info!(status = response.status_code, "paid request completed");
        }
        Ok(PaidResponse { response, payment })
    }

    /// Describe the payment `challenge` would trigger, signing nothing.
    pub fn dry_run(&self, challenge: &HttpResponse) -> Result<DryRunInfo> {
        let (_, option) = self.negotiate(challenge)?;
        self.provider.dry_run(&option)
    }

    fn negotiate(&self, challenge: &HttpResponse) -> Result<(PaymentRequired, PaymentOption)> {
        if !challenge.is_payment_required() {
            return Err(Stx402Error::NotAPaymentChallenge(Box::new(challenge.clone())));
        }

        let requirements = payment_requirements_from_response(challenge)?;
        let (option, amount) = self.negotiator.select(&requirements)?;
        tracing::info!(
            resource = requirements.resource.name().or(requirements.resource.url()).unwrap_or("-"),
            amount = %amount,
            pay_to = option.address().unwrap_or("(fallback)"),
            provider = self.provider.name(),
            "payment required"
        );

        if let Some(network) = option.network() {
            if !self.provider.supports_network(network) {
                return Err(Stx402Error::construction(format!(
                    "{} provider cannot pay on network '{network}'",
                    self.provider.name()
                )));
            }
        }

        let option = option.clone();
        Ok((requirements, option))
    }
}

/// Everything that goes wrong while building the proof is a construction
/// failure, except a timed-out node lookup.
fn construction_error(e: Stx402Error) -> Stx402Error {
    match e {
        Stx402Error::TransactionConstructionFailed(_) | Stx402Error::Timeout(_) => e,
        other => Stx402Error::construction(other.to_string()),
    }
}
