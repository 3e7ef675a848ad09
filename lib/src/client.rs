//! Library API - high-level client for making payment-enabled HTTP requests
//!
//! This module provides the main entry point for making HTTP requests with
//! automatic x402 payment handling. Requests answered with 402 Payment Required
//! are paid with an STX transfer and replayed.

use crate::challenge::PaymentChallengeHandler;
use crate::config::Config;
use crate::error::Result;
use crate::http::{send_with_timeout, CurlTransport, HttpRequest, HttpResponse, Transport};
use crate::payment_provider::{DryRunInfo, PaymentProvider};
use crate::providers::StacksProvider;
use crate::signer::StacksSigner;
use crate::x402::{PaymentPayload, SettlementResponse};
use std::sync::Arc;
use std::time::Duration;

/// Builder for making payment-enabled HTTP requests.
///
/// Requests that return a 402 Payment Required status are handed to a
/// [`PaymentChallengeHandler`], which signs an STX transfer for the server's
/// first payment option and retries the request with the proof attached.
///
/// # Example
/// ```no_run
/// # use stx402_lib::{Config, PaymentClient, StacksSigner};
/// # async fn example() -> stx402_lib::Result<()> {
/// let signer = StacksSigner::from_hex(&std::env::var("CLIENT_PRIVATE_KEY").unwrap())?;
/// let client = PaymentClient::new(Config::load_or_default(None::<&str>)?, signer)
///     .max_amount(1_000_000);
///
/// let result = client.get("http://localhost:3000/api/ai/chat").await?;
/// # Ok(())
/// # }
/// ```
pub struct PaymentClient {
    config: Config,
    signer: Arc<StacksSigner>,
    transport: Option<Arc<dyn Transport>>,
    provider: Option<Arc<dyn PaymentProvider>>,
    max_amount: Option<u128>,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    follow_redirects: bool,
    verbose: bool,
    dry_run: bool,
}

impl PaymentClient {
    /// Create a client that pays with `signer` on the configured network.
    pub fn new(config: Config, signer: StacksSigner) -> Self {
        let max_amount = config.max_amount.map(u128::from);
        Self {
            config,
            signer: Arc::new(signer),
            transport: None,
            provider: None,
            max_amount,
            headers: Vec::new(),
            timeout: None,
            follow_redirects: false,
            verbose: false,
            dry_run: false,
        }
    }

    /// Set the maximum amount (in micro-STX) willing to pay.
    ///
    /// If a payment request exceeds this amount, the request will fail
    /// with an `AmountExceedsMax` error.
    #[must_use]
    pub fn max_amount(mut self, amount: u128) -> Self {
        self.max_amount = Some(amount);
        self
    }

    /// Add a custom HTTP header to all requests.
    ///
    /// Can be called multiple times to add multiple headers.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Per-call timeout; overrides the config's `timeout_secs`.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable automatic following of HTTP redirects.
    #[must_use]
    pub fn follow_redirects(mut self) -> Self {
        self.follow_redirects = true;
        self
    }

    /// Enable verbose curl output for debugging.
    #[must_use]
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Enable dry-run mode.
    ///
    /// In dry-run mode, the challenge is negotiated but nothing is signed or
    /// retried. Returns `PaymentResult::DryRun` with payment details.
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Use `transport` for every request instead of curl.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Pay with `provider` instead of the built-in STX transfer.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn PaymentProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Perform a GET request to the specified URL.
    pub async fn get(&self, url: &str) -> Result<PaymentResult> {
        self.send(HttpRequest::get(url)).await
    }

    /// Perform a POST request with a JSON body.
    pub async fn post_json<T: serde::Serialize>(&self, url: &str, body: &T) -> Result<PaymentResult> {
        self.send(HttpRequest::post_json(url, body)?).await
    }

    fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or_else(|| self.config.timeout())
    }

    fn transport(&self) -> Arc<dyn Transport> {
        match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(
                CurlTransport::new()
                    .timeout(self.effective_timeout())
                    .verbose(self.verbose)
                    .follow_redirects(self.follow_redirects),
            ),
        }
    }

    fn handler(&self, transport: Arc<dyn Transport>) -> PaymentChallengeHandler {
        let provider = match &self.provider {
            Some(provider) => Arc::clone(provider),
            None => {
                let mut config = self.config.clone();
                config.timeout_secs = Some(self.effective_timeout().as_secs().max(1));
                Arc::new(StacksProvider::new(
                    Arc::clone(&self.signer),
                    config,
                    Arc::clone(&transport),
                ))
            }
        };
        PaymentChallengeHandler::new(transport, provider)
            .with_max_amount(self.max_amount)
            .timeout(self.effective_timeout())
    }

    /// Send `request`, paying for it if the server asks.
    pub async fn send(&self, request: HttpRequest) -> Result<PaymentResult> {
        let mut request = request;
        for (name, value) in &self.headers {
            request = request.header(name.clone(), value.clone());
        }

        let transport = self.transport();
        let response =
            send_with_timeout(transport.as_ref(), &request, self.effective_timeout()).await?;

        if !response.is_payment_required() {
            return Ok(PaymentResult::Success(response));
        }

        let handler = self.handler(transport);
        if self.dry_run {
            return Ok(PaymentResult::DryRun(handler.dry_run(&response)?));
        }

        let paid = handler.pay(&response, &request).await?;
        let settlement = SettlementResponse::from_response(&paid.response);
        Ok(PaymentResult::Paid {
            response: paid.response,
            payment: paid.payment,
            settlement,
        })
    }
}

/// The result of an HTTP request that may have required payment.
#[derive(Debug)]
pub enum PaymentResult {
    Success(HttpResponse),
    Paid {
        response: HttpResponse,
        payment: PaymentPayload,
        settlement: Option<SettlementResponse>,
    },

    /// Dry-run mode was enabled, so payment was not actually made.
    DryRun(DryRunInfo),
}

impl PaymentResult {
    /// The final response, if a request was actually completed.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            PaymentResult::Success(response) | PaymentResult::Paid { response, .. } => {
                Some(response)
            }
            PaymentResult::DryRun(_) => None,
        }
    }
}
