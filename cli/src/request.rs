//! HTTP request handling for the CLI
//!
//! Turns the curl-style flags into an [`HttpRequest`] and a configured
//! [`PaymentClient`].

use anyhow::Result;
use std::time::Duration;
use stx402_lib::{Config, HttpMethod, HttpRequest, PaymentClient, StacksSigner};

use crate::cli::Cli;

/// Context for making HTTP requests from CLI arguments
pub struct RequestContext {
    pub method: HttpMethod,
    pub body: Option<Vec<u8>>,
    pub cli: Cli,
}

impl RequestContext {
    /// Create a new request context from CLI arguments
    pub fn new(cli: Cli) -> Self {
        let (method, body) = get_request_method_and_body(&cli);
        Self { method, body, cli }
    }

    /// Build the request to send to `url`.
    pub fn build_request(&self, url: &str) -> Result<HttpRequest> {
        let headers = self
            .cli
            .parse_headers()
            .map_err(|e| anyhow::anyhow!("Invalid header: {}", e))?;

        let mut request = HttpRequest::new(self.method.clone(), url);
        if should_use_json_content_type(&self.cli)
            && !headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        {
            request = request.header("Content-Type", "application/json");
        }
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(body) = &self.body {
            request = request.body(body.clone());
        }
        Ok(request)
    }

    /// Build a payment client with the configured options
    pub fn build_client(&self, config: Config, signer: StacksSigner) -> PaymentClient {
        build_client(&self.cli, config, signer)
    }
}

/// Apply the curl-style flags to a new [`PaymentClient`].
pub fn build_client(cli: &Cli, config: Config, signer: StacksSigner) -> PaymentClient {
    let mut client = PaymentClient::new(config, signer);

    if let Some(seconds) = cli.max_time {
        client = client.timeout(Duration::from_secs(seconds));
    }
    if cli.follow_redirects {
        client = client.follow_redirects();
    }
    if cli.verbosity >= 3 {
        client = client.verbose();
    }
    if cli.dry_run {
        client = client.dry_run();
    }
    client
}

/// Determine the HTTP method and body based on CLI flags
fn get_request_method_and_body(cli: &Cli) -> (HttpMethod, Option<Vec<u8>>) {
    let body = cli
        .json
        .as_ref()
        .or(cli.data.as_ref())
        .map(|s| s.as_bytes().to_vec());

    // Explicit -X flag, or POST if body present, or GET
    let method = cli
        .method
        .as_deref()
        .map(HttpMethod::from)
        .unwrap_or_else(|| {
            if body.is_some() {
                HttpMethod::Post
            } else {
                HttpMethod::Get
            }
        });

    (method, body)
}

fn is_json_data(data: &str) -> bool {
    let trimmed = data.trim();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

fn should_use_json_content_type(cli: &Cli) -> bool {
    if cli.json.is_some() {
        return true;
    }
    if let Some(data) = &cli.data {
        return is_json_data(data);
    }
    false
}
