//! Stacks node API lookups needed to build a transfer.

use super::address::StacksAddress;
use crate::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use crate::error::{Result, Stx402Error};
use crate::http::{send_with_timeout, HttpRequest, Transport};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct AccountInfo {
    nonce: u64,
}

/// Client for the parts of the node API a payment needs.
#[derive(Clone)]
pub struct NodeClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl NodeClient {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, "querying stacks node");

        let response =
            send_with_timeout(self.transport.as_ref(), &HttpRequest::get(&url), self.timeout)
                .await?;
        if !response.is_success() {
            return Err(Stx402Error::NodeApi(format!(
                "GET {url} returned HTTP {}: {}",
                response.status_code,
                String::from_utf8_lossy(&response.body).trim()
            )));
        }
        response
            .json()
            .map_err(|e| Stx402Error::NodeApi(format!("GET {url} returned invalid JSON: {e}")))
    }

    /// Next nonce for `address`.
    pub async fn account_nonce(&self, address: &StacksAddress) -> Result<u64> {
        let value = self
            .get_json(&format!("/v2/accounts/{address}?proof=0"))
            .await?;
        let info: AccountInfo = serde_json::from_value(value)
            .map_err(|e| Stx402Error::NodeApi(format!("unexpected account response: {e}")))?;
        Ok(info.nonce)
    }

    /// Fee rate for token transfers, in micro-STX per byte.
    pub async fn transfer_fee_rate(&self) -> Result<u64> {
        let value = self.get_json("/v2/fees/transfer").await?;
        match &value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| Stx402Error::NodeApi(format!("unexpected fee rate response: {value}")))
    }

    /// Fee for a transaction of `tx_len` bytes at the current rate.
    pub async fn estimate_fee(&self, tx_len: usize) -> Result<u64> {
        let rate = self.transfer_fee_rate().await?;
        rate.checked_mul(tx_len as u64)
            .ok_or_else(|| Stx402Error::NodeApi(format!("fee rate {rate} overflows")))
    }
}
