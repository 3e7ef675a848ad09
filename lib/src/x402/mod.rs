//! x402 v2 wire types: the 402 challenge, the payment proof and the
//! settlement receipt.
//!
//! Server-supplied objects (`resource` and each entry of `accepts`) are kept
//! as raw JSON so they can be echoed back in the proof exactly as received.

use crate::constants::{STX_ASSET, X402_VERSION};
use crate::error::{Result, Stx402Error};
use crate::http::HttpResponse;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ==================== Payment Header Constants ====================

/// Header carrying the base64 payment proof on the retried request
pub const PAYMENT_SIGNATURE_HEADER: &str = "payment-signature";

/// Header carrying the base64 settlement receipt (lowercase for matching)
pub const PAYMENT_RESPONSE_HEADER: &str = "payment-response";

/// Header carrying the base64 challenge when the body has none (lowercase for matching)
pub const PAYMENT_REQUIRED_HEADER: &str = "payment-required";

/// A payment amount in the asset's smallest unit (micro-STX for STX).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u128);

impl Amount {
    pub fn from_atomic_units(value: u128) -> Self {
        Self(value)
    }

    pub fn as_atomic_units(&self) -> u128 {
        self.0
    }

    /// Token transfers carry a u64 amount.
    pub fn try_as_u64(&self) -> Result<u64> {
        self.0
            .try_into()
            .map_err(|_| Stx402Error::InvalidAmount(self.0.to_string()))
    }
}

impl FromStr for Amount {
    type Err = Stx402Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Stx402Error::InvalidAmount(s.to_string()));
        }
        trimmed
            .parse::<u128>()
            .map(Amount)
            .map_err(|_| Stx402Error::InvalidAmount(s.to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Amount(value)
    }
}

/// Which asset an option asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKind {
    /// Native STX; also assumed when the option names no asset.
    Stx,
    Other(String),
}

/// The resource a challenge is for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceInfo(Map<String, Value>);

impl ResourceInfo {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn url(&self) -> Option<&str> {
        self.str_field("url")
    }

    pub fn description(&self) -> Option<&str> {
        self.str_field("description")
    }

    /// Raw JSON object as the server sent it.
    pub fn as_json(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ResourceInfo {
    fn from(map: Map<String, Value>) -> Self {
        ResourceInfo(map)
    }
}

/// One acceptable way to pay, as listed in `accepts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentOption(Map<String, Value>);

impl PaymentOption {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Amount to pay; servers send either a JSON integer or a decimal string.
    pub fn amount(&self) -> Result<Amount> {
        match self.0.get("amount") {
            Some(Value::String(s)) => s.parse(),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(|v| Amount(u128::from(v)))
                .ok_or_else(|| Stx402Error::InvalidAmount(n.to_string())),
            Some(other) => Err(Stx402Error::InvalidAmount(other.to_string())),
            None => Err(Stx402Error::InvalidAmount("<missing>".to_string())),
        }
    }

    /// Recipient: `address`, falling back to `payTo`. Empty strings count as absent.
    pub fn address(&self) -> Option<&str> {
        self.str_field("address")
            .filter(|s| !s.is_empty())
            .or_else(|| self.str_field("payTo").filter(|s| !s.is_empty()))
    }

    pub fn asset_kind(&self) -> AssetKind {
        match self.str_field("asset") {
            None => AssetKind::Stx,
            Some(asset) if asset.eq_ignore_ascii_case(STX_ASSET) => AssetKind::Stx,
            Some(asset) => AssetKind::Other(asset.to_string()),
        }
    }

    pub fn scheme(&self) -> Option<&str> {
        self.str_field("scheme")
    }

    pub fn network(&self) -> Option<&str> {
        self.str_field("network")
    }

    pub fn max_timeout_seconds(&self) -> Option<u64> {
        self.0.get("maxTimeoutSeconds").and_then(Value::as_u64)
    }

    /// Raw JSON object as the server sent it.
    pub fn as_json(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for PaymentOption {
    fn from(map: Map<String, Value>) -> Self {
        PaymentOption(map)
    }
}

/// Payment Required challenge (402 body or `payment-required` header)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x402_version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub resource: ResourceInfo,
    #[serde(default)]
    pub accepts: Vec<PaymentOption>,
}

impl PaymentRequired {
    /// Decode the base64 JSON form used by the `payment-required` header.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = STANDARD.decode(encoded.trim())?;
        Ok(serde_json::from_slice(&decoded)?)
    }

    pub fn to_base64(&self) -> Result<String> {
        Ok(STANDARD.encode(serde_json::to_vec(self)?))
    }
}

/// Inner payload of a Stacks payment proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StacksPayload {
    /// Hex-encoded signed transaction
    pub transaction: String,
}

impl StacksPayload {
    /// Transaction id of the carried transfer, as the chain will report it.
    pub fn txid(&self) -> Result<String> {
        let bytes = hex::decode(crate::utils::strip_0x_prefix(&self.transaction))?;
        Ok(hex::encode(crate::stacks::sha512_256(&bytes)))
    }
}

/// Payment proof (`payment-signature` header content)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u32,
    pub resource: ResourceInfo,
    pub accepted: PaymentOption,
    pub payload: StacksPayload,
}

impl PaymentPayload {
    pub fn new(resource: ResourceInfo, accepted: PaymentOption, transaction_hex: String) -> Self {
        Self {
            x402_version: X402_VERSION,
            resource,
            accepted,
            payload: StacksPayload {
                transaction: transaction_hex,
            },
        }
    }

    /// JSON, then standard base64: the header value.
    pub fn to_base64(&self) -> Result<String> {
        Ok(STANDARD.encode(serde_json::to_vec(self)?))
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = STANDARD.decode(encoded.trim())?;
        Ok(serde_json::from_slice(&decoded)?)
    }
}

/// Settlement receipt (`payment-response` header content)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(default)]
    pub transaction: String,
    #[serde(default)]
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

impl SettlementResponse {
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = STANDARD.decode(encoded.trim())?;
        Ok(serde_json::from_slice(&decoded)?)
    }

    /// Receipt attached to a response, if the server sent a readable one.
    pub fn from_response(response: &HttpResponse) -> Option<Self> {
        let header = response.get_header(PAYMENT_RESPONSE_HEADER)?;
        match Self::from_base64(header) {
            Ok(settlement) => Some(settlement),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable payment-response header");
                None
            }
        }
    }
}

/// Extract the challenge from a 402 response.
///
/// The JSON body is preferred. When the body is absent, is not JSON, or has
/// no `resource`, the base64 `payment-required` header is decoded instead.
pub fn payment_requirements_from_response(response: &HttpResponse) -> Result<PaymentRequired> {
    let body_error = if response.body.iter().all(u8::is_ascii_whitespace) {
        "empty body".to_string()
    } else {
        match serde_json::from_slice::<PaymentRequired>(&response.body) {
            Ok(requirements) => {
                tracing::debug!("payment requirements read from response body");
                return Ok(requirements);
            }
            Err(e) => e.to_string(),
        }
    };

    let Some(header) = response.get_header(PAYMENT_REQUIRED_HEADER) else {
        return Err(Stx402Error::missing_requirements(format!(
            "no usable JSON body ({body_error}) and no {PAYMENT_REQUIRED_HEADER} header"
        )));
    };

    let requirements = PaymentRequired::from_base64(header).map_err(|e| {
        Stx402Error::missing_requirements(format!(
            "no usable JSON body ({body_error}) and the {PAYMENT_REQUIRED_HEADER} header could not be decoded: {e}"
        ))
    })?;
    tracing::debug!("payment requirements read from {PAYMENT_REQUIRED_HEADER} header");
    Ok(requirements)
}
