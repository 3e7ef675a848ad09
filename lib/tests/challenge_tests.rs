//! Integration tests for the 402 challenge/retry cycle

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stx402_lib::x402::{PAYMENT_REQUIRED_HEADER, PAYMENT_RESPONSE_HEADER, PAYMENT_SIGNATURE_HEADER};
use stx402_lib::{
    Config, HttpMethod, HttpRequest, HttpResponse, PaymentChallengeHandler, PaymentClient,
    PaymentPayload, PaymentResult, Result, StacksProvider, StacksSigner, Stx402Error, Transport,
};

const KEY: &str = "000000000000000000000000000000000000000000000000000000000000000101";
const PAY_TO: &str = "ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQYAC0RQ";

/// Replays canned responses in order and records every request it is given.
#[derive(Default)]
struct RecordingTransport {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    fn with(responses: Vec<Result<HttpResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request to {}", request.url))
    }
}

/// Never answers.
struct HangingTransport;

#[async_trait]
impl Transport for HangingTransport {
    async fn send(&self, _request: &HttpRequest) -> Result<HttpResponse> {
        std::future::pending().await
    }
}

fn response(status: u32, body: &str) -> HttpResponse {
    HttpResponse {
        status_code: status,
        headers: HashMap::new(),
        body: body.as_bytes().to_vec(),
    }
}

fn challenge_body() -> String {
    json!({
        "x402Version": 2,
        "resource": {"name": "AI Chat", "url": "/api/ai/chat"},
        "accepts": [
            {"scheme": "exact", "network": "stacks:2147483648", "amount": "100000", "address": PAY_TO},
            {"scheme": "exact", "network": "stacks:2147483648", "amount": "1", "address": PAY_TO}
        ]
    })
    .to_string()
}

fn pinned_config() -> Config {
    Config::builder().with_fee(180u64).with_nonce(0u64).build().unwrap()
}

fn handler(transport: Arc<RecordingTransport>) -> PaymentChallengeHandler {
    let signer = Arc::new(StacksSigner::from_hex(KEY).unwrap());
    let provider = StacksProvider::new(signer, pinned_config(), transport.clone());
    PaymentChallengeHandler::new(transport, Arc::new(provider))
}

fn chat_request() -> HttpRequest {
    HttpRequest::post_json(
        "http://localhost:3000/api/ai/chat",
        &json!({"message": "Explain x402 in one sentence.", "model": "gpt-3.5-turbo"}),
    )
    .unwrap()
    .header("X-Trace", "abc")
}

fn proof_of(request: &HttpRequest) -> PaymentPayload {
    let header = request
        .get_header(PAYMENT_SIGNATURE_HEADER)
        .expect("retry should carry the proof header");
    PaymentPayload::from_base64(header).unwrap()
}

#[tokio::test]
async fn test_ai_chat_scenario() {
    let transport = RecordingTransport::with(vec![Ok(response(
        200,
        r#"{"response": "x402 lets servers charge per request.", "payment": {"transactionId": "0xabc"}}"#,
    ))]);
    let original = chat_request();

    let retried = handler(transport.clone())
        .handle_challenge(Ok(response(402, &challenge_body())), &original)
        .await
        .unwrap();

    assert_eq!(retried.status_code, 200);
    let body: serde_json::Value = retried.json().unwrap();
    assert_eq!(body["payment"]["transactionId"], "0xabc");

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let retry = &requests[0];

    // Same request plus exactly one header
    assert_eq!(retry.method, HttpMethod::Post);
    assert_eq!(retry.url, original.url);
    assert_eq!(retry.body, original.body);
    assert_eq!(retry.headers.len(), original.headers.len() + 1);
    assert_eq!(&retry.headers[..original.headers.len()], &original.headers[..]);

    let proof = proof_of(retry);
    assert_eq!(proof.x402_version, 2);
    assert_eq!(proof.resource.name(), Some("AI Chat"));
    assert_eq!(proof.accepted.amount().unwrap().as_atomic_units(), 100_000);

    let tx = hex::decode(&proof.payload.transaction).unwrap();
    assert_eq!(tx.len(), 180);
    assert_eq!(&tx[138..146], &100_000u64.to_be_bytes());
}

#[tokio::test]
async fn test_proof_echoes_first_option_verbatim() {
    let body = challenge_body();
    let first = serde_json::from_str::<serde_json::Value>(&body).unwrap()["accepts"][0].clone();
    let transport = RecordingTransport::with(vec![Ok(response(200, "{}"))]);

    handler(transport.clone())
        .handle_challenge(Ok(response(402, &body)), &chat_request())
        .await
        .unwrap();

    let header = transport.requests()[0]
        .get_header(PAYMENT_SIGNATURE_HEADER)
        .unwrap()
        .to_string();
    let decoded: serde_json::Value =
        serde_json::from_slice(&STANDARD.decode(header).unwrap()).unwrap();
    assert_eq!(decoded["accepted"], first);
    assert_eq!(decoded["x402Version"], 2);
}

#[tokio::test]
async fn test_missing_requirements_never_retries() {
    let cases = [
        ("empty body", response(402, "")),
        ("not json", response(402, "Payment Required")),
        ("no resource", response(402, r#"{"accepts": [{"amount": "1"}]}"#)),
        ("no options", response(402, r#"{"resource": {"name": "AI Chat"}, "accepts": []}"#)),
    ];

    for (name, challenge) in cases {
        let transport = RecordingTransport::with(vec![]);
        let err = handler(transport.clone())
            .handle_challenge(Ok(challenge), &chat_request())
            .await
            .unwrap_err();
        assert!(
            matches!(err, Stx402Error::MissingPaymentRequirements(_)),
            "{name}: unexpected error {err:?}"
        );
        assert!(transport.requests().is_empty(), "{name}: no retry expected");
    }
}

#[tokio::test]
async fn test_requirements_from_fallback_header() {
    let encoded = STANDARD.encode(challenge_body());
    let mut challenge = response(402, "");
    challenge
        .headers
        .insert(PAYMENT_REQUIRED_HEADER.to_string(), encoded);
    let transport = RecordingTransport::with(vec![Ok(response(200, "{}"))]);

    handler(transport.clone())
        .handle_challenge(Ok(challenge), &chat_request())
        .await
        .unwrap();

    let proof = proof_of(&transport.requests()[0]);
    assert_eq!(proof.resource.url(), Some("/api/ai/chat"));
}

#[tokio::test]
async fn test_transport_error_is_returned_unchanged() {
    let transport = RecordingTransport::with(vec![]);
    let err = handler(transport.clone())
        .handle_challenge(
            Err(Stx402Error::Http("connection refused".to_string())),
            &chat_request(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Stx402Error::Http(ref m) if m == "connection refused"));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_second_402_is_returned_not_retried() {
    let transport = RecordingTransport::with(vec![Ok(response(402, &challenge_body()))]);

    let retried = handler(transport.clone())
        .handle_challenge(Ok(response(402, &challenge_body())), &chat_request())
        .await
        .unwrap();

    assert_eq!(retried.status_code, 402);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_retry_failure_is_wrapped() {
    let transport = RecordingTransport::with(vec![Err(Stx402Error::Http("reset".to_string()))]);

    let err = handler(transport)
        .handle_challenge(Ok(response(402, &challenge_body())), &chat_request())
        .await
        .unwrap_err();
    assert!(matches!(err, Stx402Error::RetryTransportFailure(_)));
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn test_retry_timeout() {
    let signer = Arc::new(StacksSigner::from_hex(KEY).unwrap());
    let transport = Arc::new(HangingTransport);
    let provider = StacksProvider::new(signer, pinned_config(), transport.clone());
    let handler = PaymentChallengeHandler::new(transport, Arc::new(provider))
        .timeout(Duration::from_millis(50));

    let err = handler
        .handle_challenge(Ok(response(402, &challenge_body())), &chat_request())
        .await
        .unwrap_err();
    assert!(matches!(err, Stx402Error::RetryTransportFailure(_)));
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_max_amount_refuses_before_signing() {
    let transport = RecordingTransport::with(vec![]);
    let err = handler(transport.clone())
        .with_max_amount(Some(99_999))
        .handle_challenge(Ok(response(402, &challenge_body())), &chat_request())
        .await
        .unwrap_err();

    assert!(matches!(err, Stx402Error::AmountExceedsMax { .. }));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_client_pays_and_reads_settlement() {
    let settlement = STANDARD.encode(
        json!({"success": true, "transaction": "0xabc", "network": "stacks:2147483648"}).to_string(),
    );
    let mut paid = response(200, r#"{"summary": "Blockchains are ledgers."}"#);
    paid.headers
        .insert(PAYMENT_RESPONSE_HEADER.to_string(), settlement);

    let transport = RecordingTransport::with(vec![Ok(response(402, &challenge_body())), Ok(paid)]);
    let client = PaymentClient::new(pinned_config(), StacksSigner::from_hex(KEY).unwrap())
        .with_transport(transport.clone())
        .header("X-Client", "test");

    let result = client
        .post_json(
            "http://localhost:3000/api/ai/summarize",
            &json!({"text": "Long text about blockchain..."}),
        )
        .await
        .unwrap();

    match result {
        PaymentResult::Paid {
            response,
            payment,
            settlement,
        } => {
            assert_eq!(response.status_code, 200);
            assert_eq!(payment.x402_version, 2);
            let settlement = settlement.expect("settlement header should decode");
            assert!(settlement.success);
            assert_eq!(settlement.transaction, "0xabc");
        }
        other => panic!("expected a paid result, got {other:?}"),
    }

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].get_header("X-Client"), Some("test"));
    assert!(requests[0].get_header(PAYMENT_SIGNATURE_HEADER).is_none());
    assert!(requests[1].get_header(PAYMENT_SIGNATURE_HEADER).is_some());
}

#[tokio::test]
async fn test_client_passes_through_unchallenged_responses() {
    let transport = RecordingTransport::with(vec![Ok(response(200, "free"))]);
    let client = PaymentClient::new(pinned_config(), StacksSigner::from_hex(KEY).unwrap())
        .with_transport(transport.clone());

    let result = client.get("http://localhost:3000/health").await.unwrap();
    assert!(matches!(result, PaymentResult::Success(ref r) if r.body == b"free"));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_client_dry_run_signs_nothing() {
    let transport = RecordingTransport::with(vec![Ok(response(402, &challenge_body()))]);
    let client = PaymentClient::new(pinned_config(), StacksSigner::from_hex(KEY).unwrap())
        .with_transport(transport.clone())
        .dry_run();

    let result = client.get("http://localhost:3000/api/ai/chat").await.unwrap();
    match result {
        PaymentResult::DryRun(info) => {
            assert_eq!(info.amount, "100000");
            assert_eq!(info.to, PAY_TO);
        }
        other => panic!("expected a dry run, got {other:?}"),
    }
    assert_eq!(transport.requests().len(), 1);
}
