//! `stx402 demo`: the paid AI calls, run in sequence against a demo server.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::time::Duration;
use stx402_lib::{PaymentClient, PaymentResult};

use crate::colors::Colors;

/// One paid call and the response field worth showing.
pub struct DemoCall {
    pub title: &'static str,
    pub path: &'static str,
    pub body: fn() -> Value,
    pub label: &'static str,
    pub field: &'static str,
}

fn chat_body() -> Value {
    json!({"message": "Explain x402 in one sentence.", "model": "gpt-3.5-turbo"})
}

fn summarize_body() -> Value {
    json!({"text": "Long text about blockchain..."})
}

pub const DEMO_CALLS: &[DemoCall] = &[
    DemoCall {
        title: "AI chat",
        path: "/api/ai/chat",
        body: chat_body,
        label: "AI",
        field: "response",
    },
    DemoCall {
        title: "Summarization",
        path: "/api/ai/summarize",
        body: summarize_body,
        label: "Summary",
        field: "summary",
    },
];

/// What a demo call printed, pulled from the server's JSON.
#[derive(Debug, PartialEq, Eq)]
pub struct DemoOutcome {
    pub text: String,
    pub transaction_id: Option<String>,
}

impl DemoCall {
    pub fn url(&self, api_base: &str) -> String {
        format!("{}{}", api_base.trim_end_matches('/'), self.path)
    }

    /// Read the shown field and `payment.transactionId` from a response body.
    pub fn outcome(&self, body: &Value) -> Result<DemoOutcome> {
        let text = body
            .get(self.field)
            .and_then(Value::as_str)
            .with_context(|| format!("response has no '{}' field", self.field))?
            .to_string();
        let transaction_id = body
            .pointer("/payment/transactionId")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(DemoOutcome {
            text,
            transaction_id,
        })
    }

    async fn run(&self, client: &PaymentClient, api_base: &str) -> Result<DemoOutcome> {
        let result = client.post_json(&self.url(api_base), &(self.body)()).await?;
        let response = match result {
            PaymentResult::Paid { response, .. } | PaymentResult::Success(response) => response,
            PaymentResult::DryRun(info) => {
                anyhow::bail!("dry run: would pay {} micro-STX to {}", info.amount, info.to)
            }
        };
        if !response.is_success() {
            anyhow::bail!(
                "server answered HTTP {}: {}",
                response.status_code,
                String::from_utf8_lossy(&response.body).trim()
            );
        }
        let body: Value = response.json().context("response is not JSON")?;
        self.outcome(&body)
    }
}

/// Run every demo call, pausing `delay` between them.
///
/// A failed call is reported and the rest still run.
pub async fn demo_command(client: &PaymentClient, api_base: &str, delay: Duration) -> Result<()> {
    println!("{} {}", Colors::key("API:"), api_base);

    let mut failures = 0;
    for (i, call) in DEMO_CALLS.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        println!();
        println!(
            "{} {} (POST {})",
            Colors::info("Sending"),
            call.title,
            call.path
        );
        match call.run(client, api_base).await {
            Ok(outcome) => {
                println!("{}", Colors::success("Success!"));
                println!("  {} {}", Colors::key(&format!("{}:", call.label)), outcome.text);
                println!(
                    "  {} {}",
                    Colors::key("TxID:"),
                    outcome.transaction_id.as_deref().unwrap_or("-")
                );
            }
            Err(e) => {
                failures += 1;
                eprintln!("{} {e:#}", Colors::error("Failed:"));
            }
        }
    }

    println!();
    if failures > 0 {
        anyhow::bail!("{failures} of {} demo calls failed", DEMO_CALLS.len());
    }
    println!("{}", Colors::success("Demo complete"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_fixtures() {
        struct TestCase {
            call: &'static str,
            response: Value,
            expected: DemoOutcome,
        }

        let test_cases = vec![
            TestCase {
                call: "AI chat",
                response: json!({
                    "response": "x402 turns HTTP 402 into a pay-per-request protocol.",
                    "payment": {"transactionId": "0x7a1c"}
                }),
                expected: DemoOutcome {
                    text: "x402 turns HTTP 402 into a pay-per-request protocol.".to_string(),
                    transaction_id: Some("0x7a1c".to_string()),
                },
            },
            TestCase {
                call: "Summarization",
                response: json!({"summary": "Blockchains are shared ledgers.", "payment": {}}),
                expected: DemoOutcome {
                    text: "Blockchains are shared ledgers.".to_string(),
                    transaction_id: None,
                },
            },
        ];

        for tc in test_cases {
            let call = DEMO_CALLS.iter().find(|c| c.title == tc.call).unwrap();
            assert_eq!(call.outcome(&tc.response).unwrap(), tc.expected, "{}", tc.call);
        }
    }

    #[test]
    fn test_demo_requests() {
        let chat = &DEMO_CALLS[0];
        assert_eq!(
            chat.url("http://localhost:3000/"),
            "http://localhost:3000/api/ai/chat"
        );
        assert_eq!((chat.body)()["model"], "gpt-3.5-turbo");

        let summarize = &DEMO_CALLS[1];
        assert_eq!((summarize.body)()["text"], "Long text about blockchain...");
    }

    #[test]
    fn test_missing_field_is_error() {
        let err = DEMO_CALLS[0].outcome(&json!({"answer": "?"})).unwrap_err();
        assert!(err.to_string().contains("'response'"));
    }
}
