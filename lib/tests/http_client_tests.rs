//! Integration tests for HTTP client, builder and request types

use std::time::Duration;
use stx402_lib::http::HttpClientBuilder;
use stx402_lib::{HttpMethod, HttpRequest};

#[test]
fn test_http_client_builder_basic_builders() {
    let test_cases: Vec<Box<dyn Fn() -> HttpClientBuilder>> = vec![
        Box::new(HttpClientBuilder::default),
        Box::new(HttpClientBuilder::new),
        Box::new(|| HttpClientBuilder::new().verbose(true)),
        Box::new(|| HttpClientBuilder::new().timeout(Duration::from_secs(30))),
        Box::new(|| HttpClientBuilder::new().follow_redirects(true)),
        Box::new(|| HttpClientBuilder::new().user_agent("TestAgent/1.0")),
    ];

    for (i, builder_fn) in test_cases.iter().enumerate() {
        let client = builder_fn().build();
        assert!(client.is_ok(), "Builder test case {i} should succeed");
    }
}

#[test]
fn test_http_client_builder_maximal_config() {
    let headers = vec![
        ("X-Header-1".to_string(), "value1".to_string()),
        ("payment-signature".to_string(), "eyJ4NDAyVmVyc2lvbiI6Mn0=".to_string()),
    ];

    let client = HttpClientBuilder::new()
        .verbose(true)
        .timeout(Duration::from_millis(1500))
        .follow_redirects(true)
        .user_agent(String::from("MaximalAgent/2.0"))
        .headers(&headers)
        .build();
    assert!(client.is_ok());
}

#[test]
fn test_request_methods() {
    let test_cases = [
        ("GET", HttpMethod::Get),
        ("post", HttpMethod::Post),
        ("Put", HttpMethod::Put),
        ("DELETE", HttpMethod::Delete),
    ];

    for (input, expected) in test_cases {
        let request = HttpRequest::new(input, "http://localhost:3000/");
        assert_eq!(request.method, expected, "method parsed from {input}");
        assert_eq!(request.method.as_str(), input.to_uppercase());
    }
}

#[test]
fn test_post_json_request() {
    let request = HttpRequest::post_json(
        "http://localhost:3000/api/ai/summarize",
        &serde_json::json!({"text": "Long text about blockchain..."}),
    )
    .unwrap();

    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.get_header("content-type"), Some("application/json"));
    assert_eq!(
        request.body.as_deref(),
        Some(&br#"{"text":"Long text about blockchain..."}"#[..])
    );
}
