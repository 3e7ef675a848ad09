//! HTTP transport: request/response types, a curl client, and the async
//! [`Transport`] seam the payment flow sends through.

use crate::constants::{APP_NAME, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::error::{Result, Stx402Error};
use async_trait::async_trait;
use curl::easy::{Easy2, Handler, WriteError};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// HTTP request methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    /// Custom HTTP method (e.g., "CONNECT", "TRACE", or non-standard methods)
    Custom(String),
}

impl HttpMethod {
    /// Returns the method as an uppercase string.
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Custom(s) => s,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            _ => HttpMethod::Custom(s.to_uppercase()),
        })
    }
}

impl From<&str> for HttpMethod {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(method) => method,
            Err(never) => match never {},
        }
    }
}

/// A request that can be sent, and replayed, verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Header order is preserved; names keep the caller's casing.
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: impl Into<HttpMethod>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// POST with a JSON body and matching Content-Type.
    pub fn post_json<T: serde::Serialize>(url: impl Into<String>, body: &T) -> Result<Self> {
        Ok(Self::new(HttpMethod::Post, url)
            .header("Content-Type", "application/json")
            .body(serde_json::to_vec(body)?))
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Copy of this request with `name` set to `value`; everything else is untouched.
    ///
    /// Headers already carrying that name (case-insensitive) are dropped, so
    /// the copy holds exactly one.
    pub fn with_header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let mut request = self.clone();
        request.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        request.header(name, value)
    }

    /// First header value with this name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u32,
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Convert the response body to a UTF-8 string.
    ///
    /// # Errors
    /// Returns an error if the body is not valid UTF-8.
    pub fn body_string(&self) -> Result<String> {
        Ok(String::from_utf8(self.body.clone())?)
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Check if this response indicates payment is required (HTTP 402).
    pub fn is_payment_required(&self) -> bool {
        self.status_code == 402
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Get a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.get(&name.to_lowercase())
    }
}

/// Sends HTTP requests for the payment flow.
///
/// Implementations report failures that happen before a response arrives as
/// errors; any response, whatever its status, is `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Send under a deadline; a miss becomes [`Stx402Error::Timeout`].
pub async fn send_with_timeout(
    transport: &dyn Transport,
    request: &HttpRequest,
    timeout: Duration,
) -> Result<HttpResponse> {
    match tokio::time::timeout(timeout, transport.send(request)).await {
        Ok(result) => result,
        Err(_) => Err(Stx402Error::Timeout(timeout)),
    }
}

struct ResponseHandler {
    data: Vec<u8>,
    headers: HashMap<String, String>,
}

impl ResponseHandler {
    fn new() -> Self {
        Self {
            data: Vec::new(),
            headers: HashMap::new(),
        }
    }
}

impl Handler for ResponseHandler {
    fn write(&mut self, data: &[u8]) -> std::result::Result<usize, WriteError> {
        self.data.extend_from_slice(data);
        Ok(data.len())
    }

    fn header(&mut self, header: &[u8]) -> bool {
        if let Ok(header_str) = std::str::from_utf8(header) {
            if let Some((key, value)) = header_str.split_once(':') {
                self.headers
                    .insert(key.trim().to_lowercase(), value.trim().to_string());
            }
        }
        true
    }
}

/// Builder for configuring HTTP clients.
#[must_use]
pub struct HttpClientBuilder {
    verbose: bool,
    timeout: Option<Duration>,
    follow_redirects: bool,
    user_agent: Option<String>,
    headers: Vec<(String, String)>,
}

impl HttpClientBuilder {
    /// Create a new HTTP client builder with default settings.
    pub fn new() -> Self {
        Self {
            verbose: false,
            timeout: None,
            follow_redirects: false,
            user_agent: None,
            headers: Vec::new(),
        }
    }

    /// Enable curl's own verbose output on stderr.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Add multiple headers at once.
    pub fn headers(mut self, headers: &[(String, String)]) -> Self {
        self.headers.extend_from_slice(headers);
        self
    }

    /// Build the configured HTTP client.
    pub fn build(self) -> Result<HttpClient> {
        let mut client = HttpClient::new();

        if self.verbose {
            client.curl.verbose(true)?;
        }
        if let Some(timeout) = self.timeout {
            client.curl.timeout(timeout)?;
        }
        if self.follow_redirects {
            client.curl.follow_location(true)?;
        }
        if let Some(ref ua) = self.user_agent {
            client.curl.useragent(ua)?;
        }
        if !self.headers.is_empty() {
            client.set_headers(&self.headers)?;
        }

        Ok(client)
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A blocking curl handle for a single request.
pub struct HttpClient {
    curl: Easy2<ResponseHandler>,
}

impl HttpClient {
    fn new() -> Self {
        Self {
            curl: Easy2::new(ResponseHandler::new()),
        }
    }

    fn set_headers(&mut self, headers: &[(String, String)]) -> Result<()> {
        let mut list = curl::easy::List::new();
        for (name, value) in headers {
            list.append(&format!("{name}: {value}"))?;
        }
        self.curl.http_headers(list)?;
        Ok(())
    }

    fn set_body(&mut self, body: Option<&[u8]>) -> Result<()> {
        if let Some(data) = body {
            self.curl.post_field_size(data.len() as u64)?;
            self.curl.post_fields_copy(data)?;
        }
        Ok(())
    }

    /// Perform a request with the specified HTTP method and optional body.
    pub fn request(
        &mut self,
        method: &HttpMethod,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse> {
        self.curl.url(url)?;

        match method {
            HttpMethod::Get => {
                self.curl.get(true)?;
            }
            HttpMethod::Post => {
                self.curl.post(true)?;
                self.set_body(body)?;
            }
            HttpMethod::Head => {
                self.curl.nobody(true)?;
            }
            HttpMethod::Options => {
                self.curl.custom_request("OPTIONS")?;
            }
            other => {
                self.curl.custom_request(other.as_str())?;
                self.set_body(body)?;
            }
        }

        self.perform()
    }

    fn perform(&mut self) -> Result<HttpResponse> {
        self.curl.perform()?;

        let status_code = self.curl.response_code()?;
        let handler = self.curl.get_mut();

        Ok(HttpResponse {
            status_code,
            headers: std::mem::take(&mut handler.headers),
            body: std::mem::take(&mut handler.data),
        })
    }
}

/// [`Transport`] backed by curl, run on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    timeout: Duration,
    verbose: bool,
    follow_redirects: bool,
    user_agent: String,
}

impl CurlTransport {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            verbose: false,
            follow_redirects: false,
            user_agent: format!("{APP_NAME}/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    fn perform_blocking(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut client = HttpClientBuilder::new()
            .verbose(self.verbose)
            .timeout(self.timeout)
            .follow_redirects(self.follow_redirects)
            .user_agent(&self.user_agent)
            .headers(&request.headers)
            .build()?;

        client
            .request(&request.method, &request.url, request.body.as_deref())
            .map_err(|e| match e {
                Stx402Error::Curl(ref curl_err) if curl_err.is_operation_timedout() => {
                    Stx402Error::Timeout(self.timeout)
                }
                other => other,
            })
    }
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for CurlTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let transport = self.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || transport.perform_blocking(&request))
            .await
            .map_err(|e| Stx402Error::Http(format!("HTTP worker failed: {e}")))?
    }
}
