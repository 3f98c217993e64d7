//! Guarded request execution
//!
//! Issues exactly one outbound HTTP call per probe. The host policy is
//! consulted before any connection is opened; there is no code path that
//! reaches the network without passing the gate. No retries, no redirect
//! following, response body capped by a streaming size check.

use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::Client;
use url::Url;

use crate::error::{Error, Result};
use crate::policy::{HostDecision, HostPolicy};
use crate::request::ExecutionRequest;

/// Default maximum response body size (10 MB)
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

/// Default request timeout (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum allowed timeout (10 minutes)
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// Minimum allowed timeout (1 second)
pub const MIN_TIMEOUT_SECS: u64 = 1;

/// Captured response of a successful exchange.
#[derive(Debug)]
pub struct ExecutionResult {
    /// HTTP status code
    pub status: u16,
    /// Canonical status text, empty for unknown codes
    pub status_text: String,
    /// Response headers in wire order
    pub headers: Vec<(String, String)>,
    /// Raw response body
    pub body: Vec<u8>,
    /// Wall-clock time of the exchange
    pub elapsed: Duration,
}

impl ExecutionResult {
    /// Body as UTF-8 text (lossy).
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
    }

    /// Body for display: pretty-printed when the content type says JSON and
    /// the body parses, verbatim text otherwise.
    pub fn body_display(&self) -> String {
        let text = self.body_string();
        if self.is_json() {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                    return pretty;
                }
            }
        }
        text
    }
}

/// HTTP executor with policy-gated access.
pub struct RequestExecutor {
    client: Client,
    policy: HostPolicy,
    max_response_bytes: usize,
}

impl RequestExecutor {
    /// Executor with default limits.
    pub fn new(policy: HostPolicy) -> Self {
        Self::with_config(
            policy,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            DEFAULT_MAX_RESPONSE_BYTES,
        )
    }

    /// Executor with explicit timeout and response-size cap. The timeout is
    /// clamped to a safe range; the connect timeout never exceeds 10s.
    pub fn with_config(policy: HostPolicy, timeout: Duration, max_response_bytes: usize) -> Self {
        let timeout = timeout.clamp(
            Duration::from_secs(MIN_TIMEOUT_SECS),
            Duration::from_secs(MAX_TIMEOUT_SECS),
        );
        let connect_timeout = timeout.min(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!("routekit/", env!("CARGO_PKG_VERSION")))
            // Redirects could route an allowed hostname to a blocked target,
            // so they are never followed.
            .redirect(reqwest::redirect::Policy::none())
            // Bodies are reported as received; the size cap applies to wire
            // bytes, so decompression stays off even if a compression
            // feature gets enabled elsewhere in the dependency graph.
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            policy,
            max_response_bytes,
        }
    }

    pub fn policy(&self) -> &HostPolicy {
        &self.policy
    }

    /// Execute a single probe request.
    ///
    /// The target host is evaluated against the policy first; a rejection
    /// returns [`Error::PolicyRejected`] with no connection attempted.
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        let url = Url::parse(&request.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(format!("url has no host: {}", request.url)))?;

        match self.policy.evaluate(host).await {
            HostDecision::Allowed => {}
            HostDecision::Rejected { reason } => return Err(Error::PolicyRejected(reason)),
        }

        tracing::debug!(method = %request.method, url = %url, "dispatching probe request");

        let mut builder = self.client.request(request.method.as_reqwest(), url);
        for (name, value) in request.merged_headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.effective_body() {
            builder = builder.body(body.to_string());
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(map_send_error)?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        // Fail fast on a declared oversized body before reading anything.
        if let Some(content_length) = response.content_length() {
            if content_length as usize > self.max_response_bytes {
                return Err(Error::Other(format!(
                    "response too large: {} bytes (max: {} bytes)",
                    content_length, self.max_response_bytes
                )));
            }
        }

        let body = self.read_body_with_limit(response).await?;
        let elapsed = started.elapsed();

        tracing::debug!(status, elapsed_ms = elapsed.as_millis() as u64, "probe completed");

        Ok(ExecutionResult {
            status,
            status_text,
            headers,
            body,
            elapsed,
        })
    }

    /// Stream the body so an oversized response aborts instead of being
    /// buffered whole.
    async fn read_body_with_limit(&self, response: reqwest::Response) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout
                } else {
                    Error::Other(format!("failed to read response: {e}"))
                }
            })?;

            if body.len() + chunk.len() > self.max_response_bytes {
                return Err(Error::Other(format!(
                    "response too large: exceeded {} bytes limit",
                    self.max_response_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

fn map_send_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else if e.is_connect() {
        Error::Connection(e.to_string())
    } else {
        Error::Other(e.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::request::Method;

    #[tokio::test]
    async fn rejects_loopback_before_connecting() {
        let executor = RequestExecutor::new(HostPolicy::new());
        // Port 1 is almost certainly closed; a connection attempt would be a
        // connection error, a policy hit is a rejection.
        let request = ExecutionRequest::new(Method::Get, "http://127.0.0.1:1/");

        let err = executor.execute(&request).await.unwrap_err();
        assert!(matches!(err, Error::PolicyRejected(_)), "got: {err}");
    }

    #[tokio::test]
    async fn rejects_everything_when_disabled() {
        let executor = RequestExecutor::new(HostPolicy::disabled());
        let request = ExecutionRequest::new(Method::Get, "http://example.com/");

        let err = executor.execute(&request).await.unwrap_err();
        match err {
            Error::PolicyRejected(reason) => assert!(reason.contains("disabled")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn invalid_url_is_reported_before_policy() {
        let executor = RequestExecutor::new(HostPolicy::new());
        let request = ExecutionRequest::new(Method::Get, "not a url");

        let err = executor.execute(&request).await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn json_detection_and_pretty_printing() {
        let result = ExecutionResult {
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![(
                "content-type".to_string(),
                "application/json; charset=utf-8".to_string(),
            )],
            body: br#"{"id":7}"#.to_vec(),
            elapsed: Duration::from_millis(5),
        };

        assert!(result.is_json());
        assert!(result.is_success());
        assert_eq!(result.body_display(), "{\n  \"id\": 7\n}");
    }

    #[test]
    fn non_json_body_rendered_verbatim() {
        let result = ExecutionResult {
            status: 404,
            status_text: "Not Found".to_string(),
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: b"nope".to_vec(),
            elapsed: Duration::from_millis(1),
        };

        assert!(!result.is_json());
        assert!(!result.is_success());
        assert_eq!(result.body_display(), "nope");
    }
}
