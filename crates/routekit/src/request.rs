//! Outbound request description
//!
//! An `ExecutionRequest` is assembled fresh per probe and never retained.
//! Header order is preserved and duplicate names are permitted; auth-derived
//! headers are merged in with user-supplied values taking precedence on a
//! name collision.

use serde::{Deserialize, Serialize};

use crate::auth::AuthSpec;
use crate::error::{Error, Result};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
    Options,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
        }
    }

    /// Only these methods semantically carry a request body; for the rest a
    /// supplied body is ignored at send time.
    pub fn allows_body(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }

    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Patch => reqwest::Method::PATCH,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl std::str::FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "PATCH" => Ok(Method::Patch),
            "OPTIONS" => Ok(Method::Options),
            other => Err(Error::Other(format!("unsupported method: {other}"))),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully specified outbound request, ready for the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub method: Method,
    pub url: String,
    /// User-supplied headers, order preserved, duplicates permitted.
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub auth: AuthSpec,
}

impl ExecutionRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            auth: AuthSpec::None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn auth(mut self, auth: AuthSpec) -> Self {
        self.auth = auth;
        self
    }

    /// Headers exactly as they go on the wire: auth-derived headers first
    /// (unless shadowed by a user header of the same name), then the user
    /// headers in their original order. Auth cookies become a `Cookie`
    /// header unless the user already supplied one.
    pub fn merged_headers(&self) -> Vec<(String, String)> {
        let materials = self.auth.materials();
        let mut merged = Vec::with_capacity(materials.headers.len() + self.headers.len() + 1);

        for (name, value) in materials.headers {
            if !self.has_header(&name) {
                merged.push((name, value));
            }
        }

        if !materials.cookies.is_empty() && !self.has_header("Cookie") {
            let cookie = materials
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            merged.push(("Cookie".to_string(), cookie));
        }

        merged.extend(self.headers.iter().cloned());
        merged
    }

    /// Body to send, honoring the method's body semantics.
    pub fn effective_body(&self) -> Option<&str> {
        if self.method.allows_body() {
            self.body.as_deref()
        } else {
            None
        }
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}
