//! RouteKit - browse a registered route table and probe endpoints safely
//!
//! The probing pipeline is: route resolution → host-safety gate → auth
//! materials → a single HTTP exchange → response/curl rendering. The gate has
//! final say; a rejected host never produces a network call.
//!
//! # Example
//!
//! ```rust,no_run
//! use routekit::{AuthSpec, ExecutionRequest, Method, Probe, RouteTable};
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> routekit::Result<()> {
//!     let mut table = RouteTable::new();
//!     table.push(routekit::RouteDescriptor::new("/items/<int:pk>/").with_name("item-detail"));
//!
//!     let probe = Probe::builder().routes(table).build()?;
//!
//!     let bindings = HashMap::from([("pk".to_string(), "7".to_string())]);
//!     let url = probe.resolve_url("item-detail", &bindings, "https://example.com")?;
//!
//!     let request = ExecutionRequest::new(Method::Get, url).auth(AuthSpec::Bearer {
//!         token: "abc123".to_string(),
//!     });
//!     let report = probe.run(&request).await;
//!     println!("{}", report.curl);
//!     Ok(())
//! }
//! ```

mod auth;
mod config;
mod curl;
mod error;
mod executor;
mod policy;
mod request;
mod routes;

pub use auth::{AuthMaterials, AuthSpec, SESSION_COOKIE};
pub use config::SecurityConfig;
pub use curl::{curl_args, curl_command, parse_curl_args};
pub use error::{Error, Result};
pub use executor::{
    DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_TIMEOUT_SECS, ExecutionResult, RequestExecutor,
};
pub use policy::{HostDecision, HostPolicy};
pub use request::{ExecutionRequest, Method};
pub use routes::{
    ParamType, RouteDescriptor, RouteParam, RouteProvider, RouteStats, RouteTable, resolve,
};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;

/// Outcome of a probe: either a captured response or a taxonomy-tagged
/// failure. A caller always has something to render.
#[derive(Debug)]
pub enum ProbeOutcome {
    Response(ExecutionResult),
    Failed { kind: &'static str, message: String },
}

impl ProbeOutcome {
    pub fn is_response(&self) -> bool {
        matches!(self, ProbeOutcome::Response(_))
    }
}

/// Report of one probe: the curl equivalent of what was (or would have been)
/// sent, plus the outcome.
#[derive(Debug)]
pub struct ProbeReport {
    pub curl: String,
    pub outcome: ProbeOutcome,
}

/// Main entry point: a route table plus a policy-gated executor.
pub struct Probe {
    routes: Arc<dyn RouteProvider>,
    executor: RequestExecutor,
    excludes: Vec<Regex>,
    config: SecurityConfig,
}

impl Probe {
    /// Create a builder with default configuration.
    pub fn builder() -> ProbeBuilder {
        ProbeBuilder::default()
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Listed routes with exclude filtering applied. Excluded routes never
    /// reach the resolver.
    pub fn routes(&self) -> Vec<RouteDescriptor> {
        self.routes
            .routes()
            .into_iter()
            .filter(|route| !routes::is_excluded(route, &self.excludes))
            .collect()
    }

    /// Look a listed route up by namespaced name, bare name, or pattern.
    pub fn find_route(&self, selector: &str) -> Option<RouteDescriptor> {
        self.routes().into_iter().find(|r| {
            r.full_name().as_deref() == Some(selector)
                || r.name() == Some(selector)
                || r.pattern() == selector
        })
    }

    /// Resolve a route selector and bindings into a concrete URL on the given
    /// base (scheme + host, e.g. `https://example.com`).
    pub fn resolve_url(
        &self,
        selector: &str,
        bindings: &HashMap<String, String>,
        base: &str,
    ) -> Result<String> {
        let route = self
            .find_route(selector)
            .ok_or_else(|| Error::Other(format!("no such route: {selector}")))?;
        let path = routes::resolve(&route, bindings)?;

        let base_url =
            url::Url::parse(base).map_err(|e| Error::InvalidUrl(format!("{base}: {e}")))?;
        let joined = base_url
            .join(&path)
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(joined.to_string())
    }

    /// Run a probe and fold any failure into a renderable report. The curl
    /// equivalent is generated from the request exactly as it would go on
    /// the wire, whether or not the exchange happened.
    pub async fn run(&self, request: &ExecutionRequest) -> ProbeReport {
        let curl = curl::curl_command(request);
        let outcome = match self.executor.execute(request).await {
            Ok(result) => ProbeOutcome::Response(result),
            Err(err) => ProbeOutcome::Failed {
                kind: err.kind(),
                message: err.to_string(),
            },
        };
        ProbeReport { curl, outcome }
    }

    /// Strict variant of [`run`](Self::run) for callers that want the error.
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        self.executor.execute(request).await
    }
}

/// Builder for a configured [`Probe`].
#[derive(Default)]
pub struct ProbeBuilder {
    config: SecurityConfig,
    routes: Option<Arc<dyn RouteProvider>>,
}

impl ProbeBuilder {
    pub fn config(mut self, config: SecurityConfig) -> Self {
        self.config = config;
        self
    }

    pub fn routes(mut self, routes: impl RouteProvider + 'static) -> Self {
        self.routes = Some(Arc::new(routes));
        self
    }

    pub fn routes_arc(mut self, routes: Arc<dyn RouteProvider>) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Build the probe. Fails on an invalid exclude pattern.
    pub fn build(self) -> Result<Probe> {
        let excludes = routes::compile_excludes(&self.config.exclude_urls)?;
        let policy = HostPolicy::from_config(&self.config);
        let executor = RequestExecutor::with_config(
            policy,
            Duration::from_secs(self.config.timeout_secs),
            self.config.max_response_bytes,
        );
        let routes = self
            .routes
            .unwrap_or_else(|| Arc::new(RouteTable::new()) as Arc<dyn RouteProvider>);

        Ok(Probe {
            routes,
            executor,
            excludes,
            config: self.config,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_probe(config: SecurityConfig) -> Probe {
        let mut table = RouteTable::new();
        table.push(
            RouteDescriptor::new("/items/<int:pk>/")
                .with_name("item-detail")
                .with_methods([Method::Get, Method::Put, Method::Delete]),
        );
        table.push(RouteDescriptor::new("/admin/secrets/").with_name("secrets"));
        Probe::builder().routes(table).config(config).build().unwrap()
    }

    #[test]
    fn resolve_url_joins_base_and_path() {
        let probe = sample_probe(SecurityConfig::default());
        let bindings = HashMap::from([("pk".to_string(), "7".to_string())]);

        let url = probe
            .resolve_url("item-detail", &bindings, "https://example.com")
            .unwrap();
        assert_eq!(url, "https://example.com/items/7/");
    }

    #[test]
    fn resolve_url_propagates_parameter_errors() {
        let probe = sample_probe(SecurityConfig::default());
        let bindings = HashMap::from([("pk".to_string(), "abc".to_string())]);

        let err = probe
            .resolve_url("item-detail", &bindings, "https://example.com")
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn unknown_route_selector_is_an_error() {
        let probe = sample_probe(SecurityConfig::default());
        let err = probe
            .resolve_url("nope", &HashMap::new(), "https://example.com")
            .unwrap_err();
        assert!(err.to_string().contains("no such route"));
    }

    #[test]
    fn excluded_routes_are_not_listed_or_resolvable() {
        let probe = sample_probe(SecurityConfig {
            exclude_urls: vec!["^admin/".to_string()],
            ..SecurityConfig::default()
        });

        assert_eq!(probe.routes().len(), 1);
        assert!(probe.find_route("secrets").is_none());
        assert!(
            probe
                .resolve_url("secrets", &HashMap::new(), "https://example.com")
                .is_err()
        );
    }

    #[tokio::test]
    async fn run_folds_policy_rejection_into_report() {
        let probe = sample_probe(SecurityConfig::default());
        let request = ExecutionRequest::new(Method::Get, "http://127.0.0.1:1/items/7/");

        let report = probe.run(&request).await;
        match report.outcome {
            ProbeOutcome::Failed { kind, ref message } => {
                assert_eq!(kind, "policy_rejected");
                assert!(message.contains("loopback"), "got: {message}");
            }
            ProbeOutcome::Response(_) => panic!("loopback must be rejected"),
        }
        // The curl equivalent is still rendered for the admin to inspect.
        assert!(report.curl.starts_with("curl -X GET"));
    }
}
