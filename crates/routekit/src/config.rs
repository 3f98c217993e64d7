//! Panel configuration
//!
//! `SecurityConfig` is loaded once (from host settings or a JSON file) and is
//! read-only afterwards. It selects the policy mode and the executor limits.

use serde::Deserialize;

use crate::executor::{DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_TIMEOUT_SECS};

/// Process-wide configuration for the probing surface.
///
/// `allowed_hosts` switches the host policy between the two mutually
/// exclusive modes: `None` (or an empty list) keeps the default blocklist of
/// dangerous address ranges, a non-empty list restricts probing to exactly
/// those hosts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Allow-list of hostnames. Non-empty activates whitelist mode.
    pub allowed_hosts: Option<Vec<String>>,

    /// Master switch. When false every probe is rejected before any other
    /// check, even for allow-listed hosts.
    pub enable_testing: bool,

    /// Regex patterns filtering which routes are listed or resolvable.
    /// Matched against the route pattern without its leading slash.
    pub exclude_urls: Vec<String>,

    /// Overall request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum response body size in bytes.
    pub max_response_bytes: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: None,
            enable_testing: true,
            exclude_urls: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl SecurityConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        serde_json::from_str(text).map_err(|e| crate::Error::Other(format!("invalid config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_testing_enabled_with_blocklist_mode() {
        let config = SecurityConfig::default();
        assert!(config.enable_testing);
        assert!(config.allowed_hosts.is_none());
        assert!(config.exclude_urls.is_empty());
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn from_json_partial_fields() {
        let config = SecurityConfig::from_json(
            r#"{"allowed_hosts": ["example.com"], "enable_testing": false}"#,
        )
        .unwrap();
        assert_eq!(config.allowed_hosts.as_deref(), Some(&["example.com".to_string()][..]));
        assert!(!config.enable_testing);
        assert_eq!(config.max_response_bytes, DEFAULT_MAX_RESPONSE_BYTES);
    }

    #[test]
    fn from_json_rejects_unknown_fields() {
        assert!(SecurityConfig::from_json(r#"{"allow_hosts": []}"#).is_err());
    }
}
