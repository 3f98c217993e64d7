//! Authentication strategies for probe requests
//!
//! An `AuthSpec` is a pure description; `materials()` turns it into headers
//! and cookies without touching any ambient state. Session auth takes an
//! explicit session id from the caller; if the id is bogus the downstream
//! request simply fails, there is no validation here.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// Cookie name carrying the session id for session auth.
pub const SESSION_COOKIE: &str = "sessionid";

/// Authentication mode for a probe request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AuthSpec {
    /// No authentication materials.
    #[default]
    None,
    /// `Authorization: Bearer <token>`
    Bearer { token: String },
    /// `Authorization: Token <token>` (DRF-style token auth)
    Token { token: String },
    /// `Authorization: Basic base64(username:password)`
    Basic { username: String, password: String },
    /// Session cookie with an explicitly supplied id.
    Session { session_id: String },
}

/// Headers and cookies produced from an [`AuthSpec`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthMaterials {
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
}

impl AuthSpec {
    /// Build the request materials for this spec. Pure and idempotent.
    pub fn materials(&self) -> AuthMaterials {
        match self {
            AuthSpec::None => AuthMaterials::default(),
            AuthSpec::Bearer { token } => AuthMaterials {
                headers: vec![("Authorization".to_string(), format!("Bearer {token}"))],
                cookies: Vec::new(),
            },
            AuthSpec::Token { token } => AuthMaterials {
                headers: vec![("Authorization".to_string(), format!("Token {token}"))],
                cookies: Vec::new(),
            },
            AuthSpec::Basic { username, password } => {
                let encoded = BASE64.encode(format!("{username}:{password}"));
                AuthMaterials {
                    headers: vec![("Authorization".to_string(), format!("Basic {encoded}"))],
                    cookies: Vec::new(),
                }
            }
            AuthSpec::Session { session_id } => AuthMaterials {
                headers: Vec::new(),
                cookies: vec![(SESSION_COOKIE.to_string(), session_id.clone())],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_builds_authorization_header() {
        let materials = AuthSpec::Bearer {
            token: "xyz".to_string(),
        }
        .materials();
        assert_eq!(
            materials.headers,
            vec![("Authorization".to_string(), "Bearer xyz".to_string())]
        );
        assert!(materials.cookies.is_empty());
    }

    #[test]
    fn token_builds_token_scheme() {
        let materials = AuthSpec::Token {
            token: "abc".to_string(),
        }
        .materials();
        assert_eq!(materials.headers[0].1, "Token abc");
    }

    #[test]
    fn basic_encodes_credentials() {
        let materials = AuthSpec::Basic {
            username: "admin".to_string(),
            password: "s3cret".to_string(),
        }
        .materials();
        // base64("admin:s3cret")
        assert_eq!(materials.headers[0].1, "Basic YWRtaW46czNjcmV0");
    }

    #[test]
    fn session_sets_cookie_unvalidated() {
        let materials = AuthSpec::Session {
            session_id: "deadbeef".to_string(),
        }
        .materials();
        assert!(materials.headers.is_empty());
        assert_eq!(
            materials.cookies,
            vec![(SESSION_COOKIE.to_string(), "deadbeef".to_string())]
        );
    }

    #[test]
    fn building_is_idempotent() {
        let spec = AuthSpec::Bearer {
            token: "xyz".to_string(),
        };
        assert_eq!(spec.materials(), spec.materials());
    }

    #[test]
    fn none_adds_nothing() {
        assert_eq!(AuthSpec::None.materials(), AuthMaterials::default());
    }
}
