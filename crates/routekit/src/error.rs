//! Error types for RouteKit
//!
//! Design goals:
//! - Human-readable messages safe to show in an admin panel
//! - Pre-flight failures (policy, parameters) distinguishable from
//!   network-layer failures
//! - Stable kind names for programmatic handling

use thiserror::Error;

/// Result type alias using RouteKit's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// RouteKit error types.
///
/// Policy and parameter errors are raised before any network I/O.
/// Network errors are caught at the executor boundary and never retried.
#[derive(Error, Debug)]
pub enum Error {
    /// The host-safety policy refused the target. No connection was opened.
    #[error("policy rejected: {0}")]
    PolicyRejected(String),

    /// A declared route parameter has no binding.
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// A binding does not match the parameter's declared converter.
    #[error("parameter '{name}' does not match expected type {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    /// The target URL could not be parsed or has no host.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Connection-level failure (refused, reset, TLS handshake).
    #[error("connection error: {0}")]
    Connection(String),

    /// The request exceeded its configured timeout.
    #[error("request timed out")]
    Timeout,

    /// I/O error from file handling (route tables, config files).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else: protocol errors, oversized responses, bad input.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Stable taxonomy name, used when folding errors into a probe report.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::PolicyRejected(_) => "policy_rejected",
            Error::MissingParameter(_) => "missing_parameter",
            Error::TypeMismatch { .. } => "type_mismatch",
            Error::InvalidUrl(_) => "invalid_url",
            Error::Connection(_) => "connection_error",
            Error::Timeout => "timeout",
            Error::Io(_) => "io_error",
            Error::Other(_) => "other",
        }
    }
}
