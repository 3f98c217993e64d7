//! Route resolution
//!
//! Substitutes parameter bindings into a route pattern, validating each value
//! against its declared converter. Every declared parameter must be bound;
//! extra bindings are ignored.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::routes::RouteDescriptor;

/// Resolve a route into a concrete path.
///
/// The returned path carries no scheme or host; the executor joins it with a
/// caller-chosen base URL.
pub fn resolve(route: &RouteDescriptor, bindings: &HashMap<String, String>) -> Result<String> {
    let mut path = route.pattern().to_string();

    for param in route.params() {
        let value = bindings
            .get(param.name())
            .ok_or_else(|| Error::MissingParameter(param.name().to_string()))?;

        if !param.ty().matches(value) {
            return Err(Error::TypeMismatch {
                name: param.name().to_string(),
                expected: param.ty().name(),
            });
        }

        path = path.replacen(&param.token, value, 1);
    }

    Ok(path)
}
