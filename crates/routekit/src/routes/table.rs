//! Route providers and the static route table
//!
//! `RouteProvider` is the injected, read-only seam standing in for the host
//! framework's registry. `RouteTable` is the bundled implementation: loadable
//! from JSON, filterable through exclude patterns, and searchable.

use std::collections::BTreeMap;
use std::str::FromStr;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::request::Method;
use crate::routes::RouteDescriptor;

/// Read-only source of route descriptors.
pub trait RouteProvider: Send + Sync {
    fn routes(&self) -> Vec<RouteDescriptor>;
}

/// Static route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

/// Summary counts over a route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStats {
    pub total: usize,
    pub named: usize,
    pub namespaces: Vec<String>,
}

/// One entry of a JSON route-table file.
#[derive(Debug, Deserialize)]
struct RouteEntry {
    pattern: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    view: Option<String>,
    #[serde(default)]
    methods: Option<Vec<String>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_routes(routes: impl IntoIterator<Item = RouteDescriptor>) -> Self {
        Self {
            routes: routes.into_iter().collect(),
        }
    }

    /// Parse a route table from JSON text (an array of entries with
    /// `pattern` and optional `name`, `namespace`, `view`, `methods`).
    pub fn from_json(text: &str) -> Result<Self> {
        let entries: Vec<RouteEntry> = serde_json::from_str(text)
            .map_err(|e| Error::Other(format!("invalid route table: {e}")))?;

        let mut routes = Vec::with_capacity(entries.len());
        for entry in entries {
            let mut route = RouteDescriptor::new(entry.pattern);
            if let Some(name) = entry.name {
                route = route.with_name(name);
            }
            if let Some(namespace) = entry.namespace {
                route = route.with_namespace(namespace);
            }
            if let Some(view) = entry.view {
                route = route.with_view(view);
            }
            if let Some(methods) = entry.methods {
                let methods = methods
                    .iter()
                    .map(|m| Method::from_str(m))
                    .collect::<Result<Vec<_>>>()?;
                route = route.with_methods(methods);
            }
            routes.push(route);
        }

        Ok(Self { routes })
    }

    pub fn push(&mut self, route: RouteDescriptor) {
        self.routes.push(route);
    }

    /// Drop every route whose pattern (without its leading slash) matches one
    /// of the given regex patterns. Applied before any route can reach the
    /// resolver.
    pub fn with_excludes(self, patterns: &[String]) -> Result<Self> {
        let excludes = compile_excludes(patterns)?;
        Ok(Self {
            routes: self
                .routes
                .into_iter()
                .filter(|route| !is_excluded(route, &excludes))
                .collect(),
        })
    }

    /// Case-insensitive search over pattern, name, and view.
    pub fn search(&self, query: &str) -> Vec<&RouteDescriptor> {
        let query = query.to_lowercase();
        self.routes
            .iter()
            .filter(|route| {
                route.pattern().to_lowercase().contains(&query)
                    || route
                        .full_name()
                        .is_some_and(|name| name.to_lowercase().contains(&query))
                    || route
                        .view()
                        .is_some_and(|view| view.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Routes grouped by namespace; unnamespaced routes land under `_root`.
    pub fn grouped(&self) -> BTreeMap<String, Vec<&RouteDescriptor>> {
        let mut grouped: BTreeMap<String, Vec<&RouteDescriptor>> = BTreeMap::new();
        for route in &self.routes {
            let key = route.namespace().unwrap_or("_root").to_string();
            grouped.entry(key).or_default().push(route);
        }
        grouped
    }

    pub fn stats(&self) -> RouteStats {
        let mut namespaces: Vec<String> = self
            .routes
            .iter()
            .filter_map(|r| r.namespace().map(str::to_string))
            .collect();
        namespaces.sort();
        namespaces.dedup();

        RouteStats {
            total: self.routes.len(),
            named: self.routes.iter().filter(|r| r.name().is_some()).count(),
            namespaces,
        }
    }

    /// Look a route up by namespaced name, bare name, or exact pattern.
    pub fn find(&self, selector: &str) -> Option<&RouteDescriptor> {
        self.routes
            .iter()
            .find(|r| r.full_name().as_deref() == Some(selector))
            .or_else(|| self.routes.iter().find(|r| r.name() == Some(selector)))
            .or_else(|| self.routes.iter().find(|r| r.pattern() == selector))
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }
}

impl RouteProvider for RouteTable {
    fn routes(&self) -> Vec<RouteDescriptor> {
        self.routes.clone()
    }
}

pub(crate) fn compile_excludes(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| Error::Other(format!("invalid exclude pattern: {e}"))))
        .collect()
}

pub(crate) fn is_excluded(route: &RouteDescriptor, excludes: &[Regex]) -> bool {
    let pattern = route.pattern().trim_start_matches('/');
    excludes.iter().any(|re| re.is_match(pattern))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_table() -> RouteTable {
        RouteTable::from_routes([
            RouteDescriptor::new("/admin/login/")
                .with_namespace("admin")
                .with_name("login"),
            RouteDescriptor::new("/api/articles/<int:pk>/")
                .with_namespace("api")
                .with_name("article-detail")
                .with_view("api.views.ArticleDetailView")
                .with_methods([Method::Get, Method::Put, Method::Delete]),
            RouteDescriptor::new("/health/").with_name("health"),
        ])
    }

    #[test]
    fn excludes_filter_matching_patterns() {
        let table = sample_table()
            .with_excludes(&["^admin/".to_string()])
            .unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.find("/admin/login/").is_none());
        assert!(table.find("api:article-detail").is_some());
    }

    #[test]
    fn multiple_exclude_patterns() {
        let table = sample_table()
            .with_excludes(&["^admin/".to_string(), "^api/".to_string()])
            .unwrap();

        assert_eq!(table.len(), 1);
        assert!(table.find("health").is_some());
    }

    #[test]
    fn no_excludes_keeps_everything() {
        let table = sample_table().with_excludes(&[]).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn invalid_exclude_pattern_is_an_error() {
        assert!(sample_table().with_excludes(&["(".to_string()]).is_err());
    }

    #[test]
    fn search_matches_pattern_name_and_view() {
        let table = sample_table();

        assert_eq!(table.search("articles").len(), 1);
        assert_eq!(table.search("article-detail").len(), 1);
        assert_eq!(table.search("ArticleDetailView").len(), 1);
        assert_eq!(table.search("ADMIN").len(), 1);
        assert!(table.search("nothing-here").is_empty());
    }

    #[test]
    fn grouped_by_namespace_with_root_fallback() {
        let table = sample_table();
        let grouped = table.grouped();
        assert_eq!(grouped["admin"].len(), 1);
        assert_eq!(grouped["api"].len(), 1);
        assert_eq!(grouped["_root"].len(), 1);
    }

    #[test]
    fn stats_counts() {
        let stats = sample_table().stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.named, 3);
        assert_eq!(stats.namespaces, vec!["admin".to_string(), "api".to_string()]);
    }

    #[test]
    fn find_by_name_then_pattern() {
        let table = sample_table();
        assert!(table.find("api:article-detail").is_some());
        assert!(table.find("health").is_some());
        assert!(table.find("/health/").is_some());
        assert!(table.find("missing").is_none());
    }

    #[test]
    fn from_json_parses_entries() {
        let table = RouteTable::from_json(
            r#"[
                {"pattern": "/api/items/<int:pk>/", "name": "item-detail",
                 "namespace": "api", "methods": ["GET", "PUT"]},
                {"pattern": "health/"}
            ]"#,
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        let route = table.find("api:item-detail").unwrap();
        assert_eq!(route.methods(), &[Method::Get, Method::Put]);
        // Patterns are cleaned on load.
        assert!(table.find("/health/").is_some());
    }

    #[test]
    fn from_json_rejects_bad_method() {
        let result = RouteTable::from_json(r#"[{"pattern": "/x/", "methods": ["YEET"]}]"#);
        assert!(result.is_err());
    }
}
