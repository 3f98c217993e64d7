//! Route descriptors and path-converter types
//!
//! A descriptor is built from a raw pattern string. Two parameter syntaxes
//! are recognized: angle-bracket converters (`<int:pk>`, `<name>` defaulting
//! to string) and regex named groups (`(?P<pk>[^/.]+)`), the latter carrying
//! their subpattern as the validation rule. Regex parameters are extracted
//! before angle-bracket ones.

use std::sync::OnceLock;

use regex::Regex;

use crate::request::Method;

/// Declared type of a path parameter. Validation accepts exactly the value
/// shapes the router's own converters accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Str,
    Slug,
    Uuid,
    Path,
    /// Regex named group; the payload is the group's subpattern.
    Regex(String),
}

impl ParamType {
    fn from_converter(name: &str) -> Self {
        match name {
            "int" => ParamType::Int,
            "slug" => ParamType::Slug,
            "uuid" => ParamType::Uuid,
            "path" => ParamType::Path,
            // Unknown converters behave like `str`: any non-slash value.
            _ => ParamType::Str,
        }
    }

    /// Human-readable type name used in error messages and listings.
    pub fn name(&self) -> &'static str {
        match self {
            ParamType::Int => "integer",
            ParamType::Str => "string",
            ParamType::Slug => "slug",
            ParamType::Uuid => "UUID",
            ParamType::Path => "path",
            ParamType::Regex(_) => "regex",
        }
    }

    /// Check a candidate value against this converter.
    pub fn matches(&self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match self {
            ParamType::Int => value.bytes().all(|b| b.is_ascii_digit()),
            ParamType::Str => !value.contains('/'),
            ParamType::Slug => value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'),
            ParamType::Uuid => uuid_regex().is_match(value),
            ParamType::Path => true,
            ParamType::Regex(subpattern) => Regex::new(&format!("^(?:{subpattern})$"))
                .map(|re| re.is_match(value))
                .unwrap_or(false),
        }
    }
}

fn uuid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new("^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
            .expect("uuid regex is valid")
    })
}

fn angle_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new("<(?:(?P<ty>[^:<>]+):)?(?P<name>[^:<>]+)>").expect("param regex is valid")
    })
}

/// A named path parameter declared by a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParam {
    name: String,
    ty: ParamType,
    /// Exact pattern substring this parameter occupies, used during
    /// substitution.
    pub(crate) token: String,
}

impl RouteParam {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &ParamType {
        &self.ty
    }
}

/// A registered endpoint: cleaned pattern, naming metadata, allowed methods,
/// and the parameters derived from the pattern. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pattern: String,
    name: Option<String>,
    namespace: Option<String>,
    view: Option<String>,
    methods: Vec<Method>,
    params: Vec<RouteParam>,
}

impl RouteDescriptor {
    /// Build a descriptor from a raw pattern. Regex anchors are stripped and
    /// a leading slash is ensured; parameters are derived immediately.
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = clean_pattern(&pattern.into());
        let params = extract_params(&pattern);
        Self {
            pattern,
            name: None,
            namespace: None,
            view: None,
            methods: vec![Method::Get],
            params,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn params(&self) -> &[RouteParam] {
        &self.params
    }

    /// Namespaced name, e.g. `api:article-detail`.
    pub fn full_name(&self) -> Option<String> {
        match (&self.namespace, &self.name) {
            (Some(ns), Some(name)) => Some(format!("{ns}:{name}")),
            (None, Some(name)) => Some(name.clone()),
            _ => None,
        }
    }

    pub fn allows(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }
}

/// Strip regex anchors and ensure a leading slash.
fn clean_pattern(raw: &str) -> String {
    let trimmed = raw.trim_start_matches('^').trim_end_matches('$');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Derive parameters from a cleaned pattern, regex groups first.
fn extract_params(pattern: &str) -> Vec<RouteParam> {
    let mut params = Vec::new();

    // Regex named groups, scanned manually to pair nested parens correctly.
    let mut scrubbed = pattern.to_string();
    for group in find_regex_groups(pattern) {
        // Blank the group out of the working copy so its angle brackets are
        // not mistaken for converter syntax below.
        scrubbed = scrubbed.replacen(&group.token, &"_".repeat(group.token.len()), 1);
        params.push(RouteParam {
            name: group.name,
            ty: ParamType::Regex(group.subpattern),
            token: group.token,
        });
    }

    for caps in angle_param_regex().captures_iter(&scrubbed) {
        let ty = caps
            .name("ty")
            .map(|m| ParamType::from_converter(m.as_str()))
            .unwrap_or(ParamType::Str);
        params.push(RouteParam {
            name: caps["name"].to_string(),
            ty,
            token: caps[0].to_string(),
        });
    }

    params
}

struct RegexGroup {
    name: String,
    subpattern: String,
    token: String,
}

fn find_regex_groups(pattern: &str) -> Vec<RegexGroup> {
    let bytes = pattern.as_bytes();
    let mut groups = Vec::new();
    let mut i = 0;

    while let Some(start) = pattern[i..].find("(?P<").map(|p| p + i) {
        let name_start = start + 4;
        let Some(name_len) = pattern[name_start..].find('>') else {
            break;
        };
        let name_end = name_start + name_len;

        // Walk to the matching close paren, honoring escapes and nesting.
        let mut depth = 1usize;
        let mut j = name_end + 1;
        let mut escaped = false;
        while j < bytes.len() && depth > 0 {
            match bytes[j] {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'(' => depth += 1,
                b')' => depth -= 1,
                _ => {}
            }
            j += 1;
        }
        if depth != 0 {
            break;
        }

        groups.push(RegexGroup {
            name: pattern[name_start..name_end].to_string(),
            subpattern: pattern[name_end + 1..j - 1].to_string(),
            token: pattern[start..j].to_string(),
        });
        i = j;
    }

    groups
}
