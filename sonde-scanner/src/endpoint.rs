//! Canonical endpoint record shared by every discovery strategy.
//!
//! Parsers, the GraphQL introspector and the crawler all produce [`Endpoint`]s and
//! hand them back wrapped in a [`DiscoveryResult`]. Everything here serializes to the
//! JSON shape consumed by the load generator.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Transport flavour of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Rest,
    Graphql,
}

/// Expected outcome of a request against an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checks {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_graphql_errors: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_data: Option<bool>,
}

impl Checks {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            no_graphql_errors: None,
            has_data: None,
        }
    }

    /// Checks for a GraphQL operation: HTTP 200, no `errors`, non-null `data`
    pub fn graphql() -> Self {
        Self {
            status: 200,
            no_graphql_errors: Some(true),
            has_data: Some(true),
        }
    }
}

impl Default for Checks {
    fn default() -> Self {
        Self::status(200)
    }
}

/// One discovered operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub group: String,
    #[serde(rename = "type")]
    pub kind: EndpointKind,
    /// Upper-cased verb. GraphQL operations always travel as POST.
    pub method: String,
    pub path: String,
    pub weight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
    pub checks: Checks,
}

impl Endpoint {
    /// Build a REST endpoint with name and group derived from method + path
    pub fn rest(method: &str, path: &str) -> Self {
        let method = method.to_uppercase();
        Self {
            name: sanitize_name(&format!("{}_{}", method, path)),
            group: group_for_path(path, "root"),
            kind: EndpointKind::Rest,
            method,
            path: path.to_string(),
            weight: 1,
            body: None,
            query: None,
            variables: None,
            checks: Checks::default(),
        }
    }

    /// Build a GraphQL operation endpoint
    pub fn graphql(
        name: &str,
        group: &str,
        path: &str,
        query: String,
        variables: Map<String, Value>,
    ) -> Self {
        Self {
            name: sanitize_name(name),
            group: group.to_string(),
            kind: EndpointKind::Graphql,
            method: "POST".to_string(),
            path: path.to_string(),
            weight: 1,
            body: None,
            query: Some(query),
            variables: Some(variables),
            checks: Checks::graphql(),
        }
    }

    pub fn with_name(mut self, raw: &str) -> Self {
        self.name = sanitize_name(raw);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.checks.status = status;
        self
    }

    pub fn is_graphql(&self) -> bool {
        self.kind == EndpointKind::Graphql
    }

    /// Uniqueness key: `METHOD:path` for REST, `graphql:name` for GraphQL
    pub fn dedup_key(&self) -> String {
        match self.kind {
            EndpointKind::Rest => format!("{}:{}", self.method, self.path),
            EndpointKind::Graphql => format!("graphql:{}", self.name),
        }
    }
}

/// Where a [`DiscoveryResult`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    Openapi,
    Graphql,
    RestProbe,
    Crawl,
    Postman,
    Har,
    Wsdl,
    ApiBlueprint,
    Raml,
    None,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Openapi => "openapi",
            Source::Graphql => "graphql",
            Source::RestProbe => "rest-probe",
            Source::Crawl => "crawl",
            Source::Postman => "postman",
            Source::Har => "har",
            Source::Wsdl => "wsdl",
            Source::ApiBlueprint => "api-blueprint",
            Source::Raml => "raml",
            Source::None => "none",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthKind {
    Bearer,
    Basic,
    ApiKey,
}

/// Authentication scheme advertised by an API description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthHint {
    #[serde(rename = "type")]
    pub kind: AuthKind,
    pub header: String,
}

/// Counters reported by a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    pub pages_crawled: usize,
    pub scripts_scanned: usize,
    pub graphql_schemas_scanned: usize,
}

/// Output of every discovery strategy.
///
/// A populated `error` means `endpoints` is empty and the caller should not try
/// another strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub setup: Vec<Value>,
    #[serde(default)]
    pub teardown: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthHint>,
    #[serde(flatten)]
    pub crawl: Option<CrawlStats>,
}

impl DiscoveryResult {
    pub fn new(source: Source, endpoints: Vec<Endpoint>) -> Self {
        Self {
            source,
            source_url: None,
            endpoints,
            setup: Vec::new(),
            teardown: Vec::new(),
            error: None,
            auth: None,
            crawl: None,
        }
    }

    pub fn failed(source: Source, error: impl Into<String>) -> Self {
        let mut result = Self::new(source, Vec::new());
        result.error = Some(error.into());
        result
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Insertion-ordered endpoint accumulator that drops duplicates on insert
#[derive(Debug, Default)]
pub struct EndpointSet {
    entries: Vec<Endpoint>,
    keys: HashSet<String>,
}

impl EndpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under the endpoint's own dedup key. First occurrence wins.
    pub fn insert(&mut self, endpoint: Endpoint) -> bool {
        let key = endpoint.dedup_key();
        self.insert_keyed(key, endpoint)
    }

    /// Insert under an explicit key, for producers whose natural identity
    /// differs from `METHOD:path` (SOAP operations share one path).
    pub fn insert_keyed(&mut self, key: String, endpoint: Endpoint) -> bool {
        if !self.keys.insert(key) {
            return false;
        }
        self.entries.push(endpoint);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        if !self.keys.remove(key) {
            return false;
        }
        self.entries.retain(|ep| ep.dedup_key() != key);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Endpoint> {
        self.entries
    }
}

fn non_alnum_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]+").expect("name sanitizer regex is valid"))
}

fn repeated_slashes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"//+").expect("slash collapse regex is valid"))
}

/// Reduce an arbitrary label to `[A-Za-z0-9_]`, defaulting to `endpoint`
pub fn sanitize_name(raw: &str) -> String {
    let replaced = non_alnum_run().replace_all(raw, "_");
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        "endpoint".to_string()
    } else {
        trimmed.to_string()
    }
}

/// First non-templated path segment, or `default`
pub fn group_for_path(path: &str, default: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .find(|seg| !seg.is_empty() && !seg.starts_with('{'))
        .unwrap_or(default)
        .to_string()
}

/// Drop everything from the first `?` or `#`
pub fn strip_query_fragment(raw: &str) -> &str {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    &raw[..end]
}

/// Strip query/fragment, collapse repeated slashes and force a leading slash
pub fn normalize_path(raw: &str) -> String {
    let stripped = strip_query_fragment(raw);
    let collapsed = repeated_slashes().replace_all(stripped, "/");
    if collapsed.starts_with('/') {
        collapsed.into_owned()
    } else {
        format!("/{}", collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("GET_/api/users/{id}"), "GET_api_users_id");
        assert_eq!(sanitize_name("List Users!"), "List_Users");
        assert_eq!(sanitize_name("///"), "endpoint");
        assert_eq!(sanitize_name(""), "endpoint");
    }

    #[test]
    fn test_group_for_path_skips_templates() {
        assert_eq!(group_for_path("/{tenant}/orders/{id}", "api"), "orders");
        assert_eq!(group_for_path("/", "api"), "api");
        assert_eq!(group_for_path("/{id}", "root"), "root");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/api//v1///users?x=1#top"), "/api/v1/users");
        assert_eq!(normalize_path("users"), "/users");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn test_rest_endpoint_defaults() {
        let ep = Endpoint::rest("post", "/api/items");
        assert_eq!(ep.method, "POST");
        assert_eq!(ep.name, "POST_api_items");
        assert_eq!(ep.group, "api");
        assert_eq!(ep.weight, 1);
        assert_eq!(ep.checks.status, 200);
        assert_eq!(ep.dedup_key(), "POST:/api/items");
    }

    #[test]
    fn test_endpoint_set_first_occurrence_wins() {
        let mut set = EndpointSet::new();
        assert!(set.insert(Endpoint::rest("GET", "/a").with_status(201)));
        assert!(!set.insert(Endpoint::rest("GET", "/a")));
        assert!(set.insert(Endpoint::rest("POST", "/a")));
        assert_eq!(set.len(), 2);

        assert!(set.remove("POST:/a"));
        assert!(!set.contains("POST:/a"));
        let eps = set.into_vec();
        assert_eq!(eps.len(), 1);
        assert_eq!(eps[0].checks.status, 201);
    }

    #[test]
    fn test_result_serializes_source_and_skips_empty_fields() {
        let result = DiscoveryResult::new(Source::RestProbe, vec![Endpoint::rest("GET", "/items")]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["source"], "rest-probe");
        assert_eq!(json["endpoints"][0]["type"], "rest");
        assert!(json.get("error").is_none());
        assert!(json.get("pages_crawled").is_none());
        assert_eq!(json["setup"], Value::Array(vec![]));
    }

    #[test]
    fn test_crawl_stats_are_flattened() {
        let mut result = DiscoveryResult::new(Source::Crawl, Vec::new());
        result.crawl = Some(CrawlStats {
            pages_crawled: 2,
            scripts_scanned: 1,
            graphql_schemas_scanned: 0,
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["pages_crawled"], 2);
        assert_eq!(json["scripts_scanned"], 1);
    }
}
