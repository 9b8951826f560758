//! GraphQL schema introspection
//! Expands a live `__schema` into one skeleton operation per query/mutation field

use crate::endpoint::{DiscoveryResult, Endpoint, EndpointSet, Source};
use crate::error::{Result, ScanError};
use crate::probe::{Headers, HttpProbe};
use serde::Deserialize;
use serde_json::{Map, json};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const INTROSPECTION_QUERY: &str =
    "{ __schema { queryType { fields { name args { name } } } mutationType { fields { name } } } }";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Real argument types are not introspected; every variable is declared `String`.
const MAX_QUERY_ARGS: usize = 3;

#[derive(Debug, Deserialize)]
struct IntrospectionResponse {
    data: Option<IntrospectionData>,
}

#[derive(Debug, Deserialize)]
struct IntrospectionData {
    #[serde(rename = "__schema")]
    schema: Option<SchemaMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaMeta {
    query_type: Option<RootType>,
    mutation_type: Option<RootType>,
}

#[derive(Debug, Deserialize)]
struct RootType {
    fields: Option<Vec<FieldMeta>>,
}

#[derive(Debug, Deserialize)]
struct FieldMeta {
    name: Option<String>,
    args: Option<Vec<ArgMeta>>,
}

#[derive(Debug, Deserialize)]
struct ArgMeta {
    name: Option<String>,
}

impl RootType {
    fn named_fields(&self) -> impl Iterator<Item = &FieldMeta> {
        self.fields
            .iter()
            .flatten()
            .filter(|f| f.name.as_deref().is_some_and(|n| !n.is_empty()))
    }
}

/// Introspect `url`, returning `None` on any non-200, empty, unparseable or
/// schema-less response.
pub async fn introspect(
    probe: &HttpProbe,
    url: &str,
    headers: &Headers,
    timeout: Duration,
) -> Option<DiscoveryResult> {
    match try_introspect(probe, url, headers, timeout).await {
        Ok(endpoints) => {
            info!("GraphQL introspection of {} found {} operations", url, endpoints.len());
            Some(DiscoveryResult::new(Source::Graphql, endpoints).with_source_url(url))
        }
        Err(e) => {
            debug!("GraphQL introspection of {} failed: {}", url, e);
            None
        }
    }
}

pub async fn try_introspect(
    probe: &HttpProbe,
    url: &str,
    headers: &Headers,
    timeout: Duration,
) -> Result<Vec<Endpoint>> {
    let payload = json!({ "query": INTROSPECTION_QUERY });
    let response = probe.try_post_json(url, &payload, headers, timeout).await?;

    if response.status != 200 {
        return Err(ScanError::Status(response.status));
    }
    if response.is_empty() {
        return Err(ScanError::EmptyBody);
    }

    let parsed: IntrospectionResponse = serde_json::from_slice(&response.body)
        .map_err(|e| ScanError::ParseError(format!("introspection response: {}", e)))?;

    let schema = parsed
        .data
        .and_then(|d| d.schema)
        .filter(|s| s.query_type.is_some() || s.mutation_type.is_some())
        .ok_or_else(|| ScanError::ParseError("response carries no __schema".to_string()))?;

    Ok(schema_to_endpoints(&schema, &endpoint_path(url)))
}

fn schema_to_endpoints(schema: &SchemaMeta, path: &str) -> Vec<Endpoint> {
    let mut endpoints = EndpointSet::new();

    if let Some(query_type) = &schema.query_type {
        for field in query_type.named_fields() {
            let name = field.name.as_deref().unwrap_or_default();
            let args: Vec<&str> = field
                .args
                .iter()
                .flatten()
                .filter_map(|a| a.name.as_deref())
                .filter(|a| !a.is_empty())
                .take(MAX_QUERY_ARGS)
                .collect();
            endpoints.insert(Endpoint::graphql(
                name,
                "query",
                path,
                query_skeleton(name, &args),
                Map::new(),
            ));
        }
    }

    if let Some(mutation_type) = &schema.mutation_type {
        for field in mutation_type.named_fields() {
            let name = field.name.as_deref().unwrap_or_default();
            endpoints.insert(Endpoint::graphql(
                name,
                "mutation",
                path,
                format!("mutation {name} {{ {name} {{ __typename }} }}"),
                Map::new(),
            ));
        }
    }

    endpoints.into_vec()
}

/// `query f($a: String, $b: String) { f(a: $a, b: $b) { __typename } }`
pub fn query_skeleton(field: &str, args: &[&str]) -> String {
    if args.is_empty() {
        return format!("query {field} {{ {field} {{ __typename }} }}");
    }

    let definitions = args
        .iter()
        .map(|a| format!("${a}: String"))
        .collect::<Vec<_>>()
        .join(", ");
    let uses = args
        .iter()
        .map(|a| format!("{a}: ${a}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!("query {field}({definitions}) {{ {field}({uses}) {{ __typename }} }}")
}

/// Path component of the introspected URL, `/graphql` when the URL is bare
pub fn endpoint_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if !parsed.path().is_empty() && parsed.path() != "/" => parsed.path().to_string(),
        _ => "/graphql".to_string(),
    }
}
