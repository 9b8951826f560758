use crate::error::Result;
use serde_json::{Map, Value};
use sonde_scanner::endpoint::normalize_path;
use sonde_scanner::{DiscoveryResult, Endpoint, EndpointSet, Source};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_GROUP: &str = "default";

/// Walk a Postman v2 collection. Folders name the group of everything below them.
pub fn parse_postman(collection: &Value) -> DiscoveryResult {
    let mut endpoints = EndpointSet::new();
    if let Some(items) = collection.get("item").and_then(Value::as_array) {
        walk(items, DEFAULT_GROUP, &mut endpoints);
    }
    debug!("Postman collection yielded {} endpoints", endpoints.len());
    DiscoveryResult::new(Source::Postman, endpoints.into_vec())
}

fn walk(items: &[Value], group: &str, endpoints: &mut EndpointSet) {
    for item in items {
        if let Some(children) = item.get("item") {
            let folder = item.get("name").and_then(Value::as_str).unwrap_or(group);
            if let Some(children) = children.as_array() {
                walk(children, folder, endpoints);
            }
        } else if item.get("request").is_some()
            && let Some(endpoint) = item_to_endpoint(item, group)
        {
            endpoints.insert(endpoint);
        }
    }
}

/// Convert one leaf item. Returns `None` when the item has no usable request.
pub fn item_to_endpoint(item: &Value, group: &str) -> Option<Endpoint> {
    let request = item.get("request")?;
    let name = item
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("unnamed");

    // A bare string request is shorthand for GET <url>
    if let Some(url) = request.as_str() {
        return Some(
            Endpoint::rest("GET", &path_from_url_str(url))
                .with_name(name)
                .with_group(group),
        );
    }
    let request = request.as_object().filter(|r| !r.is_empty())?;

    let path = match request.get("url") {
        Some(Value::String(url)) => path_from_url_str(url),
        Some(Value::Object(url)) => path_from_url_object(url),
        _ => "/".to_string(),
    };

    let body = request.get("body").and_then(Value::as_object);
    let mode = body
        .and_then(|b| b.get("mode"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    if mode == "graphql" {
        let graphql = body.and_then(|b| b.get("graphql"));
        let query = graphql
            .and_then(|g| g.get("query"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let variables = parse_variables(graphql.and_then(|g| g.get("variables")));
        return Some(Endpoint::graphql(name, group, &path, query, variables));
    }

    let method = request
        .get("method")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or("GET");
    let raw_body = body
        .and_then(|b| b.get("raw"))
        .and_then(Value::as_str)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| serde_json::from_str(raw).ok());

    Some(
        Endpoint::rest(method, &path)
            .with_name(name)
            .with_group(group)
            .with_body(raw_body),
    )
}

/// `https://host/a/b` -> `/a/b`, `{{base}}/users` -> `/users`
fn path_from_url_str(url: &str) -> String {
    if !url.contains('/') {
        return normalize_path(url);
    }
    let tail = url.splitn(4, '/').last().unwrap_or_default();
    normalize_path(&format!("/{}", tail))
}

fn path_from_url_object(url: &Map<String, Value>) -> String {
    match url.get("path") {
        Some(Value::Array(segments)) => {
            let kept: Vec<&str> = segments
                .iter()
                .filter_map(Value::as_str)
                .filter(|seg| !seg.starts_with(':'))
                .collect();
            normalize_path(&format!("/{}", kept.join("/")))
        }
        Some(Value::String(path)) => normalize_path(path),
        _ => match url.get("raw").and_then(Value::as_str) {
            Some(raw) => path_from_url_str(raw),
            None => "/".to_string(),
        },
    }
}

/// Variables arrive either as a JSON string or an already-decoded object
fn parse_variables(raw: Option<&Value>) -> Map<String, Value> {
    match raw {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(text)) if !text.trim().is_empty() => {
            match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            }
        }
        _ => Map::new(),
    }
}

/// Read a collection export from disk
pub fn load_postman_collection(path: &Path) -> Result<Value> {
    info!("Loading Postman collection from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
