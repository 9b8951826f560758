use serde_json::Value;
use sonde_scanner::endpoint::normalize_path;
use sonde_scanner::{DiscoveryResult, Endpoint, EndpointSet, Source};
use tracing::debug;
use url::Url;

/// Unique `METHOD path` patterns from an HTTP Archive, first occurrence wins
pub fn parse_har(har: &Value) -> DiscoveryResult {
    let log = har.get("log").filter(|l| l.is_object()).unwrap_or(har);
    let entries = log
        .get("entries")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut endpoints = EndpointSet::new();
    for entry in entries {
        let Some(request) = entry.get("request") else {
            continue;
        };
        let method = request
            .get("method")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or("GET");
        let path = request
            .get("url")
            .and_then(Value::as_str)
            .and_then(|u| Url::parse(u).ok())
            .map(|u| normalize_path(u.path()))
            .unwrap_or_else(|| "/".to_string());

        let body = request
            .get("postData")
            .and_then(|p| p.get("text"))
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(|text| {
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
            });

        if !endpoints.insert(Endpoint::rest(method, &path).with_body(body)) {
            debug!("Skipping duplicate HAR entry {} {}", method, path);
        }
    }

    DiscoveryResult::new(Source::Har, endpoints.into_vec())
}
