use crate::schema::schema_to_stub;
use serde_json::Value;
use sonde_scanner::endpoint::{group_for_path, normalize_path};
use sonde_scanner::{AuthHint, AuthKind, DiscoveryResult, Endpoint, EndpointSet, Source};
use tracing::debug;

/// OpenAPI 3 / Swagger 2 document to endpoints plus the advertised auth scheme
pub fn parse_openapi(document: &Value) -> DiscoveryResult {
    let mut result = DiscoveryResult::new(Source::Openapi, openapi_to_endpoints(document));
    result.auth = detect_auth(document);
    result
}

/// One REST endpoint per `path x method`, skipping `x-` extensions and
/// non-mapping values such as shared `parameters`.
pub fn openapi_to_endpoints(document: &Value) -> Vec<Endpoint> {
    let mut endpoints = EndpointSet::new();
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    for (path, methods) in paths {
        let Some(methods) = methods.as_object() else {
            continue;
        };
        let path = normalize_path(path);
        let group = group_for_path(&path, "api");

        for (method, operation) in methods {
            if method.starts_with("x-") || !operation.is_object() {
                continue;
            }
            let method = method.to_uppercase();
            let name = operation
                .get("operationId")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}_{}", method, path));

            let endpoint = Endpoint::rest(&method, &path)
                .with_name(&name)
                .with_group(group.clone())
                .with_status(success_status(operation))
                .with_body(request_body_stub(operation, document));
            endpoints.insert(endpoint);
        }
    }

    debug!("OpenAPI document yielded {} endpoints", endpoints.len());
    endpoints.into_vec()
}

/// First 2xx response code in document order, 200 when none is declared
fn success_status(operation: &Value) -> u16 {
    operation
        .get("responses")
        .and_then(Value::as_object)
        .and_then(|responses| {
            responses
                .keys()
                .filter_map(|code| code.parse::<u16>().ok())
                .find(|code| (200..300).contains(code))
        })
        .unwrap_or(200)
}

fn request_body_stub(operation: &Value, document: &Value) -> Option<Value> {
    let content = operation
        .get("requestBody")?
        .get("content")?
        .as_object()?;

    // only the first media type entry is considered
    let media = content.values().find(|media| media.is_object())?;
    let schema = media.get("schema").filter(|s| is_truthy(s))?;
    schema_to_stub(schema, document)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// First recognised security scheme, from `components.securitySchemes`
/// (OpenAPI 3) or `securityDefinitions` (Swagger 2)
pub fn detect_auth(document: &Value) -> Option<AuthHint> {
    let schemes = document
        .get("components")
        .and_then(|c| c.get("securitySchemes"))
        .and_then(Value::as_object)
        .filter(|s| !s.is_empty())
        .or_else(|| document.get("securityDefinitions").and_then(Value::as_object))?;

    let authorization = |kind| AuthHint {
        kind,
        header: "Authorization".to_string(),
    };

    for scheme in schemes.values() {
        let Some(scheme) = scheme.as_object() else {
            continue;
        };
        let kind = scheme
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();

        match kind.as_str() {
            "http" => {
                let sub = scheme
                    .get("scheme")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_lowercase();
                match sub.as_str() {
                    "bearer" => return Some(authorization(AuthKind::Bearer)),
                    "basic" => return Some(authorization(AuthKind::Basic)),
                    _ => {}
                }
            }
            // Swagger 2 spelling
            "basic" => return Some(authorization(AuthKind::Basic)),
            "apikey" => {
                let location = scheme.get("in").and_then(Value::as_str).unwrap_or("header");
                if location == "header" {
                    let header = scheme
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("X-API-Key");
                    return Some(AuthHint {
                        kind: AuthKind::ApiKey,
                        header: header.to_string(),
                    });
                }
            }
            "oauth2" | "openidconnect" => return Some(authorization(AuthKind::Bearer)),
            _ => {}
        }
    }

    None
}
