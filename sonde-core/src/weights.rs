use sonde_scanner::{DiscoveryResult, Endpoint};

/// Liveness and root paths carry no load
const HEALTH_PATHS: [&str; 6] = ["/", "/health", "/healthz", "/ping", "/status", "/api"];

pub fn weight_for(endpoint: &Endpoint) -> u32 {
    let path = endpoint.path.to_lowercase();
    if HEALTH_PATHS.contains(&path.as_str()) {
        return 0;
    }
    if endpoint.is_graphql() {
        return if endpoint.group == "mutation" { 1 } else { 3 };
    }
    match endpoint.method.to_uppercase().as_str() {
        "GET" => 3,
        "POST" | "PUT" | "PATCH" => 2,
        _ => 1,
    }
}

/// Overwrite every endpoint's weight in place. Idempotent.
pub fn assign_weights(endpoints: &mut [Endpoint]) {
    for endpoint in endpoints.iter_mut() {
        endpoint.weight = weight_for(endpoint);
    }
}

pub fn weigh_result(mut result: DiscoveryResult) -> DiscoveryResult {
    assign_weights(&mut result.endpoints);
    result
}
