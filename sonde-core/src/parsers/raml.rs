#[cfg(feature = "raml")]
pub use yaml::parse_raml;

/// Without the `raml` feature there is no YAML parser to hand the document to.
#[cfg(not(feature = "raml"))]
pub fn parse_raml(_text: &str) -> sonde_scanner::DiscoveryResult {
    sonde_scanner::DiscoveryResult::failed(sonde_scanner::Source::Raml, "serde_yaml not installed")
}

#[cfg(feature = "raml")]
mod yaml {
    use serde_json::Value;
    use serde_yaml::{Mapping, Value as Yaml};
    use sonde_scanner::endpoint::group_for_path;
    use sonde_scanner::{DiscoveryResult, Endpoint, EndpointSet, Source};
    use tracing::warn;

    const HTTP_METHODS: [&str; 7] = ["get", "post", "put", "patch", "delete", "head", "options"];

    /// Walk RAML resources (keys starting with `/`), emitting one endpoint per
    /// HTTP method found directly under a resource.
    pub fn parse_raml(text: &str) -> DiscoveryResult {
        let document: Yaml = match serde_yaml::from_str(text) {
            Ok(document) => document,
            Err(e) => {
                warn!("Malformed RAML: {}", e);
                return DiscoveryResult::failed(Source::Raml, e.to_string());
            }
        };

        let mut endpoints = EndpointSet::new();
        if let Some(root) = document.as_mapping() {
            walk(root, "", &mut endpoints);
        }
        DiscoveryResult::new(Source::Raml, endpoints.into_vec())
    }

    fn walk(node: &Mapping, parent: &str, endpoints: &mut EndpointSet) {
        for (key, value) in node {
            let Some(segment) = key.as_str().filter(|k| k.starts_with('/')) else {
                continue;
            };
            let path = format!("{}{}", parent, segment);
            let Some(resource) = value.as_mapping() else {
                continue;
            };
            let group = group_for_path(&path, "api");

            for (method_key, method_node) in resource {
                let Some(method) = method_key
                    .as_str()
                    .filter(|m| HTTP_METHODS.contains(&m.to_lowercase().as_str()))
                else {
                    continue;
                };
                let endpoint = Endpoint::rest(method, &path)
                    .with_group(group.clone())
                    .with_body(example_body(method_node));
                endpoints.insert(endpoint);
            }

            walk(resource, &path, endpoints);
        }
    }

    /// First non-empty `body.<media-type>.example`
    fn example_body(method_node: &Yaml) -> Option<Value> {
        let body = method_node.get("body")?.as_mapping()?;
        body.values()
            .filter_map(|media| media.get("example"))
            .find(|example| is_truthy(example))
            .and_then(to_json)
    }

    fn is_truthy(value: &Yaml) -> bool {
        match value {
            Yaml::Null => false,
            Yaml::Bool(b) => *b,
            Yaml::String(s) => !s.is_empty(),
            Yaml::Sequence(seq) => !seq.is_empty(),
            Yaml::Mapping(map) => !map.is_empty(),
            _ => true,
        }
    }

    /// Examples are often JSON written as a YAML block string
    fn to_json(example: &Yaml) -> Option<Value> {
        if let Some(text) = example.as_str()
            && let Ok(parsed) = serde_json::from_str::<Value>(text)
        {
            return Some(parsed);
        }
        serde_json::to_value(example).ok()
    }

}
