use roxmltree::{Document, Node};
use serde_json::Value;
use sonde_scanner::endpoint::normalize_path;
use sonde_scanner::{DiscoveryResult, Endpoint, EndpointSet, Source};
use tracing::warn;
use url::Url;

const DEFAULT_SERVICE: &str = "soap";
const DEFAULT_SOAP_PATH: &str = "/soap";

/// SOAP operations from a WSDL 1.1 document. Elements are matched by local
/// name so both prefixed (`wsdl:portType`) and default-namespace documents work.
pub fn parse_wsdl(text: &str) -> DiscoveryResult {
    let document = match Document::parse(text) {
        Ok(document) => document,
        Err(e) => {
            warn!("Malformed WSDL: {}", e);
            return DiscoveryResult::failed(Source::Wsdl, e.to_string());
        }
    };
    let root = document.root_element();

    let service = root
        .children()
        .find(|n| is_element(n, "service"))
        .and_then(|svc| svc.attribute("name"))
        .unwrap_or(DEFAULT_SERVICE);
    let soap_path = transport_path(root);

    let mut endpoints = EndpointSet::new();
    for port_type in root.descendants().filter(|n| is_element(n, "portType")) {
        for operation in port_type.children().filter(|n| is_element(n, "operation")) {
            let op_name = operation.attribute("name").unwrap_or("operation");
            let endpoint = Endpoint::rest("POST", &soap_path)
                .with_name(op_name)
                .with_group(service)
                .with_body(Some(Value::String(soap_envelope(op_name, service))));
            // every operation shares the transport path, so key by operation
            endpoints.insert_keyed(format!("soap:{}", op_name), endpoint);
        }
    }

    DiscoveryResult::new(Source::Wsdl, endpoints.into_vec())
}

fn is_element(node: &Node<'_, '_>, local_name: &str) -> bool {
    node.is_element() && node.tag_name().name() == local_name
}

/// Path of the first `<port>` child carrying a `location` attribute
fn transport_path(root: Node<'_, '_>) -> String {
    let location = root
        .descendants()
        .filter(|n| is_element(n, "port"))
        .find_map(|port| {
            port.children()
                .filter(Node::is_element)
                .find_map(|addr| addr.attribute("location"))
                .filter(|loc| !loc.is_empty())
        });

    match location {
        Some(loc) => match Url::parse(loc) {
            Ok(url) if !url.path().is_empty() && url.path() != "/" => url.path().to_string(),
            Ok(_) => DEFAULT_SOAP_PATH.to_string(),
            Err(_) if loc.starts_with('/') => normalize_path(loc),
            Err(_) => DEFAULT_SOAP_PATH.to_string(),
        },
        None => DEFAULT_SOAP_PATH.to_string(),
    }
}

pub fn soap_envelope(operation: &str, namespace: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<soap:Body><{op} xmlns="{ns}"></{op}></soap:Body>"#,
            "</soap:Envelope>"
        ),
        op = operation,
        ns = namespace
    )
}
