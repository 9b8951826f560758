//! Static API description parsers.
//!
//! Every parser is pure and infallible: a malformed document comes back as a
//! [`DiscoveryResult`] carrying `error` and no endpoints.

pub mod blueprint;
pub mod har;
pub mod openapi;
pub mod postman;
pub mod raml;
pub mod wsdl;

pub use blueprint::parse_api_blueprint;
pub use har::parse_har;
pub use openapi::{detect_auth, openapi_to_endpoints, parse_openapi};
pub use postman::{load_postman_collection, parse_postman};
pub use raml::parse_raml;
pub use wsdl::parse_wsdl;

use serde_json::Value;
use sonde_scanner::{DiscoveryResult, Source};
use tracing::warn;

/// Declared format of a caller-supplied document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    OpenApi,
    Postman,
    Har,
    Wsdl,
    ApiBlueprint,
    Raml,
}

impl DocumentFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openapi" | "swagger" => Some(DocumentFormat::OpenApi),
            "postman" => Some(DocumentFormat::Postman),
            "har" => Some(DocumentFormat::Har),
            "wsdl" | "soap" => Some(DocumentFormat::Wsdl),
            "api-blueprint" | "apib" | "blueprint" => Some(DocumentFormat::ApiBlueprint),
            "raml" => Some(DocumentFormat::Raml),
            _ => None,
        }
    }

    pub fn source(&self) -> Source {
        match self {
            DocumentFormat::OpenApi => Source::Openapi,
            DocumentFormat::Postman => Source::Postman,
            DocumentFormat::Har => Source::Har,
            DocumentFormat::Wsdl => Source::Wsdl,
            DocumentFormat::ApiBlueprint => Source::ApiBlueprint,
            DocumentFormat::Raml => Source::Raml,
        }
    }

    /// Parse raw document text. JSON formats are decoded first.
    pub fn parse(&self, text: &str) -> DiscoveryResult {
        match self {
            DocumentFormat::OpenApi => with_json(self.source(), text, parse_openapi),
            DocumentFormat::Postman => with_json(self.source(), text, parse_postman),
            DocumentFormat::Har => with_json(self.source(), text, parse_har),
            DocumentFormat::Wsdl => parse_wsdl(text),
            DocumentFormat::ApiBlueprint => parse_api_blueprint(text),
            DocumentFormat::Raml => parse_raml(text),
        }
    }
}

fn with_json(source: Source, text: &str, parse: fn(&Value) -> DiscoveryResult) -> DiscoveryResult {
    match serde_json::from_str::<Value>(text) {
        Ok(document) => parse(&document),
        Err(e) => {
            warn!("{} document is not valid JSON: {}", source, e);
            DiscoveryResult::failed(source, format!("invalid JSON: {}", e))
        }
    }
}
