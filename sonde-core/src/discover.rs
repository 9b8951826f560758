//! Discovery orchestration: OpenAPI, then GraphQL, then a REST path probe.

use crate::config::DiscoveryConfig;
use crate::parsers::parse_openapi;
use crate::slo::{SloBaseline, SloProber};
use serde_json::Value;
use sonde_scanner::endpoint::sanitize_name;
use sonde_scanner::{
    Crawler, DiscoveryResult, Endpoint, EndpointSet, Headers, HttpProbe, Source, bearer_headers,
    graphql,
};
use tracing::{debug, info, warn};

pub const NOTHING_FOUND: &str = "No discoverable API spec found at standard paths";

/// Stateless entry point for live discovery. One engine can serve concurrent
/// callers; every call owns its own crawl state.
#[derive(Clone)]
pub struct DiscoveryEngine {
    probe: HttpProbe,
    config: DiscoveryConfig,
}

impl DiscoveryEngine {
    pub fn new(config: DiscoveryConfig) -> Self {
        let probe = HttpProbe::with_user_agent(&config.user_agent);
        Self { probe, config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Try OpenAPI documents, then GraphQL introspection, then common REST
    /// collection paths. The first strategy that finds anything wins.
    pub async fn discover_url(&self, base_url: &str, token: Option<&str>) -> DiscoveryResult {
        let base = base_url.trim_end_matches('/');
        let headers = bearer_headers(token);
        info!("Discovering API surface of {}", base);

        if let Some(result) = self.find_openapi(base, &headers).await {
            return result;
        }

        for path in &self.config.graphql_paths {
            let target = format!("{}{}", base, path);
            if let Some(result) =
                graphql::introspect(&self.probe, &target, &headers, self.config.timeouts.graphql())
                    .await
            {
                info!("GraphQL schema found at {}", target);
                return result;
            }
        }

        let endpoints = self.probe_rest_endpoints(base, &headers).await;
        if !endpoints.is_empty() {
            info!("REST probe found {} endpoints", endpoints.len());
            return DiscoveryResult::new(Source::RestProbe, endpoints).with_source_url(base);
        }

        warn!("Nothing discoverable at {}", base);
        DiscoveryResult::failed(Source::None, NOTHING_FOUND)
    }

    async fn find_openapi(&self, base: &str, headers: &Headers) -> Option<DiscoveryResult> {
        for path in &self.config.openapi_paths {
            let target = format!("{}{}", base, path);
            let response = self
                .probe
                .get(&target, headers, self.config.timeouts.openapi())
                .await;
            if response.status != 200 || response.is_empty() {
                continue;
            }

            let Some(document) = response.json::<Value>() else {
                debug!("{} is not JSON", target);
                continue;
            };
            let is_spec = document
                .as_object()
                .is_some_and(|doc| ["paths", "openapi", "swagger"].iter().any(|k| doc.contains_key(*k)));
            if !is_spec {
                continue;
            }

            info!("OpenAPI document found at {}", target);
            // even an empty document ends discovery here
            return Some(parse_openapi(&document).with_source_url(target));
        }
        None
    }

    /// GET each configured REST path; a 200 with a JSON body counts as a hit
    pub async fn probe_rest_endpoints(&self, base_url: &str, headers: &Headers) -> Vec<Endpoint> {
        let base = base_url.trim_end_matches('/');
        let mut endpoints = EndpointSet::new();

        for path in &self.config.rest_paths {
            if endpoints.contains(&format!("GET:{}", path)) {
                continue;
            }
            let url = format!("{}{}", base, path);
            let response = self
                .probe
                .get(&url, headers, self.config.timeouts.rest_probe())
                .await;
            if response.status != 200 || response.is_empty() || response.json::<Value>().is_none() {
                continue;
            }

            let group = path
                .split('/')
                .filter(|seg| !seg.is_empty())
                .last()
                .unwrap_or("root")
                .to_string();
            let name = sanitize_name(&group);
            debug!("REST probe hit {}", url);
            endpoints.insert(
                Endpoint::rest("GET", path)
                    .with_group(group)
                    .with_name(&name),
            );
        }

        endpoints.into_vec()
    }

    /// Introspect a GraphQL URL with an optional bearer token
    pub async fn graphql_introspection(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Option<DiscoveryResult> {
        graphql::introspect(
            &self.probe,
            url,
            &bearer_headers(token),
            self.config.timeouts.graphql(),
        )
        .await
    }

    /// Same-origin crawl from `seed_url`. Never invoked by [`Self::discover_url`].
    pub async fn crawl_url(
        &self,
        seed_url: &str,
        headers: &Headers,
        max_pages: usize,
        max_depth: usize,
    ) -> DiscoveryResult {
        let timeouts = &self.config.timeouts;
        let crawler = Crawler::new(self.probe.clone())
            .with_headers(headers.clone())
            .with_max_pages(max_pages)
            .with_max_depth(max_depth)
            .with_timeouts(timeouts.crawl_page(), timeouts.crawl_script(), timeouts.graphql());

        match crawler.crawl(seed_url).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Crawl of {} failed: {}", seed_url, e);
                DiscoveryResult::failed(Source::Crawl, e.to_string()).with_source_url(seed_url)
            }
        }
    }

    /// Measured latency/error baseline for the GET endpoints of `endpoints`
    pub async fn baseline_slo(
        &self,
        base_url: &str,
        endpoints: &[Endpoint],
        headers: &Headers,
    ) -> SloBaseline {
        SloProber::new(
            self.probe.clone(),
            self.config.slo.clone(),
            self.config.timeouts.slo(),
        )
        .probe(base_url, endpoints, headers)
        .await
    }
}

impl Default for DiscoveryEngine {
    fn default() -> Self {
        Self::new(DiscoveryConfig::default())
    }
}
