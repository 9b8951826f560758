//! Discovery settings: candidate paths, per-request timeouts and crawl/SLO limits.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use sonde_scanner::probe::DEFAULT_USER_AGENT;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const OPENAPI_PATHS: &[&str] = &[
    "/openapi.json",
    "/swagger.json",
    "/api/openapi.json",
    "/api/swagger.json",
    "/api/v1/openapi.json",
    "/docs/openapi.json",
    "/api-docs",
    "/api/docs",
    "/api/v1/swagger.json",
    "/v1/openapi.json",
    "/v2/openapi.json",
    "/swagger/v1/swagger.json",
];

const GRAPHQL_PATHS: &[&str] = &["/graphql", "/api/graphql", "/api/v1alpha", "/api/v1/graphql"];

const REST_PATHS: &[&str] = &[
    "/",
    "/api",
    "/api/v1",
    "/v1",
    "/v2",
    "/objects",
    "/items",
    "/users",
    "/products",
    "/orders",
    "/posts",
    "/resources",
    "/data",
    "/entries",
    "/records",
    "/events",
    "/api/objects",
    "/api/items",
    "/api/users",
    "/api/v1/users",
    "/api/v1/items",
];

fn owned(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub user_agent: String,
    pub openapi_paths: Vec<String>,
    pub graphql_paths: Vec<String>,
    pub rest_paths: Vec<String>,
    pub timeouts: Timeouts,
    pub crawl: CrawlLimits,
    pub slo: SloSettings,
}

/// Per-request timeouts in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub openapi: u64,
    pub graphql: u64,
    pub rest_probe: u64,
    pub crawl_page: u64,
    pub crawl_script: u64,
    pub slo: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlLimits {
    pub max_pages: usize,
    pub max_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SloSettings {
    pub sample: usize,
    pub attempts: usize,
    pub apdex_threshold_ms: f64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            openapi_paths: owned(OPENAPI_PATHS),
            graphql_paths: owned(GRAPHQL_PATHS),
            rest_paths: owned(REST_PATHS),
            timeouts: Timeouts::default(),
            crawl: CrawlLimits::default(),
            slo: SloSettings::default(),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            openapi: 5,
            graphql: 8,
            rest_probe: 4,
            crawl_page: 6,
            crawl_script: 5,
            slo: 5,
        }
    }
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_pages: 30,
            max_depth: 2,
        }
    }
}

impl Default for SloSettings {
    fn default() -> Self {
        Self {
            sample: 5,
            attempts: 3,
            apdex_threshold_ms: 500.0,
        }
    }
}

impl Timeouts {
    pub fn openapi(&self) -> Duration {
        Duration::from_secs(self.openapi)
    }

    pub fn graphql(&self) -> Duration {
        Duration::from_secs(self.graphql)
    }

    pub fn rest_probe(&self) -> Duration {
        Duration::from_secs(self.rest_probe)
    }

    pub fn crawl_page(&self) -> Duration {
        Duration::from_secs(self.crawl_page)
    }

    pub fn crawl_script(&self) -> Duration {
        Duration::from_secs(self.crawl_script)
    }

    pub fn slo(&self) -> Duration {
        Duration::from_secs(self.slo)
    }
}

impl DiscoveryConfig {
    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &str) -> Result<Self> {
        let expanded = shellexpand::tilde(path);
        let path = Path::new(expanded.as_ref());
        debug!("Loading config from {}", path.display());

        let text = std::fs::read_to_string(path)?;
        let config: DiscoveryConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(CoreError::Config("user_agent must not be empty".to_string()));
        }
        if self.slo.attempts == 0 {
            return Err(CoreError::Config("slo.attempts must be at least 1".to_string()));
        }
        if self.slo.apdex_threshold_ms <= 0.0 {
            return Err(CoreError::Config(
                "slo.apdex_threshold_ms must be positive".to_string(),
            ));
        }
        let all_paths = self
            .openapi_paths
            .iter()
            .chain(&self.graphql_paths)
            .chain(&self.rest_paths);
        for path in all_paths {
            if !path.starts_with('/') {
                return Err(CoreError::Config(format!(
                    "candidate path '{}' must start with '/'",
                    path
                )));
            }
        }
        Ok(())
    }
}
