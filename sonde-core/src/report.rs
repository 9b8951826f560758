// Report rendering for discovery results

use crate::slo::SloBaseline;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use sonde_scanner::{DiscoveryResult, Endpoint, EndpointKind};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

/// A discovery result plus the optional SLO baseline measured against it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    #[serde(flatten)]
    pub result: DiscoveryResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slo: Option<SloBaseline>,
}

impl DiscoveryReport {
    pub fn new(result: DiscoveryResult) -> Self {
        Self { result, slo: None }
    }

    pub fn with_slo(mut self, slo: SloBaseline) -> Self {
        self.slo = Some(slo);
        self
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(generate_text_report(self)),
            ReportFormat::Json => generate_json_report(self),
            ReportFormat::Markdown => Ok(generate_markdown_report(self)),
        }
    }

    /// Endpoints bucketed by group, groups sorted by name
    fn grouped(&self) -> BTreeMap<&str, Vec<&Endpoint>> {
        let mut groups: BTreeMap<&str, Vec<&Endpoint>> = BTreeMap::new();
        for endpoint in &self.result.endpoints {
            groups.entry(endpoint.group.as_str()).or_default().push(endpoint);
        }
        groups
    }
}

pub fn generate_text_report(report: &DiscoveryReport) -> String {
    let result = &report.result;
    let mut out = String::new();

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str("                        SONDE API DISCOVERY REPORT\n");
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    out.push_str(&format!("Source:       {}\n", result.source.to_string().bold()));
    if let Some(ref url) = result.source_url {
        out.push_str(&format!("Source URL:   {}\n", url));
    }
    out.push_str(&format!("Endpoints:    {}\n", result.endpoints.len()));
    if let Some(ref auth) = result.auth {
        let kind = serde_json::to_value(auth.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        out.push_str(&format!("Auth:         {} via {}\n", kind, auth.header));
    }
    if let Some(ref crawl) = result.crawl {
        out.push_str(&format!(
            "Crawl:        {} pages, {} scripts, {} GraphQL schemas\n",
            crawl.pages_crawled, crawl.scripts_scanned, crawl.graphql_schemas_scanned
        ));
    }
    if let Some(ref error) = result.error {
        out.push_str(&format!("Error:        {}\n", error.red()));
    }
    out.push('\n');

    for (group, endpoints) in report.grouped() {
        out.push_str(&format!("[{}]\n", group.cyan().bold()));
        for endpoint in endpoints {
            out.push_str(&format!(
                "  {}  {}  w={}  {}\n",
                method_label(endpoint),
                endpoint.path,
                endpoint.weight,
                endpoint.name.dimmed()
            ));
        }
        out.push('\n');
    }

    if let Some(slo) = report.slo {
        out.push_str("SLO BASELINE\n");
        out.push_str(&format!("  p95:         {}\n", format_metric(slo.p95_ms, " ms")));
        out.push_str(&format!("  error rate:  {}\n", format_metric(slo.error_rate, "")));
        out.push_str(&format!("  apdex:       {}\n", format_metric(slo.apdex_score, "")));
        out.push('\n');
    }

    out
}

pub fn generate_json_report(report: &DiscoveryReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

pub fn generate_markdown_report(report: &DiscoveryReport) -> String {
    let result = &report.result;
    let mut out = String::new();

    out.push_str("# API Discovery Report\n\n");
    out.push_str(&format!("- **Source:** `{}`\n", result.source));
    if let Some(ref url) = result.source_url {
        out.push_str(&format!("- **Source URL:** {}\n", url));
    }
    out.push_str(&format!("- **Endpoints:** {}\n", result.endpoints.len()));
    if let Some(ref crawl) = result.crawl {
        out.push_str(&format!(
            "- **Crawl:** {} pages, {} scripts, {} GraphQL schemas\n",
            crawl.pages_crawled, crawl.scripts_scanned, crawl.graphql_schemas_scanned
        ));
    }
    if let Some(ref error) = result.error {
        out.push_str(&format!("- **Error:** {}\n", error));
    }
    out.push('\n');

    for (group, endpoints) in report.grouped() {
        out.push_str(&format!("## {}\n\n", group));
        out.push_str("| Method | Path | Weight | Name | Expected |\n");
        out.push_str("|--------|------|--------|------|----------|\n");
        for endpoint in endpoints {
            let method = match endpoint.kind {
                EndpointKind::Rest => endpoint.method.clone(),
                EndpointKind::Graphql => endpoint.group.to_uppercase(),
            };
            out.push_str(&format!(
                "| {} | `{}` | {} | {} | {} |\n",
                method, endpoint.path, endpoint.weight, endpoint.name, endpoint.checks.status
            ));
        }
        out.push('\n');
    }

    if let Some(slo) = report.slo {
        out.push_str("## SLO Baseline\n\n");
        out.push_str("| p95 (ms) | Error rate | Apdex |\n");
        out.push_str("|----------|------------|-------|\n");
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            format_metric(slo.p95_ms, ""),
            format_metric(slo.error_rate, ""),
            format_metric(slo.apdex_score, "")
        ));
    }

    out
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn method_label(endpoint: &Endpoint) -> String {
    let label = match endpoint.kind {
        EndpointKind::Rest => format!("{:<8}", endpoint.method),
        EndpointKind::Graphql => format!("{:<8}", endpoint.group.to_uppercase()),
    };
    match endpoint.method.as_str() {
        _ if endpoint.kind == EndpointKind::Graphql => label.magenta().to_string(),
        "GET" => label.green().to_string(),
        "POST" | "PUT" | "PATCH" => label.yellow().to_string(),
        "DELETE" => label.red().to_string(),
        _ => label.normal().to_string(),
    }
}

fn format_metric(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{}{}", v, unit),
        None => "n/a".to_string(),
    }
}
