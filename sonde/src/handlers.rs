use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sonde_core::parsers::{load_postman_collection, parse_postman};
use sonde_core::report::save_report;
use sonde_core::{
    CoreError, DiscoveryConfig, DiscoveryEngine, DiscoveryReport, DocumentFormat, ReportFormat,
    weigh_result,
};
use sonde_scanner::{DiscoveryResult, Headers, Source, bearer_headers};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Process exit status when the report carries a discovery error
pub const EXIT_DISCOVERY_ERROR: i32 = 2;

/// Accept `host[:port][/path]` as shorthand for `http://host...`
pub fn normalize_target(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("Target URL is empty");
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&candidate).with_context(|| format!("Invalid target URL '{}'", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Unsupported scheme '{}' in '{}'", url.scheme(), raw);
    }
    if url.host_str().is_none() {
        bail!("Target URL '{}' has no host", raw);
    }

    Ok(candidate)
}

/// Defaults, or the JSON file given with `--config`
pub fn load_config(path: Option<&str>) -> Result<DiscoveryConfig> {
    match path {
        Some(path) => {
            let config = DiscoveryConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path))?;
            debug!("Loaded configuration from {}", path);
            Ok(config)
        }
        None => Ok(DiscoveryConfig::default()),
    }
}

/// Read a document from disk and run the parser for `format`. Unreadable
/// files are errors; unparseable contents come back as an error result.
pub fn load_document(path: &Path, format: DocumentFormat) -> Result<DiscoveryResult> {
    if format == DocumentFormat::Postman {
        return match load_postman_collection(path) {
            Ok(collection) => Ok(parse_postman(&collection)),
            Err(CoreError::Json(e)) => Ok(DiscoveryResult::failed(
                Source::Postman,
                format!("invalid JSON: {}", e),
            )),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(format.parse(&text))
}

pub fn exit_code(result: &DiscoveryResult) -> i32 {
    if result.is_failed() {
        EXIT_DISCOVERY_ERROR
    } else {
        0
    }
}

/// Render the report to stdout, or to `output` without terminal colors
pub fn emit_report(
    report: &DiscoveryReport,
    format: ReportFormat,
    output: Option<&Path>,
) -> Result<()> {
    match output {
        Some(path) => {
            colored::control::set_override(false);
            let content = report.render(format).context("Failed to render report")?;
            colored::control::unset_override();
            save_report(&content, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report saved to {}", path.display());
            eprintln!(
                "{} Report saved to: {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => {
            let content = report.render(format).context("Failed to render report")?;
            print!("{}", content);
        }
    }
    Ok(())
}

pub async fn handle_discover(args: &ArgMatches, show_progress: bool) -> Result<i32> {
    let engine = DiscoveryEngine::new(load_config(config_arg(args))?);
    let target = normalize_target(required(args, "url")?)?;
    let token = args.get_one::<String>("token").map(String::as_str);

    let spinner = progress(show_progress, format!("Discovering API surface of {}", target));
    let result = weigh_result(engine.discover_url(&target, token).await);
    spinner.finish_and_clear();

    let headers = bearer_headers(token);
    let report = with_optional_slo(&engine, args, &target, result, &headers, show_progress).await;
    finish(args, report)
}

pub async fn handle_crawl(args: &ArgMatches, show_progress: bool) -> Result<i32> {
    let engine = DiscoveryEngine::new(load_config(config_arg(args))?);
    let seed = normalize_target(required(args, "url")?)?;
    let headers = bearer_headers(args.get_one::<String>("token").map(String::as_str));

    let limits = &engine.config().crawl;
    let max_pages = args.get_one::<usize>("max-pages").copied().unwrap_or(limits.max_pages);
    let max_depth = args.get_one::<usize>("max-depth").copied().unwrap_or(limits.max_depth);

    let spinner = progress(
        show_progress,
        format!("Crawling {} (max {} pages, depth {})", seed, max_pages, max_depth),
    );
    let result = weigh_result(engine.crawl_url(&seed, &headers, max_pages, max_depth).await);
    spinner.finish_and_clear();

    // crawled endpoints are origin-relative
    let base = Url::parse(&seed)
        .map(|url| url.origin().ascii_serialization())
        .unwrap_or_else(|_| seed.clone());
    let report = with_optional_slo(&engine, args, &base, result, &headers, show_progress).await;
    finish(args, report)
}

pub async fn handle_parse(args: &ArgMatches, show_progress: bool) -> Result<i32> {
    let format_name = required(args, "document-format")?;
    let format = DocumentFormat::from_str(format_name)
        .with_context(|| format!("Unknown document format '{}'", format_name))?;
    let path = args
        .get_one::<PathBuf>("FILE")
        .context("A document path is required")?;

    let spinner = progress(show_progress, format!("Parsing {}", path.display()));
    let result = weigh_result(load_document(path, format)?);
    spinner.finish_and_clear();

    finish(args, DiscoveryReport::new(result))
}

async fn with_optional_slo(
    engine: &DiscoveryEngine,
    args: &ArgMatches,
    base_url: &str,
    result: DiscoveryResult,
    headers: &Headers,
    show_progress: bool,
) -> DiscoveryReport {
    if !args.get_flag("slo") || result.is_failed() {
        return DiscoveryReport::new(result);
    }

    let spinner = progress(show_progress, format!("Measuring SLO baseline for {}", base_url));
    let slo = engine.baseline_slo(base_url, &result.endpoints, headers).await;
    spinner.finish_and_clear();
    DiscoveryReport::new(result).with_slo(slo)
}

fn finish(args: &ArgMatches, report: DiscoveryReport) -> Result<i32> {
    let format = report_format(args)?;
    let output = args.get_one::<PathBuf>("output").map(PathBuf::as_path);
    emit_report(&report, format, output)?;
    Ok(exit_code(&report.result))
}

fn report_format(args: &ArgMatches) -> Result<ReportFormat> {
    // `parse` uses --format for the document, so its report flag is renamed
    let id = if args.try_contains_id("report-format").is_ok() {
        "report-format"
    } else {
        "format"
    };
    let name = args.get_one::<String>(id).map(String::as_str).unwrap_or("text");
    ReportFormat::from_str(name).with_context(|| format!("Unknown report format '{}'", name))
}

fn config_arg(args: &ArgMatches) -> Option<&str> {
    args.get_one::<String>("config").map(String::as_str)
}

fn required<'a>(args: &'a ArgMatches, id: &str) -> Result<&'a str> {
    args.get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("--{} is required", id))
}

fn progress(visible: bool, message: String) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message);
    spinner
}
