use crate::endpoint::{
    CrawlStats, DiscoveryResult, Endpoint, EndpointKind, EndpointSet, Source, normalize_path,
    strip_query_fragment,
};
use crate::error::{Result, ScanError};
use crate::graphql;
use crate::probe::{Headers, HttpProbe};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Same-origin BFS crawler that infers API endpoints from HTML and JavaScript.
///
/// Pages are fetched one at a time. Every call to [`Crawler::crawl`] owns its
/// own [`CrawlState`], so one crawler can serve concurrent callers.
pub struct Crawler {
    probe: HttpProbe,
    headers: Headers,
    max_pages: usize,
    max_depth: usize,
    page_timeout: Duration,
    script_timeout: Duration,
    graphql_timeout: Duration,
}

/// Per-crawl bookkeeping
#[derive(Debug, Default)]
struct CrawlState {
    seen_pages: HashSet<String>,
    seen_scripts: HashSet<String>,
    endpoints: EndpointSet,
    queue: VecDeque<(String, usize)>,
    pages_crawled: usize,
}

/// Links, forms and scripts pulled out of one HTML page
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// `(METHOD, href)` for anchors and form actions
    pub links: Vec<(String, String)>,
    pub scripts: Vec<String>,
}

struct JsPattern {
    name: &'static str,
    regex: Regex,
    path_group: usize,
    method_group: Option<usize>,
}

impl Crawler {
    pub fn new(probe: HttpProbe) -> Self {
        Self {
            probe,
            headers: Headers::new(),
            max_pages: 30,
            max_depth: 2,
            page_timeout: Duration::from_secs(6),
            script_timeout: Duration::from_secs(5),
            graphql_timeout: graphql::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_timeouts(mut self, page: Duration, script: Duration, graphql: Duration) -> Self {
        self.page_timeout = page;
        self.script_timeout = script;
        self.graphql_timeout = graphql;
        self
    }

    pub async fn crawl(&self, seed_url: &str) -> Result<DiscoveryResult> {
        info!(
            "Starting crawl of {} (max_pages={}, max_depth={})",
            seed_url, self.max_pages, self.max_depth
        );

        let seed = Url::parse(seed_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", seed_url, e)))?;

        let mut state = CrawlState::default();
        state.queue.push_back((seed.to_string(), 0));

        while state.seen_pages.len() < self.max_pages {
            let Some((url, depth)) = state.queue.pop_front() else {
                break;
            };

            let normalized = strip_query_fragment(&url).to_string();
            if !state.seen_pages.insert(normalized) {
                continue;
            }

            let response = self.probe.get(&url, &self.headers, self.page_timeout).await;
            if response.status == 0 || response.is_empty() {
                debug!("Skipping {} (status {})", url, response.status);
                continue;
            }
            state.pages_crawled += 1;

            let Ok(page_url) = Url::parse(&url) else {
                continue;
            };
            let text = response.text();
            let found = extract_page_links(&text);
            debug!(
                "Fetched {} at depth {}: {} links, {} scripts",
                url,
                depth,
                found.links.len(),
                found.scripts.len()
            );

            for (method, href) in &found.links {
                if is_ignored_href(href) {
                    continue;
                }
                let Ok(target) = page_url.join(href) else {
                    continue;
                };
                if target.origin() != seed.origin() {
                    debug!("  -> Cross-origin, skipping {}", target);
                    continue;
                }

                let path = if target.path().is_empty() { "/" } else { target.path() };
                register(&mut state.endpoints, method, path);

                let target_norm = strip_query_fragment(target.as_str());
                if depth < self.max_depth
                    && !state.seen_pages.contains(target_norm)
                    && !is_static_asset(path)
                {
                    state.queue.push_back((target.to_string(), depth + 1));
                }
            }

            for src in &found.scripts {
                let Ok(script_url) = page_url.join(src) else {
                    continue;
                };
                let script_norm = strip_query_fragment(script_url.as_str()).to_string();
                if !state.seen_scripts.insert(script_norm) {
                    continue;
                }

                let script = self
                    .probe
                    .get(script_url.as_str(), &self.headers, self.script_timeout)
                    .await;
                if script.status == 200 && !script.is_empty() {
                    scan_into(&mut state.endpoints, &script.text());
                } else {
                    debug!("Script {} unavailable (status {})", script_url, script.status);
                }
            }

            scan_into(&mut state.endpoints, &text);
        }

        let graphql_schemas_scanned = self.sweep_graphql(&seed, &mut state.endpoints).await;

        let stats = CrawlStats {
            pages_crawled: state.pages_crawled,
            scripts_scanned: state.seen_scripts.len(),
            graphql_schemas_scanned,
        };
        info!(
            "Crawl complete. {} pages, {} scripts, {} endpoints, {} GraphQL schemas",
            stats.pages_crawled,
            stats.scripts_scanned,
            state.endpoints.len(),
            stats.graphql_schemas_scanned
        );

        let mut result = DiscoveryResult::new(Source::Crawl, state.endpoints.into_vec())
            .with_source_url(seed_url);
        result.crawl = Some(stats);
        Ok(result)
    }

    /// Introspect every GraphQL-looking path and replace its REST placeholder
    /// with the expanded operation set.
    async fn sweep_graphql(&self, seed: &Url, endpoints: &mut EndpointSet) -> usize {
        let candidates = graphql_candidates(endpoints);
        if candidates.is_empty() {
            return 0;
        }

        let origin = seed.origin().ascii_serialization();
        let no_headers = Headers::new();
        let mut scanned = 0;

        for path in candidates {
            let target = format!("{}{}", origin, path);
            let mut result =
                graphql::introspect(&self.probe, &target, &self.headers, self.graphql_timeout)
                    .await;
            if result.is_none() && !self.headers.is_empty() {
                debug!("Retrying introspection of {} without credentials", target);
                result =
                    graphql::introspect(&self.probe, &target, &no_headers, self.graphql_timeout)
                        .await;
            }

            let Some(result) = result.filter(|r| !r.endpoints.is_empty()) else {
                continue;
            };

            scanned += 1;
            for method in ["GET", "POST", "PUT"] {
                endpoints.remove(&format!("{}:{}", method, path));
            }
            for ep in result.endpoints {
                endpoints.insert(ep);
            }
        }

        scanned
    }
}

/// Pull anchors, form actions and script sources out of an HTML document
pub fn extract_page_links(html: &str) -> PageLinks {
    let document = Html::parse_document(html);
    let mut found = PageLinks::default();

    let link_selector = Selector::parse("a[href]").expect("anchor selector is valid");
    for element in document.select(&link_selector) {
        if let Some(href) = element.value().attr("href")
            && !href.is_empty()
        {
            found.links.push(("GET".to_string(), href.to_string()));
        }
    }

    let form_selector = Selector::parse("form[action]").expect("form selector is valid");
    for element in document.select(&form_selector) {
        let action = element.value().attr("action").unwrap_or_default();
        if action.is_empty() {
            continue;
        }
        let method = element
            .value()
            .attr("method")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or("GET")
            .trim()
            .to_uppercase();
        found.links.push((method, action.to_string()));
    }

    let script_selector = Selector::parse("script[src]").expect("script selector is valid");
    for element in document.select(&script_selector) {
        if let Some(src) = element.value().attr("src")
            && !src.is_empty()
        {
            found.scripts.push(src.to_string());
        }
    }

    found
}

/// Scan JavaScript (or any page text) for API paths, returning `(METHOD, path)`
/// in pattern order. Matches are not de-duplicated here.
pub fn scan_script_text(text: &str) -> Vec<(String, String)> {
    let mut hits = Vec::new();
    for pattern in js_patterns() {
        for caps in pattern.regex.captures_iter(text) {
            let Some(path) = caps.get(pattern.path_group) else {
                continue;
            };
            let method = pattern
                .method_group
                .and_then(|group| caps.get(group))
                .map(|m| m.as_str().to_uppercase())
                .unwrap_or_else(|| "GET".to_string());
            debug!("  [{}] {} {}", pattern.name, method, path.as_str());
            hits.push((method, path.as_str().to_string()));
        }
    }
    hits
}

/// Static assets never count as API endpoints
pub fn is_static_asset(path: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\.(css|js|mjs|ts|png|jpg|jpeg|gif|svg|ico|woff2?|ttf|eot|map|pdf|zip|gz|tar|mp4|webm|webp)$",
        )
        .expect("static asset regex is valid")
    })
    .is_match(path)
}

fn is_ignored_href(href: &str) -> bool {
    href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
}

fn scan_into(endpoints: &mut EndpointSet, text: &str) {
    for (method, path) in scan_script_text(text) {
        register(endpoints, &method, &path);
    }
}

fn register(endpoints: &mut EndpointSet, method: &str, raw_path: &str) {
    if !raw_path.starts_with('/') {
        return;
    }
    let path = normalize_path(raw_path);
    if path.len() < 2 || is_static_asset(&path) {
        return;
    }
    endpoints.insert(Endpoint::rest(method, &path));
}

fn graphql_candidates(endpoints: &EndpointSet) -> BTreeSet<String> {
    static SOCKET_SUFFIX: OnceLock<Regex> = OnceLock::new();
    static VERSIONED: OnceLock<Regex> = OnceLock::new();
    let socket_suffix = SOCKET_SUFFIX.get_or_init(|| {
        Regex::new(r"(?i)[_\-](?:socket|ws|websocket)$").expect("socket suffix regex is valid")
    });
    let versioned = VERSIONED.get_or_init(|| {
        Regex::new(r"(?i)^(?:/api)?/v\d+[a-z]*\d*(?:/|$)").expect("versioned path regex is valid")
    });

    let mut candidates = BTreeSet::new();
    for ep in endpoints.iter().filter(|ep| ep.kind == EndpointKind::Rest) {
        let path = ep.path.as_str();
        if path.to_lowercase().contains("graphql") {
            candidates.insert(path.to_string());
            let bare = socket_suffix.replace(path, "");
            if bare != path {
                candidates.insert(bare.into_owned());
            }
        } else if versioned.is_match(path) {
            candidates.insert(path.to_string());
        }
    }
    candidates
}

fn js_patterns() -> &'static [JsPattern] {
    static PATTERNS: OnceLock<Vec<JsPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |name: &str, pattern: &str| {
            Regex::new(pattern).unwrap_or_else(|e| panic!("{} regex is invalid: {}", name, e))
        };
        vec![
            // fetch('/api/...'), axios.get('/api/...')
            JsPattern {
                name: "fetch_axios",
                regex: compile(
                    "fetch_axios",
                    r#"(?i)(?:fetch|axios\.(?:get|post|put|delete|patch|head))\s*\(\s*['"`](/[^'"`\s]{2,120})['"`]"#,
                ),
                path_group: 1,
                method_group: None,
            },
            // url: '/api/...', endpoint = '/v1/...'
            JsPattern {
                name: "url_key",
                regex: compile(
                    "url_key",
                    r#"(?i)(?:url|endpoint|path|href)\s*[:=]\s*['"`](/[a-z0-9_/\-{}]{2,100})['"`]"#,
                ),
                path_group: 1,
                method_group: None,
            },
            // bare '/api/...', '/v2/...', '/graphql', '/rest/...', '/rpc/...'
            JsPattern {
                name: "bare_api_path",
                regex: compile(
                    "bare_api_path",
                    r#"(?i)['"`](/(?:api|v\d+|graphql|rest|rpc)[^'"`\s)]{0,80})['"`]"#,
                ),
                path_group: 1,
                method_group: None,
            },
            // xhr.open("POST", "/api/...")
            JsPattern {
                name: "xhr_open",
                regex: compile(
                    "xhr_open",
                    r#"(?i)\.open\s*\(\s*['"]([A-Z]+)['"]\s*,\s*['"`](/[^'"`\s]{2,100})['"`]"#,
                ),
                path_group: 2,
                method_group: Some(1),
            },
        ]
    })
}
