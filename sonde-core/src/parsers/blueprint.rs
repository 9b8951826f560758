use regex::Regex;
use sonde_scanner::endpoint::{group_for_path, normalize_path};
use sonde_scanner::{DiscoveryResult, Endpoint, EndpointSet, Source};
use std::sync::OnceLock;

const DEFAULT_GROUP: &str = "api";

struct BlueprintPatterns {
    /// `# Notes [GET /notes]`
    resource: Regex,
    /// `### POST /notes`
    action: Regex,
    /// `# Group Notes`
    group: Regex,
    non_word: Regex,
}

fn patterns() -> &'static BlueprintPatterns {
    static PATTERNS: OnceLock<BlueprintPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| BlueprintPatterns {
        resource: Regex::new(r"(?m)^#{1,2}\s+(?:.*?\s+)?\[([A-Z]+)\s+(/[^\]]+)\]")
            .expect("blueprint resource regex is valid"),
        action: Regex::new(r"(?m)^###\s+([A-Z]+)\s+(/[^\s\[{]+)")
            .expect("blueprint action regex is valid"),
        group: Regex::new(r"(?m)^#\s+(?:Group\s+)?(.+?)(?:\s+\[|$)")
            .expect("blueprint group regex is valid"),
        non_word: Regex::new(r"[^a-zA-Z0-9 ]").expect("blueprint group-name regex is valid"),
    })
}

/// Resource and action headings from API Blueprint markdown.
///
/// Resource headings are collected before action headings; a path whose
/// segments are all templated takes the nearest preceding `# Group` name.
pub fn parse_api_blueprint(text: &str) -> DiscoveryResult {
    let text = text.replace("\r\n", "\n");
    let patterns = patterns();

    let groups: Vec<(usize, String)> = patterns
        .group
        .captures_iter(&text)
        .filter_map(|caps| {
            let start = caps.get(0)?.start();
            Some((start, group_name(&patterns.non_word, &caps[1])))
        })
        .collect();
    let group_at = |pos: usize| {
        groups
            .iter()
            .take_while(|(start, _)| *start <= pos)
            .last()
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| DEFAULT_GROUP.to_string())
    };

    let mut endpoints = EndpointSet::new();
    for regex in [&patterns.resource, &patterns.action] {
        for caps in regex.captures_iter(&text) {
            let (Some(whole), Some(method), Some(path)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let path = normalize_path(path.as_str().trim());
            let group = match group_for_path(&path, "") {
                g if g.is_empty() => group_at(whole.start()),
                g => g,
            };
            endpoints.insert(Endpoint::rest(method.as_str(), &path).with_group(group));
        }
    }

    DiscoveryResult::new(Source::ApiBlueprint, endpoints.into_vec())
}

fn group_name(non_word: &Regex, heading: &str) -> String {
    let cleaned = non_word
        .replace_all(heading, "")
        .trim()
        .to_lowercase()
        .replace(' ', "_");
    if cleaned.is_empty() {
        DEFAULT_GROUP.to_string()
    } else {
        cleaned
    }
}
