//! `Link` header handling

use reqwest::header::{HeaderMap, LINK};
use url::Url;

/// Next page URL announced by a response, if any
///
/// Returns `None` when there is no `rel="next"` entry or when that entry
/// carries `results="false"`. Relative targets are resolved against
/// `current`.
pub fn parse_next_link(headers: &HeaderMap, current: &Url) -> Option<Url> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(split_entries)
        .filter_map(parse_entry)
        .find(|entry| entry.rel.as_deref() == Some("next"))
        .filter(|entry| entry.results.as_deref() != Some("false"))
        .and_then(|entry| current.join(&entry.target).ok())
}

#[derive(Debug, Default)]
struct LinkEntry {
    target: String,
    rel: Option<String>,
    results: Option<String>,
}

/// Split a header value on commas that sit outside `<...>` and quotes
fn split_entries(value: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut in_target = false;
    let mut in_quotes = false;
    let mut start = 0;

    for (idx, ch) in value.char_indices() {
        match ch {
            '<' if !in_quotes => in_target = true,
            '>' if !in_quotes => in_target = false,
            '"' if !in_target => in_quotes = !in_quotes,
            ',' if !in_target && !in_quotes => {
                entries.push(&value[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    entries.push(&value[start..]);
    entries
}

fn parse_entry(raw: &str) -> Option<LinkEntry> {
    let raw = raw.trim();
    let open = raw.find('<')?;
    let close = raw[open..].find('>')? + open;

    let mut entry = LinkEntry {
        target: raw[open + 1..close].trim().to_string(),
        ..Default::default()
    };

    for param in raw[close + 1..].split(';') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "rel" => entry.rel = Some(value),
            "results" => entry.results = Some(value),
            _ => {}
        }
    }

    Some(entry)
}
