//! Human-readable grouping of recorded calls.

use std::collections::HashMap;
use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ResponseEntry;

static ID_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("static pattern"));

/// Strip the API host prefix and collapse numeric path segments for
/// readable grouping. Cosmetic only; never used for match semantics.
///
/// A trailing `/123` with no informative parent becomes `/:id`; below a
/// named segment the placeholder is derived from it, e.g. `/user/123`
/// becomes `/user/:userId`.
pub fn simplify_url(url: &str, api_host: &str) -> String {
    let path = match url.find(api_host) {
        Some(index) => &url[index + api_host.len()..],
        None => url,
    };
    let path = path.split(&['?', '#'][..]).next().unwrap_or(path);

    let segments: Vec<&str> = path.split('/').collect();
    let mut simplified: Vec<String> = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        if ID_SEGMENT.is_match(segment) {
            let parent = if index > 0 { segments[index - 1] } else { "" };
            simplified.push(placeholder_for(parent));
        } else {
            simplified.push((*segment).to_string());
        }
    }
    simplified.join("/")
}

fn placeholder_for(parent: &str) -> String {
    let stem = parent.trim_end_matches('s');
    if stem.is_empty() {
        ":id".to_string()
    } else {
        format!(":{stem}Id")
    }
}

/// Grouped `method + simplified-url -> status` counts in first-seen
/// order, with a marker separating error responses (`!`), repeated calls
/// (`*`), and single successes.
pub fn render(title: Option<&str>, api_host: &str, entries: &[ResponseEntry]) -> String {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, (u16, usize)> = HashMap::new();

    for entry in entries {
        let key = format!(
            "{} {} -> {}",
            entry.method,
            simplify_url(&entry.url, api_host),
            entry.status
        );
        match groups.get_mut(&key) {
            Some((_, count)) => *count += 1,
            None => {
                groups.insert(key.clone(), (entry.status, 1));
                order.push(key);
            }
        }
    }

    let mut out = String::new();
    out.push_str(title.unwrap_or("api call summary"));
    if entries.is_empty() {
        out.push_str("\n  (no calls recorded)");
        return out;
    }
    for key in order {
        let (status, count) = groups[&key];
        let marker = if status >= 400 {
            '!'
        } else if count > 1 {
            '*'
        } else {
            ' '
        };
        let _ = write!(out, "\n  {marker} {key} (x{count})");
    }
    out
}
