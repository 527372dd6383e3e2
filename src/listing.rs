//! Directory-listing parsing
//!
//! The portal publishes auto-generated HTML directory indexes. This module
//! extracts child folder and file names by pattern matching on anchor
//! `href` attributes — no DOM parsing. That makes the markup a fragile
//! external contract, so the matching strategy is isolated here and the
//! orchestration layers only see name lists.

use regex::Regex;
use std::sync::LazyLock;

/// Matches top-level date-coded folder anchors, e.g. `href="2024-07/"`.
///
/// The `href="` prefix anchors the token to the start of the attribute, so
/// nested paths like `href="sub/2024-07/"` are not matched.
#[allow(clippy::expect_used)]
static FOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="(\d{4}-\d{2})/""#).expect("folder pattern is valid"));

/// Matches archive file anchors, non-greedy up to the first `.zip`/`.txt`
/// suffix. The portal emits lowercase extensions only.
#[allow(clippy::expect_used)]
static FILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="(.*?\.(?:zip|txt))""#).expect("file pattern is valid"));

/// Extract the first capture group of every match of `pattern` over `html`,
/// preserving first-seen order and keeping duplicates.
///
/// Tolerant of malformed or partial HTML: this is plain text matching, so
/// unmatched syntax never fails and an input with no matches (including the
/// empty string) yields an empty vector.
pub fn extract_matches(html: &str, pattern: &Regex) -> Vec<String> {
    pattern
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Deduplicate by exact string equality, keeping first-seen order.
pub fn dedup_first_seen(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values.into_iter().filter(|v| seen.insert(v.clone())).collect()
}

/// Extract date-coded folder tokens (`yyyy-mm`) from a root listing.
pub fn extract_folders(html: &str) -> Vec<String> {
    extract_matches(html, &FOLDER_PATTERN)
}

/// Extract `.zip`/`.txt` file names from a folder listing, deduplicated.
pub fn extract_files(html: &str) -> Vec<String> {
    dedup_first_seen(extract_matches(html, &FILE_PATTERN))
}
