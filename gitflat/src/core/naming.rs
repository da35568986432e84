//! Helpers for rendering flattened names and concatenation headers.

/// Final `/`-separated segment of a repo-relative path.
///
/// This is the flattening step: directory components are dropped.
pub fn flat_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Header line written before each file in single-file output.
pub fn block_header(path: &str) -> String {
    format!("--- {path} ---\n")
}

/// Split a user-supplied list on commas and whitespace, dropping empty items.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
