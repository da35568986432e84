//! Path selection rules for flattening.
//!
//! All matching is literal: prefixes and suffixes are compared as plain
//! strings against the repo-relative, `/`-separated path. A prefix `src`
//! therefore also matches `srcx/main.go`.

/// Immutable selection rule shared by every predicate evaluation in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionRule {
    /// When non-empty, only paths starting with this prefix are selected and
    /// `exclude_prefixes` is ignored.
    pub include_prefix: Option<String>,
    /// Paths starting with any non-empty entry are rejected.
    pub exclude_prefixes: Vec<String>,
    /// Literal suffix allow-list (e.g. `.go`). Empty accepts everything.
    pub allowed_extensions: Vec<String>,
}

impl SelectionRule {
    pub fn new(
        include_prefix: Option<String>,
        exclude_prefixes: Vec<String>,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            include_prefix,
            exclude_prefixes,
            allowed_extensions,
        }
    }

    /// The include prefix, if one is active for this run.
    pub fn active_include(&self) -> Option<&str> {
        self.include_prefix
            .as_deref()
            .filter(|prefix| !prefix.is_empty())
    }

    fn accepts_all_extensions(&self) -> bool {
        self.allowed_extensions.iter().all(|ext| ext.is_empty())
    }
}

/// True when `path` is rejected by the include/exclude prefix rules.
pub fn is_excluded_by_path(path: &str, rule: &SelectionRule) -> bool {
    if let Some(include) = rule.active_include() {
        return !path.starts_with(include);
    }
    rule.exclude_prefixes
        .iter()
        .any(|prefix| !prefix.is_empty() && path.starts_with(prefix.as_str()))
}

/// True when `path` ends with one of the allowed extensions.
///
/// An empty list, or one holding only empty strings, accepts every path.
/// Comparison is case-sensitive.
pub fn has_accepted_extension(path: &str, rule: &SelectionRule) -> bool {
    if rule.accepts_all_extensions() {
        return true;
    }
    rule.allowed_extensions
        .iter()
        .any(|ext| !ext.is_empty() && path.ends_with(ext.as_str()))
}

pub fn is_selected(path: &str, rule: &SelectionRule) -> bool {
    !is_excluded_by_path(path, rule) && has_accepted_extension(path, rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn selected<'a>(paths: &[&'a str], rule: &SelectionRule) -> Vec<&'a str> {
        paths
            .iter()
            .copied()
            .filter(|path| is_selected(path, rule))
            .collect()
    }

    #[test]
    fn exclude_prefix_and_extension_select_only_go_outside_vendor() {
        let rule = SelectionRule::new(None, strings(&["vendor/"]), strings(&[".go"]));
        let paths = ["main.go", "vendor/lib.go", "README.md"];
        assert_eq!(selected(&paths, &rule), vec!["main.go"]);
    }

    #[test]
    fn include_prefix_with_no_extensions_selects_whole_subtree() {
        let rule = SelectionRule::new(Some("src/".to_string()), Vec::new(), Vec::new());
        let paths = ["src/a.ts", "src/b.md", "lib/c.ts"];
        assert_eq!(selected(&paths, &rule), vec!["src/a.ts", "src/b.md"]);
    }

    #[test]
    fn extension_match_is_case_sensitive() {
        let rule = SelectionRule::new(None, Vec::new(), strings(&[".go", ".md"]));
        assert!(!is_selected("notes.MD", &rule));
        assert!(is_selected("notes.md", &rule));
    }

    #[test]
    fn include_prefix_overrides_exclude_list() {
        let rule = SelectionRule::new(
            Some("vendor/".to_string()),
            strings(&["vendor/"]),
            Vec::new(),
        );
        assert!(is_selected("vendor/lib.go", &rule));
        assert!(!is_selected("main.go", &rule));
    }

    #[test]
    fn empty_include_prefix_falls_back_to_excludes() {
        let rule = SelectionRule::new(Some(String::new()), strings(&["docs"]), Vec::new());
        assert!(is_excluded_by_path("docs/index.md", &rule));
        assert!(!is_excluded_by_path("src/lib.rs", &rule));
    }

    #[test]
    fn prefix_match_is_not_segment_aware() {
        let rule = SelectionRule::new(None, strings(&["src"]), Vec::new());
        assert!(is_excluded_by_path("srcx/file.rs", &rule));

        let rule = SelectionRule::new(Some("src".to_string()), Vec::new(), Vec::new());
        assert!(!is_excluded_by_path("srcx/file.rs", &rule));
    }

    #[test]
    fn empty_exclude_entries_never_match() {
        let rule = SelectionRule::new(None, strings(&["", ""]), Vec::new());
        assert!(!is_excluded_by_path("anything", &rule));
    }

    #[test]
    fn blank_extension_list_accepts_everything() {
        let rule = SelectionRule::new(None, Vec::new(), strings(&[""]));
        assert!(has_accepted_extension("Makefile", &rule));
        assert!(has_accepted_extension("", &rule));
    }

    #[test]
    fn empty_entries_are_skipped_among_real_extensions() {
        let rule = SelectionRule::new(None, Vec::new(), strings(&["", ".rs"]));
        assert!(has_accepted_extension("lib.rs", &rule));
        assert!(!has_accepted_extension("Makefile", &rule));
    }

    #[test]
    fn extension_is_a_plain_suffix() {
        let rule = SelectionRule::new(None, Vec::new(), strings(&["go"]));
        assert!(has_accepted_extension("cargo", &rule));
    }
}
