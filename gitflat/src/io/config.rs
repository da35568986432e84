//! Run configuration: optional TOML file merged with command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::core::selection::SelectionRule;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = ".gitflat.toml";

/// Default name of the single-file artifact.
pub const DEFAULT_OUTPUT_NAME: &str = "flattened_repo.txt";

/// Configuration as read from TOML. Every field is optional in the file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    /// Remote (or local) repository to clone.
    pub repo: Option<String>,

    /// Output directory.
    pub dest: Option<PathBuf>,

    /// Only paths starting with this prefix are kept. Overrides `exclude`.
    pub include: Option<String>,

    /// Paths starting with any of these prefixes are dropped.
    pub exclude: Vec<String>,

    /// Literal suffixes to keep (e.g. `[".go", ".md"]`). Empty keeps all.
    pub extensions: Vec<String>,

    /// Concatenate into one file instead of flattening into a directory.
    pub single_file: bool,

    /// Name of the single-file artifact inside `dest`.
    pub output_name: String,

    /// Remove subdirectories of `dest` after the run.
    pub prune_dirs: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            repo: None,
            dest: None,
            include: None,
            exclude: Vec::new(),
            extensions: Vec::new(),
            single_file: false,
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            prune_dirs: false,
        }
    }
}

/// Values given on the command line. `None`/`false` leave the file value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub repo: Option<String>,
    pub dest: Option<PathBuf>,
    pub include: Option<String>,
    pub exclude: Option<Vec<String>>,
    pub extensions: Option<Vec<String>>,
    pub single_file: bool,
    pub output_name: Option<String>,
    pub prune_dirs: bool,
}

/// Fully resolved, immutable configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenConfig {
    pub repo: String,
    pub dest: PathBuf,
    pub include: Option<String>,
    pub exclude: Vec<String>,
    pub extensions: Vec<String>,
    pub single_file: bool,
    pub output_name: String,
    pub prune_dirs: bool,
}

impl FlattenConfig {
    pub fn validate(&self) -> Result<()> {
        if self.repo.trim().is_empty() {
            return Err(anyhow!("repo must not be empty"));
        }
        if self.dest.as_os_str().is_empty() {
            return Err(anyhow!("dest must not be empty"));
        }
        let name = self.output_name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(anyhow!("output_name must be a plain file name, got '{name}'"));
        }
        Ok(())
    }

    /// Selection rule derived from the path and extension filters.
    pub fn rule(&self) -> SelectionRule {
        SelectionRule::new(
            self.include.clone(),
            self.exclude.clone(),
            self.extensions.clone(),
        )
    }

    /// Where single-file output is written.
    pub fn output_path(&self) -> PathBuf {
        self.dest.join(&self.output_name)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `FileConfig::default()`.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Apply command-line overrides to file values and validate the result.
pub fn resolve(mut base: FileConfig, overrides: Overrides) -> Result<FlattenConfig> {
    if let Some(repo) = overrides.repo {
        base.repo = Some(repo);
    }
    if let Some(dest) = overrides.dest {
        base.dest = Some(dest);
    }
    if let Some(include) = overrides.include {
        base.include = Some(include);
    }
    if let Some(exclude) = overrides.exclude {
        base.exclude = exclude;
    }
    if let Some(extensions) = overrides.extensions {
        base.extensions = extensions;
    }
    if let Some(output_name) = overrides.output_name {
        base.output_name = output_name;
    }
    let cfg = FlattenConfig {
        repo: base.repo.ok_or_else(|| anyhow!("missing repo (use --repo)"))?,
        dest: base.dest.ok_or_else(|| anyhow!("missing dest (use --dest)"))?,
        include: base.include,
        exclude: base.exclude,
        extensions: base.extensions,
        single_file: base.single_file || overrides.single_file,
        output_name: base.output_name,
        prune_dirs: base.prune_dirs || overrides.prune_dirs,
    };
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> Overrides {
        Overrides {
            repo: Some("https://example.invalid/repo.git".to_string()),
            dest: Some(PathBuf::from("out")),
            ..Overrides::default()
        }
    }

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, FileConfig::default());
    }

    #[test]
    fn load_parses_partial_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("gitflat.toml");
        fs::write(
            &path,
            "exclude = [\"vendor/\"]\nextensions = [\".go\"]\nsingle_file = true\n",
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.exclude, vec!["vendor/"]);
        assert_eq!(cfg.extensions, vec![".go"]);
        assert!(cfg.single_file);
        assert_eq!(cfg.output_name, DEFAULT_OUTPUT_NAME);
    }

    #[test]
    fn load_rejects_unknown_types() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("gitflat.toml");
        fs::write(&path, "single_file = \"yes\"\n").expect("write");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn overrides_replace_file_values() {
        let base = FileConfig {
            repo: Some("file-repo".to_string()),
            exclude: vec!["docs/".to_string()],
            extensions: vec![".md".to_string()],
            ..FileConfig::default()
        };
        let overrides = Overrides {
            extensions: Some(vec![".go".to_string()]),
            single_file: true,
            ..required()
        };
        let cfg = resolve(base, overrides).expect("resolve");
        assert_eq!(cfg.repo, "https://example.invalid/repo.git");
        assert_eq!(cfg.exclude, vec!["docs/"]);
        assert_eq!(cfg.extensions, vec![".go"]);
        assert!(cfg.single_file);
        assert_eq!(cfg.output_path(), PathBuf::from("out").join(DEFAULT_OUTPUT_NAME));
    }

    #[test]
    fn resolve_requires_repo_and_dest() {
        let err = resolve(FileConfig::default(), Overrides::default()).expect_err("missing");
        assert!(err.to_string().contains("repo"));

        let overrides = Overrides {
            repo: Some("r".to_string()),
            ..Overrides::default()
        };
        let err = resolve(FileConfig::default(), overrides).expect_err("missing");
        assert!(err.to_string().contains("dest"));
    }

    #[test]
    fn rejects_output_name_with_separator() {
        let overrides = Overrides {
            output_name: Some("../escape.txt".to_string()),
            ..required()
        };
        assert!(resolve(FileConfig::default(), overrides).is_err());
    }

    #[test]
    fn rule_carries_filters() {
        let overrides = Overrides {
            include: Some("src/".to_string()),
            exclude: Some(vec!["vendor/".to_string()]),
            ..required()
        };
        let rule = resolve(FileConfig::default(), overrides)
            .expect("resolve")
            .rule();
        assert_eq!(rule.active_include(), Some("src/"));
        assert_eq!(rule.exclude_prefixes, vec!["vendor/"]);
    }
}
