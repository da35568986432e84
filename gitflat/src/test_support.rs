//! Test-only helpers: canned snapshots, recording sinks and scratch git repos.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use tempfile::TempDir;

use crate::core::selection::SelectionRule;
use crate::io::config::{DEFAULT_OUTPUT_NAME, FlattenConfig};
use crate::io::sink::Sink;
use crate::io::snapshot::{FileEntry, Files, Snapshot};

#[derive(Debug, Clone)]
enum Item {
    File(String, Vec<u8>),
    Unreadable(String, String),
    Broken(String),
}

/// In-memory snapshot yielding its items in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    items: Vec<Item>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a readable file.
    pub fn file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.items
            .push(Item::File(path.to_string(), content.into()));
        self
    }

    /// Add a file whose content accessor fails with `message`.
    pub fn unreadable(mut self, path: &str, message: &str) -> Self {
        self.items
            .push(Item::Unreadable(path.to_string(), message.to_string()));
        self
    }

    /// Add an enumeration failure at this position.
    pub fn broken(mut self, message: &str) -> Self {
        self.items.push(Item::Broken(message.to_string()));
        self
    }
}

impl Snapshot for MemorySnapshot {
    fn files(&self) -> Result<Files<'_>> {
        Ok(Box::new(self.items.iter().map(|item| match item {
            Item::File(path, content) => Ok(FileEntry::new(path.clone(), move || {
                Ok(content.clone())
            })),
            Item::Unreadable(path, message) => Ok(FileEntry::new(path.clone(), move || {
                Err(anyhow!("{message}"))
            })),
            Item::Broken(message) => Err(anyhow!("{message}")),
        })))
    }
}

/// Sink that records emitted files, optionally failing on one path.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub emitted: Vec<(String, Vec<u8>)>,
    fail_on: Option<String>,
}

impl RecordingSink {
    pub fn failing_on(path: &str) -> Self {
        Self {
            emitted: Vec::new(),
            fail_on: Some(path.to_string()),
        }
    }

    pub fn paths(&self) -> Vec<&str> {
        self.emitted.iter().map(|(path, _)| path.as_str()).collect()
    }
}

impl Sink for RecordingSink {
    fn emit(&mut self, path: &str, content: &[u8]) -> Result<()> {
        if self.fail_on.as_deref() == Some(path) {
            bail!("refusing to write {path}");
        }
        self.emitted.push((path.to_string(), content.to_vec()));
        Ok(())
    }
}

/// Build a selection rule from string slices.
pub fn rule(include: Option<&str>, exclude: &[&str], extensions: &[&str]) -> SelectionRule {
    SelectionRule::new(
        include.map(str::to_string),
        exclude.iter().map(|s| s.to_string()).collect(),
        extensions.iter().map(|s| s.to_string()).collect(),
    )
}

/// Directory-mode config with no filters, writing into `dest`.
pub fn config_for(dest: impl Into<PathBuf>) -> FlattenConfig {
    FlattenConfig {
        repo: "memory".to_string(),
        dest: dest.into(),
        include: None,
        exclude: Vec::new(),
        extensions: Vec::new(),
        single_file: false,
        output_name: DEFAULT_OUTPUT_NAME.to_string(),
        prune_dirs: false,
    }
}

/// Scratch git repository used as a clone source.
#[derive(Debug)]
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp repo")?;
        let repo = Self { dir };
        repo.git(&["init", "--quiet"])?;
        repo.git(&["config", "user.name", "Gitflat Test"])?;
        repo.git(&["config", "user.email", "gitflat-test@local.invalid"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `file://` URL so clones honour `--depth`.
    pub fn url(&self) -> String {
        format!("file://{}", self.path().display())
    }

    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        self.write_bytes(rel, contents.as_bytes())
    }

    pub fn write_bytes(&self, rel: &str, contents: &[u8]) -> Result<()> {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Create a file whose name is raw bytes (may be invalid UTF-8).
    #[cfg(unix)]
    pub fn write_raw_name(&self, name: &[u8], contents: &str) -> Result<()> {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = self.path().join(OsStr::from_bytes(name));
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Create a symlink `rel` pointing at `target`.
    #[cfg(unix)]
    pub fn symlink(&self, target: &str, rel: &str) -> Result<()> {
        let link = self.path().join(rel);
        std::os::unix::fs::symlink(target, &link)
            .with_context(|| format!("symlink {}", link.display()))
    }

    /// Stage a submodule entry (gitlink) at `rel` pointing at commit `oid`.
    ///
    /// Commit it with [`TestRepo::commit_index`]; `add -A` would drop it again.
    pub fn add_gitlink(&self, rel: &str, oid: &str) -> Result<()> {
        let cacheinfo = format!("160000,{oid},{rel}");
        self.git(&["update-index", "--add", "--cacheinfo", &cacheinfo])
    }

    /// Commit what is already staged.
    pub fn commit_index(&self, message: &str) -> Result<()> {
        self.git(&["commit", "--quiet", "-m", message])
    }

    /// Stage everything and commit.
    pub fn commit(&self, message: &str) -> Result<()> {
        self.git(&["add", "-A"])?;
        self.git(&["commit", "--quiet", "-m", message])?;
        Ok(())
    }

    fn git(&self, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git {} failed: {}", args.join(" "), stderr.trim());
        }
        Ok(())
    }
}
