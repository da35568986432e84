//! Post-run pruning of the destination directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Remove every subdirectory of `root`, keeping top-level files.
///
/// Returns how many directories were removed. Idempotent.
pub fn prune_subdirectories(root: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let entry = entry.context("read entry")?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("stat {}", entry.path().display()))?;
        if !file_type.is_dir() {
            continue;
        }
        fs::remove_dir_all(entry.path())
            .with_context(|| format!("remove {}", entry.path().display()))?;
        debug!(dir = %entry.path().display(), "pruned directory");
        removed += 1;
    }
    Ok(removed)
}
