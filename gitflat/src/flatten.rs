//! Orchestration for a single flatten run.
//!
//! One traversal of the snapshot feeds the selection rule and then the
//! active sink. The first failure aborts the run; nothing is retried and
//! output written before the failure is left in place.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, instrument};

use crate::core::selection::{SelectionRule, is_selected};
use crate::error::RunError;
use crate::io::cleanup::prune_subdirectories;
use crate::io::config::FlattenConfig;
use crate::io::sink::{Concatenator, DirectoryWriter, Sink};
use crate::io::snapshot::{GitSnapshot, Snapshot};

/// Counters for one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// File entries seen in the snapshot.
    pub visited: usize,
    /// Entries that passed selection and were emitted.
    pub selected: usize,
}

/// Result of a successful `flatten_repo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenReport {
    pub stats: RunStats,
    /// Emits that overwrote an earlier file with the same basename.
    pub collisions: usize,
    /// Output directory, or the single-file artifact.
    pub output: PathBuf,
    /// Short SHA of the flattened commit, when known.
    pub head: Option<String>,
}

/// Filter every file of `snapshot` through `rule` and emit survivors to `sink`.
///
/// Survivors are emitted exactly once, in traversal order.
pub fn run<S, K>(snapshot: &S, rule: &SelectionRule, sink: &mut K) -> Result<RunStats, RunError>
where
    S: Snapshot + ?Sized,
    K: Sink + ?Sized,
{
    let mut stats = RunStats::default();
    let files = snapshot.files().map_err(RunError::Traversal)?;
    for entry in files {
        let entry = entry.map_err(RunError::Traversal)?;
        stats.visited += 1;
        let path = entry.path();
        if !is_selected(path, rule) {
            debug!(path, "skipped");
            continue;
        }
        let content = entry.read().map_err(|source| RunError::Read {
            path: path.to_string(),
            source,
        })?;
        sink.emit(path, &content)
            .map_err(|source| RunError::write(path, source))?;
        stats.selected += 1;
    }
    Ok(stats)
}

/// Clone `cfg.repo` and flatten its default branch into `cfg.dest`.
#[instrument(skip_all, fields(repo = %cfg.repo))]
pub fn flatten_repo(cfg: &FlattenConfig) -> Result<FlattenReport, RunError> {
    let snapshot = GitSnapshot::acquire(&cfg.repo).map_err(|source| RunError::Acquisition {
        repo: cfg.repo.clone(),
        source,
    })?;
    let mut report = flatten_snapshot(&snapshot, cfg)?;
    report.head = Some(snapshot.head().to_string());
    Ok(report)
}

/// Flatten an already acquired snapshot according to `cfg`.
pub fn flatten_snapshot<S>(snapshot: &S, cfg: &FlattenConfig) -> Result<FlattenReport, RunError>
where
    S: Snapshot + ?Sized,
{
    let rule = cfg.rule();
    fs::create_dir_all(&cfg.dest)
        .with_context(|| format!("create destination {}", cfg.dest.display()))
        .map_err(|source| RunError::write(cfg.dest.display().to_string(), source))?;

    let (stats, collisions, output) = if cfg.single_file {
        let output = cfg.output_path();
        let stats = write_single_file(snapshot, &rule, &output)?;
        (stats, 0, output)
    } else {
        let mut sink = DirectoryWriter::new(&cfg.dest);
        let stats = run(snapshot, &rule, &mut sink)?;
        (stats, sink.collisions(), cfg.dest.clone())
    };

    if cfg.prune_dirs {
        let removed = prune_subdirectories(&cfg.dest)
            .map_err(|source| RunError::write(cfg.dest.display().to_string(), source))?;
        debug!(removed, "pruned destination subdirectories");
    }

    info!(
        visited = stats.visited,
        selected = stats.selected,
        collisions,
        output = %output.display(),
        "flatten complete"
    );
    Ok(FlattenReport {
        stats,
        collisions,
        output,
        head: None,
    })
}

/// Concatenate survivors into `output`.
///
/// The file is opened once, flushed on success, and closed when this
/// function returns on every path.
fn write_single_file<S>(
    snapshot: &S,
    rule: &SelectionRule,
    output: &Path,
) -> Result<RunStats, RunError>
where
    S: Snapshot + ?Sized,
{
    let output_name = output.display().to_string();
    let file = File::create(output)
        .with_context(|| format!("create {output_name}"))
        .map_err(|source| RunError::write(&output_name, source))?;
    let mut writer = BufWriter::new(file);
    let stats = run(snapshot, rule, &mut Concatenator::new(&mut writer))?;
    writer
        .flush()
        .with_context(|| format!("flush {output_name}"))
        .map_err(|source| RunError::write(&output_name, source))?;
    Ok(stats)
}
