//! Snapshot traversal.
//!
//! A snapshot is a fixed view of a repository's tracked files. Traversal
//! exposes it as a lazy, finite sequence of [`FileEntry`] values in a
//! deterministic order. Every file is yielded; selection is the caller's job.

use std::cell::RefCell;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;
use tracing::{debug, info, instrument};

use super::git::{BlobReader, Git, parse_tree_record};

/// Lazy content accessor for a single file.
pub type ContentReader<'a> = Box<dyn Fn() -> Result<Vec<u8>> + 'a>;

/// Lazy sequence of file entries produced by [`Snapshot::files`].
pub type Files<'a> = Box<dyn Iterator<Item = Result<FileEntry<'a>>> + 'a>;

/// One file of a snapshot: its repo-relative path and a way to read it.
pub struct FileEntry<'a> {
    path: String,
    reader: ContentReader<'a>,
}

impl<'a> FileEntry<'a> {
    pub fn new(path: impl Into<String>, reader: impl Fn() -> Result<Vec<u8>> + 'a) -> Self {
        Self {
            path: path.into(),
            reader: Box::new(reader),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Materialise the full file content.
    pub fn read(&self) -> Result<Vec<u8>> {
        (self.reader)()
    }
}

impl fmt::Debug for FileEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEntry")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// A traversable tree of `(path, content)` pairs.
pub trait Snapshot {
    /// Enumerate every file entry, recursively, in a stable order.
    ///
    /// An `Err` item aborts traversal; callers must stop at the first one.
    fn files(&self) -> Result<Files<'_>>;
}

/// Snapshot of the default branch tip of a cloned repository.
///
/// The clone lives in a scratch directory that is removed when the snapshot
/// is dropped. Blob reads share one `git cat-file --batch` child, started on
/// the first read.
#[derive(Debug)]
pub struct GitSnapshot {
    git: Git,
    head: String,
    // Declared before `_scratch`: the reader must exit before its repo is removed.
    blobs: RefCell<Option<BlobReader>>,
    _scratch: TempDir,
}

impl GitSnapshot {
    /// Clone `url` and resolve its HEAD commit.
    #[instrument(skip_all, fields(url))]
    pub fn acquire(url: &str) -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("gitflat-")
            .tempdir()
            .context("create scratch directory")?;
        let git = Git::clone_shallow(url, &scratch.path().join("repo"))?;
        let head = git.head_short_sha(12).context("resolve HEAD")?;
        info!(url, head = %head, "snapshot acquired");
        Ok(Self {
            git,
            head,
            blobs: RefCell::new(None),
            _scratch: scratch,
        })
    }

    /// Short SHA of the commit this snapshot reflects.
    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn workdir(&self) -> &Path {
        self.git.workdir()
    }

    fn read_blob(&self, oid: &str) -> Result<Vec<u8>> {
        let mut slot = self
            .blobs
            .try_borrow_mut()
            .map_err(|_| anyhow!("blob reader already in use"))?;
        if slot.is_none() {
            *slot = Some(self.git.blob_reader()?);
        }
        let reader = slot
            .as_mut()
            .ok_or_else(|| anyhow!("blob reader unavailable"))?;
        reader.read(oid)
    }
}

impl Snapshot for GitSnapshot {
    fn files(&self) -> Result<Files<'_>> {
        let listing = self.git.ls_tree("HEAD").context("list HEAD tree")?;
        Ok(Box::new(TreeFiles {
            snapshot: self,
            listing,
            pos: 0,
        }))
    }
}

/// Iterator over the blob records of a NUL-separated `ls-tree` listing.
struct TreeFiles<'a> {
    snapshot: &'a GitSnapshot,
    listing: Vec<u8>,
    pos: usize,
}

impl<'a> Iterator for TreeFiles<'a> {
    type Item = Result<FileEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.listing.len() {
            let rest = &self.listing[self.pos..];
            let end = rest.iter().position(|b| *b == 0).unwrap_or(rest.len());
            let raw = &rest[..end];
            self.pos += end + 1;
            if raw.is_empty() {
                continue;
            }
            let record = match parse_tree_record(raw) {
                Ok(record) => record,
                Err(err) => {
                    self.pos = self.listing.len();
                    return Some(Err(err));
                }
            };
            if !record.is_file() {
                debug!(path = %record.path, kind = %record.kind, "skipping non-file entry");
                continue;
            }
            let snapshot = self.snapshot;
            let oid = record.oid;
            return Some(Ok(FileEntry::new(record.path, move || {
                snapshot
                    .read_blob(&oid)
                    .with_context(|| format!("read blob {oid}"))
            })));
        }
        None
    }
}
