//! Git adapter for snapshot acquisition.
//!
//! Everything the flattener needs from a repository (clone, HEAD, tree
//! listing, blob bytes) goes through a small wrapper around `git` subprocess
//! calls.

use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Output, Stdio};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};

/// One record of `git ls-tree -r -z` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRecord {
    /// Octal file mode (e.g. `100644`, `120000`, `160000`).
    pub mode: String,
    /// Object kind: `blob`, `tree` or `commit` (gitlink).
    pub kind: String,
    /// Object id of the entry.
    pub oid: String,
    /// Repo-relative, `/`-separated path.
    pub path: String,
}

impl TreeRecord {
    /// True for entries that carry file content (regular, executable, symlink).
    pub fn is_file(&self) -> bool {
        self.kind == "blob"
    }
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Shallow-clone the default branch of `url` into `target`.
    ///
    /// The clone has no checkout: content is read straight from the object
    /// database, so the worktree is never materialised.
    #[instrument(skip_all, fields(url))]
    pub fn clone_shallow(url: &str, target: &Path) -> Result<Self> {
        debug!(url, target = %target.display(), "cloning repository");
        let args = [
            OsStr::new("clone"),
            OsStr::new("--quiet"),
            OsStr::new("--depth"),
            OsStr::new("1"),
            OsStr::new("--no-checkout"),
            OsStr::new("--"),
            OsStr::new(url),
            target.as_os_str(),
        ];
        let output = Command::new("git")
            .args(args)
            .output()
            .with_context(|| format!("spawn git clone {url}"))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git clone {url} failed: {}", stderr.trim()));
        }
        Ok(Self::new(target))
    }

    /// Return the HEAD short SHA (stable given repo state).
    pub fn head_short_sha(&self, len: usize) -> Result<String> {
        let arg = format!("--short={len}");
        let out = self.run_capture(&["rev-parse", &arg, "HEAD"])?;
        Ok(String::from_utf8_lossy(&out).trim().to_string())
    }

    /// Raw NUL-separated recursive listing of the tree at `rev`.
    #[instrument(skip_all, fields(rev))]
    pub fn ls_tree(&self, rev: &str) -> Result<Vec<u8>> {
        let out = self.run_capture(&["ls-tree", "-r", "-z", "--full-tree", rev])?;
        debug!(bytes = out.len(), "listed tree");
        Ok(out)
    }

    /// Start a batch reader for blob contents of this repository.
    pub fn blob_reader(&self) -> Result<BlobReader> {
        let mut child = Command::new("git")
            .args(["cat-file", "--batch"])
            .current_dir(&self.workdir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .context("spawn git cat-file --batch")?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("stdin was not piped"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("stdout was not piped"))?;
        debug!("started git cat-file --batch");
        Ok(BlobReader {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
        })
    }

    fn run_capture(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = self.run_checked(args)?;
        Ok(output.stdout)
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}

/// Parse one NUL-terminated `ls-tree` record: `<mode> <type> <oid>\t<path>`.
///
/// Git stores paths as raw bytes; a path that is not UTF-8 is decoded lossily
/// so the entry is still enumerated. Only the header must be well formed.
pub fn parse_tree_record(record: &[u8]) -> Result<TreeRecord> {
    let tab = record.iter().position(|b| *b == b'\t').ok_or_else(|| {
        anyhow!(
            "unexpected ls-tree record: '{}'",
            String::from_utf8_lossy(record)
        )
    })?;
    let (meta, path) = (&record[..tab], &record[tab + 1..]);
    let meta = std::str::from_utf8(meta).map_err(|_| {
        anyhow!(
            "ls-tree header is not valid utf-8: '{}'",
            String::from_utf8_lossy(record)
        )
    })?;
    let mut fields = meta.split(' ');
    let (Some(mode), Some(kind), Some(oid), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(anyhow!(
            "unexpected ls-tree record: '{}'",
            String::from_utf8_lossy(record)
        ));
    };
    if path.is_empty() {
        return Err(anyhow!("ls-tree record has empty path: '{meta}'"));
    }
    Ok(TreeRecord {
        mode: mode.to_string(),
        kind: kind.to_string(),
        oid: oid.to_string(),
        path: String::from_utf8_lossy(path).into_owned(),
    })
}

/// Long-lived `git cat-file --batch` child serving blob reads.
///
/// One process serves every read of a run. The child is shut down when the
/// reader is dropped.
#[derive(Debug)]
pub struct BlobReader {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl BlobReader {
    /// Full content of the blob `oid`, byte-for-byte.
    pub fn read(&mut self, oid: &str) -> Result<Vec<u8>> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow!("cat-file stdin already closed"))?;
        writeln!(stdin, "{oid}").context("write cat-file request")?;
        stdin.flush().context("flush cat-file request")?;

        let mut header = String::new();
        let n = self
            .stdout
            .read_line(&mut header)
            .context("read cat-file header")?;
        if n == 0 {
            return Err(anyhow!("git cat-file exited before answering {oid}"));
        }
        let size = parse_batch_header(header.trim_end_matches('\n'))?;

        let mut content = vec![0u8; size];
        self.stdout
            .read_exact(&mut content)
            .with_context(|| format!("read {size} bytes of blob {oid}"))?;
        let mut terminator = [0u8; 1];
        self.stdout
            .read_exact(&mut terminator)
            .context("read cat-file terminator")?;
        if terminator[0] != b'\n' {
            return Err(anyhow!("unexpected cat-file terminator after {oid}"));
        }
        Ok(content)
    }
}

impl Drop for BlobReader {
    fn drop(&mut self) {
        // Closing stdin ends the batch loop.
        drop(self.stdin.take());
        if let Err(err) = self.child.wait() {
            warn!(err = %err, "failed to wait for git cat-file");
        }
    }
}

/// Parse a `--batch` response header `<oid> <type> <size>` into the size.
///
/// `<oid> missing` and non-blob objects are errors.
pub fn parse_batch_header(header: &str) -> Result<usize> {
    let fields: Vec<&str> = header.split(' ').collect();
    match fields.as_slice() {
        [oid, "missing"] => Err(anyhow!("object {oid} missing")),
        [oid, "ambiguous"] => Err(anyhow!("object {oid} ambiguous")),
        [_, "blob", size] => size
            .parse()
            .with_context(|| format!("bad blob size in cat-file header '{header}'")),
        [oid, kind, _] => Err(anyhow!("object {oid} is a {kind}, not a blob")),
        _ => Err(anyhow!("unexpected cat-file header: '{header}'")),
    }
}
