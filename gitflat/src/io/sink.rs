//! Output strategies for selected files.
//!
//! Sinks receive `(path, content)` pairs in traversal order and know nothing
//! about selection rules.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::naming::{block_header, flat_name};

/// Destination for selected file contents.
pub trait Sink {
    fn emit(&mut self, path: &str, content: &[u8]) -> Result<()>;
}

/// Writes each file to `<root>/<basename>`, overwriting on collision.
#[derive(Debug)]
pub struct DirectoryWriter {
    root: PathBuf,
    written: HashSet<String>,
    collisions: usize,
}

impl DirectoryWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: HashSet::new(),
            collisions: 0,
        }
    }

    /// Number of emits that overwrote a file written earlier in this run.
    pub fn collisions(&self) -> usize {
        self.collisions
    }
}

impl Sink for DirectoryWriter {
    fn emit(&mut self, path: &str, content: &[u8]) -> Result<()> {
        let name = flat_name(path);
        let target = self.root.join(name);
        fs::write(&target, content).with_context(|| format!("write {}", target.display()))?;
        if !self.written.insert(name.to_string()) {
            self.collisions += 1;
            warn!(path, name, "flattened name collision, last write wins");
        }
        debug!(path, target = %target.display(), bytes = content.len(), "wrote file");
        Ok(())
    }
}

/// Appends `--- <path> ---` framed blocks to a borrowed stream.
///
/// The stream is never closed here; its owner controls the lifecycle.
pub struct Concatenator<'w, W: Write> {
    writer: &'w mut W,
}

impl<'w, W: Write> Concatenator<'w, W> {
    pub fn new(writer: &'w mut W) -> Self {
        Self { writer }
    }
}

impl<W: Write> Sink for Concatenator<'_, W> {
    fn emit(&mut self, path: &str, content: &[u8]) -> Result<()> {
        write_block(&mut *self.writer, path, content)
            .with_context(|| format!("append block for {path}"))?;
        debug!(path, bytes = content.len(), "appended block");
        Ok(())
    }
}

fn write_block<W: Write>(writer: &mut W, path: &str, content: &[u8]) -> std::io::Result<()> {
    writer.write_all(block_header(path).as_bytes())?;
    writer.write_all(content)?;
    writer.write_all(b"\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenator_frames_blocks_in_emit_order() {
        let mut out = Vec::new();
        let mut sink = Concatenator::new(&mut out);
        sink.emit("a.go", b"X").expect("emit");
        sink.emit("b.go", b"Y").expect("emit");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "--- a.go ---\nX\n\n--- b.go ---\nY\n\n"
        );
    }

    #[test]
    fn concatenator_leaves_stream_usable() {
        let mut out = Vec::new();
        {
            let mut sink = Concatenator::new(&mut out);
            sink.emit("a.txt", b"").expect("emit");
        }
        out.extend_from_slice(b"tail");
        assert_eq!(out, b"--- a.txt ---\n\n\ntail");
    }

    #[test]
    fn concatenator_reports_write_failure() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut broken = Broken;
        let err = Concatenator::new(&mut broken)
            .emit("a.go", b"X")
            .expect_err("should fail");
        assert!(format!("{err:#}").contains("disk full"));
    }

    #[test]
    fn directory_writer_flattens_and_last_write_wins() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut sink = DirectoryWriter::new(temp.path());
        sink.emit("a/x.txt", b"first").expect("emit");
        sink.emit("b/x.txt", b"second").expect("emit");
        sink.emit("c/deep/y.txt", b"y").expect("emit");

        let mut names: Vec<String> = fs::read_dir(temp.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["x.txt", "y.txt"]);
        assert_eq!(
            fs::read(temp.path().join("x.txt")).expect("read"),
            b"second"
        );
        assert_eq!(sink.collisions(), 1);
    }

    #[test]
    fn directory_writer_fails_when_root_missing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut sink = DirectoryWriter::new(temp.path().join("missing"));
        assert!(sink.emit("a.txt", b"a").is_err());
    }
}
