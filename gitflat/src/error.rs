use std::fmt;

use thiserror::Error;

/// Pipeline stage a run failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Acquisition,
    Traversal,
    Read,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Acquisition => "acquisition",
            Stage::Traversal => "traversal",
            Stage::Read => "read",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// First failure of a run, tagged with the stage that produced it.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("acquisition failed: {repo}")]
    Acquisition {
        repo: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("traversal failed")]
    Traversal(#[source] anyhow::Error),

    #[error("read failed: {path}")]
    Read {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("write failed: {path}")]
    Write {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl RunError {
    pub fn stage(&self) -> Stage {
        match self {
            RunError::Acquisition { .. } => Stage::Acquisition,
            RunError::Traversal(_) => Stage::Traversal,
            RunError::Read { .. } => Stage::Read,
            RunError::Write { .. } => Stage::Write,
        }
    }

    pub(crate) fn write(path: impl Into<String>, source: anyhow::Error) -> Self {
        RunError::Write {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn display_includes_cause_chain() {
        let err = RunError::Read {
            path: "src/a.go".to_string(),
            source: anyhow!("bad object"),
        };
        assert_eq!(err.stage(), Stage::Read);
        let rendered = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(rendered, "read failed: src/a.go: bad object");
    }

    #[test]
    fn stage_names_are_lowercase() {
        assert_eq!(Stage::Acquisition.to_string(), "acquisition");
        assert_eq!(Stage::Write.to_string(), "write");
    }
}
