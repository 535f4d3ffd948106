use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::FieldIssue;

/// Failure to turn one source file (or skill directory) into a record.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid frontmatter in {}: {reason}", path.display())]
    InvalidFrontmatter { path: PathBuf, reason: String },

    #[error("validation failed for {}: {}", path.display(), join_issues(issues))]
    Validation {
        path: PathBuf,
        issues: Vec<FieldIssue>,
    },
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ParseError {
    /// The file the error is attributable to.
    pub fn path(&self) -> &Path {
        match self {
            ParseError::NotFound { path }
            | ParseError::Io { path, .. }
            | ParseError::InvalidFrontmatter { path, .. }
            | ParseError::Validation { path, .. } => path,
        }
    }

    /// Field issues, empty unless this is a validation failure.
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            ParseError::Validation { issues, .. } => issues,
            _ => &[],
        }
    }

    pub(crate) fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ParseError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ParseError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
