//! Typed failures for registry loading, transformation and generation.

use plugbridge_validate::ArtifactKind;
use std::path::PathBuf;
use thiserror::Error;

/// Registry load failure. Aborts a build before any artifact is processed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("registry file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read registry {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid registry YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid registry: {reason}")]
    Shape { reason: String },
}

impl RegistryError {
    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        Self::Shape {
            reason: reason.into(),
        }
    }
}

/// A target record invariant was violated while transforming one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to transform {kind} '{name}': {reason}")]
pub struct TransformError {
    pub kind: ArtifactKind,
    pub name: String,
    pub reason: String,
}

impl TransformError {
    pub fn new(kind: ArtifactKind, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// A target record could not be rendered to its on-disk form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to generate {kind} '{name}': {reason}")]
pub struct GenerationError {
    pub kind: ArtifactKind,
    pub name: String,
    pub reason: String,
}

impl GenerationError {
    pub fn new(kind: ArtifactKind, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            reason: reason.into(),
        }
    }
}
