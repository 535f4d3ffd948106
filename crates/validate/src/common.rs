//! Common types for artifact validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Minimum length, in characters, of a skill description.
pub const MIN_SKILL_DESCRIPTION_CHARS: usize = 20;

/// The kind of plugin artifact being handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Slash command (single markdown file).
    Command,
    /// Subagent definition (single markdown file).
    Agent,
    /// Skill directory with a `SKILL.md` entry point.
    Skill,
}

impl ArtifactKind {
    /// All kinds, in build order.
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Command,
        ArtifactKind::Agent,
        ArtifactKind::Skill,
    ];

    /// Lowercase name used in messages and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Command => "command",
            ArtifactKind::Agent => "agent",
            ArtifactKind::Skill => "skill",
        }
    }

    /// Plural form, as used for counts and manifest keys.
    pub fn plural(self) -> &'static str {
        match self {
            ArtifactKind::Command => "commands",
            ArtifactKind::Agent => "agents",
            ArtifactKind::Skill => "skills",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A violated validation rule.
///
/// `Syntax` is the L1 check (frontmatter can be isolated and parsed),
/// `Schema` is the L2 check (required fields, types, domain constraints).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "lowercase")]
#[non_exhaustive]
pub enum ValidationError {
    /// L1 failure.
    #[error("Syntax error - {reason}")]
    Syntax { reason: String },
    /// L2 failure.
    #[error("Schema error - {reason}")]
    Schema { reason: String },
}

impl ValidationError {
    pub fn syntax(reason: impl Into<String>) -> Self {
        Self::Syntax {
            reason: reason.into(),
        }
    }

    pub fn schema(reason: impl Into<String>) -> Self {
        Self::Schema {
            reason: reason.into(),
        }
    }

    /// The human-readable rule that was violated.
    pub fn reason(&self) -> &str {
        match self {
            Self::Syntax { reason } | Self::Schema { reason } => reason,
        }
    }

    /// `"L1"` or `"L2"`.
    pub fn level(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "L1",
            Self::Schema { .. } => "L2",
        }
    }
}

/// Outcome of validating a single generated file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactValidation {
    /// Path to the generated file.
    pub path: PathBuf,
    /// Artifact kind inferred from the file's location.
    pub kind: ArtifactKind,
    /// Artifact name (file stem, or skill directory name).
    pub name: String,
    /// `Ok(())` when both levels pass.
    pub outcome: Result<(), ValidationError>,
}

impl ArtifactValidation {
    pub fn is_valid(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error(&self) -> Option<&ValidationError> {
        self.outcome.as_ref().err()
    }
}

/// Directory names that identify artifact kinds inside a build output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub command_dir: String,
    pub agent_dir: String,
    pub skills_dir: String,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self {
            command_dir: "command".to_string(),
            agent_dir: "agent".to_string(),
            skills_dir: "skills".to_string(),
        }
    }
}

/// Summary of validation results.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

impl ValidationSummary {
    pub fn from_results(results: &[ArtifactValidation]) -> Self {
        let valid = results.iter().filter(|r| r.is_valid()).count();
        ValidationSummary {
            total: results.len(),
            valid,
            invalid: results.len() - valid,
        }
    }

    pub fn all_valid(&self) -> bool {
        self.invalid == 0
    }
}
