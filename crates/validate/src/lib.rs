//! Frontmatter handling and two-level validation for generated OpenCode artifacts.
//!
//! Every artifact is checked at two levels:
//!
//! - **L1 syntax**: the file opens with `---`, has a closing `---` line and
//!   the block between them parses as YAML.
//! - **L2 schema**: required keys exist for the artifact kind and their values
//!   have the right type and satisfy domain constraints.
//!
//! # Example
//!
//! ```rust
//! use plugbridge_validate::{validate_artifact, ArtifactKind};
//!
//! let command = "---\ndescription: Build the knowledge base\n---\n\nRun the build.\n";
//! assert!(validate_artifact(ArtifactKind::Command, command).is_ok());
//!
//! let skill = "---\nname: short\ndescription: Too short\n---\n";
//! let err = validate_artifact(ArtifactKind::Skill, skill).unwrap_err();
//! assert!(err.reason().contains("must be >= 20 chars"));
//! ```

pub mod common;
pub mod frontmatter;
pub mod schema;
pub mod syntax;

pub use common::{
    ArtifactKind, ArtifactLayout, ArtifactValidation, ValidationError, ValidationSummary,
    MIN_SKILL_DESCRIPTION_CHARS,
};
pub use frontmatter::{
    has_frontmatter, parse_frontmatter, quoted_scalar, split_frontmatter, yaml_scalar,
    FrontmatterError, ParsedFrontmatter, SplitFrontmatter,
};
pub use schema::{
    validate_agent_schema, validate_command_schema, validate_schema, validate_skill_schema,
};
pub use syntax::{
    validate_agent_syntax, validate_command_syntax, validate_skill_syntax, validate_syntax,
};

use std::path::{Component, Path};
use tracing::debug;
use walkdir::WalkDir;

/// File name of a skill's entry point.
pub const SKILL_FILE: &str = "SKILL.md";

/// Run L1 then L2 for one artifact.
pub fn validate_artifact(kind: ArtifactKind, content: &str) -> Result<(), ValidationError> {
    validate_syntax(kind, content)?;
    validate_schema(kind, content)
}

/// Work out which artifact kind (and name) a file in a build tree represents.
///
/// Paths are interpreted relative to `root`. Files under a skills directory
/// other than the `SKILL.md` entry points are supporting files and yield
/// `None`, as does anything outside the three known directories.
pub fn classify_artifact(
    root: &Path,
    path: &Path,
    layout: &ArtifactLayout,
) -> Option<(ArtifactKind, String)> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let components: Vec<&str> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    let (file_name, dirs) = components.split_last()?;

    for (idx, dir) in dirs.iter().enumerate() {
        if *dir == layout.skills_dir {
            // Only skills/<name>/SKILL.md counts.
            return match &dirs[idx + 1..] {
                [skill] if *file_name == SKILL_FILE => {
                    Some((ArtifactKind::Skill, (*skill).to_string()))
                }
                _ => None,
            };
        }
        let kind = if *dir == layout.command_dir {
            ArtifactKind::Command
        } else if *dir == layout.agent_dir {
            ArtifactKind::Agent
        } else {
            continue;
        };
        let stem = file_name.strip_suffix(".md")?;
        return Some((kind, stem.to_string()));
    }
    None
}

/// Validate every artifact found in a build output tree.
///
/// Results are ordered by path.
pub fn validate_artifacts(
    dir: &Path,
    layout: &ArtifactLayout,
) -> Result<Vec<ArtifactValidation>, std::io::Error> {
    let mut results = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some((kind, name)) = classify_artifact(dir, path, layout) else {
            continue;
        };

        let content = std::fs::read_to_string(path)?;
        let outcome = validate_artifact(kind, &content);
        debug!(path = %path.display(), %kind, valid = outcome.is_ok(), "validated artifact");
        results.push(ArtifactValidation {
            path: path.to_path_buf(),
            kind,
            name,
            outcome,
        });
    }

    Ok(results)
}
