//! Render target records to OpenCode file text.
//!
//! Output is assembled fully in memory; the build driver writes it in one
//! call so no partially written artifact is ever left on disk.

use std::path::PathBuf;

use plugbridge_validate::frontmatter::{quoted_scalar, yaml_scalar, DELIMITER};
use plugbridge_validate::{ArtifactKind, ArtifactLayout, SKILL_FILE};

use crate::error::GenerationError;
use crate::models::{TargetAgent, TargetCommand, TargetSkill};

/// A rendered artifact, relative to the plugin output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub relative_path: PathBuf,
    pub content: String,
}

/// A rendered skill plus the supporting files to copy beside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSkill {
    pub artifact: GeneratedArtifact,
    /// Paths relative to the source skill directory.
    pub supporting_files: Vec<PathBuf>,
}

/// True when `name` can be used as a single path component: ASCII
/// alphanumerics, `-`, `_` or `.`, and not `.` or `..` itself.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn check_name(kind: ArtifactKind, name: &str) -> Result<(), GenerationError> {
    if is_safe_file_name(name) {
        Ok(())
    } else {
        Err(GenerationError::new(
            kind,
            name,
            "name is not a safe file name",
        ))
    }
}

fn check_namespace(kind: ArtifactKind, name: &str, namespace: &str) -> Result<(), GenerationError> {
    if is_safe_file_name(namespace) {
        Ok(())
    } else {
        Err(GenerationError::new(
            kind,
            name,
            format!("namespace '{namespace}' is not a safe directory name"),
        ))
    }
}

fn push_field(out: &mut String, key: &str, rendered: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(rendered);
    out.push('\n');
}

fn finish(mut frontmatter: String, body: &str) -> String {
    frontmatter.push_str(DELIMITER);
    frontmatter.push_str("\n\n");
    frontmatter.push_str(body);
    frontmatter
}

fn open() -> String {
    format!("{DELIMITER}\n")
}

/// Render a command to `<command_dir>/<namespace>/<name>.md`.
pub fn generate_command(
    command: &TargetCommand,
    name: &str,
    namespace: &str,
    layout: &ArtifactLayout,
) -> Result<GeneratedArtifact, GenerationError> {
    check_name(ArtifactKind::Command, name)?;
    check_namespace(ArtifactKind::Command, name, namespace)?;

    let mut out = open();
    push_field(&mut out, "description", &yaml_scalar(command.description()));
    if let Some(hint) = command.argument_hint() {
        push_field(&mut out, "argument-hint", &quoted_scalar(hint));
    }
    if let Some(model) = command.model() {
        push_field(&mut out, "model", &yaml_scalar(model));
    }
    if command.subtask() {
        push_field(&mut out, "subtask", "true");
    }

    Ok(GeneratedArtifact {
        relative_path: PathBuf::from(&layout.command_dir)
            .join(namespace)
            .join(format!("{name}.md")),
        content: finish(out, command.template()),
    })
}

/// Render an agent to `<agent_dir>/<namespace>/<name>.md`.
pub fn generate_agent(
    agent: &TargetAgent,
    namespace: &str,
    layout: &ArtifactLayout,
) -> Result<GeneratedArtifact, GenerationError> {
    check_name(ArtifactKind::Agent, agent.name())?;
    check_namespace(ArtifactKind::Agent, agent.name(), namespace)?;

    let has = |names: [&str; 2]| agent.tools().iter().any(|t| names.contains(&t.as_str()));

    let mut out = open();
    push_field(&mut out, "description", &yaml_scalar(agent.description()));
    push_field(&mut out, "mode", agent.mode());
    if let Some(model) = agent.model() {
        push_field(&mut out, "model", &yaml_scalar(model));
    }
    out.push_str("tools:\n");
    out.push_str(&format!("  bash: {}\n", has(["bash_run", "Bash"])));
    out.push_str(&format!("  write: {}\n", has(["write_file", "Write"])));
    out.push_str(&format!("  edit: {}\n", has(["edit_file", "Edit"])));

    Ok(GeneratedArtifact {
        relative_path: PathBuf::from(&layout.agent_dir)
            .join(namespace)
            .join(format!("{}.md", agent.name())),
        content: finish(out, agent.content()),
    })
}

/// Render a skill to `<skills_dir>/<name>/SKILL.md`.
pub fn generate_skill(
    skill: &TargetSkill,
    layout: &ArtifactLayout,
) -> Result<GeneratedSkill, GenerationError> {
    check_name(ArtifactKind::Skill, skill.name())?;

    let mut out = open();
    push_field(&mut out, "name", &yaml_scalar(skill.name()));
    push_field(&mut out, "description", &yaml_scalar(skill.description()));
    if !skill.allowed_tools().is_empty() {
        out.push_str("allowed-tools:\n");
        for tool in skill.allowed_tools() {
            out.push_str("  - ");
            out.push_str(&yaml_scalar(tool));
            out.push('\n');
        }
    }

    Ok(GeneratedSkill {
        artifact: GeneratedArtifact {
            relative_path: PathBuf::from(&layout.skills_dir)
                .join(skill.name())
                .join(SKILL_FILE),
            content: finish(out, skill.content()),
        },
        supporting_files: skill.supporting_files().to_vec(),
    })
}
