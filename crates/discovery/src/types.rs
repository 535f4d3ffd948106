use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use plugbridge_validate::MIN_SKILL_DESCRIPTION_CHARS;

/// A single offending field found while building a source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// Frontmatter key the issue applies to.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::new(field, "field required")
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A Claude Code slash command (`commands/<name>.md`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCommand {
    pub name: String,
    pub version: String,
    pub description: String,
    pub argument_hint: Option<String>,
    pub tags: Vec<String>,
    /// ISO-8601 date.
    pub created: String,
    pub updated: Option<String>,
    pub author: String,
    /// Body text after the frontmatter.
    pub content: String,
}

/// A Claude Code subagent (`agents/<name>.md`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAgent {
    pub name: String,
    pub description: String,
    /// Claude Code tool names, in declaration order.
    pub tools: Vec<String>,
    /// Model identifier; `inherit` means the caller's model.
    pub model: String,
    pub content: String,
}

/// Model value meaning "use whatever the caller uses".
pub const INHERIT_MODEL: &str = "inherit";

/// A Claude Code skill (`skills/<name>/SKILL.md` plus supporting files).
///
/// Fields are private so that a skill with a short description cannot be
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSkill {
    name: String,
    description: String,
    content: String,
    supporting_files: Vec<PathBuf>,
    allowed_tools: Vec<String>,
}

impl SourceSkill {
    /// Build a skill, enforcing the minimum description length.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        content: impl Into<String>,
        supporting_files: Vec<PathBuf>,
    ) -> Result<Self, FieldIssue> {
        let description = description.into();
        check_skill_description(&description)?;
        Ok(Self {
            name: name.into(),
            description,
            content: content.into(),
            supporting_files,
            allowed_tools: Vec::new(),
        })
    }

    /// Set the `allowed-tools` restriction.
    pub fn with_allowed_tools(mut self, allowed_tools: Vec<String>) -> Self {
        self.allowed_tools = allowed_tools;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Paths relative to the skill directory.
    pub fn supporting_files(&self) -> &[PathBuf] {
        &self.supporting_files
    }

    /// Tool names from `allowed-tools`, empty when unrestricted.
    pub fn allowed_tools(&self) -> &[String] {
        &self.allowed_tools
    }
}

/// Check a skill description against the minimum length, counted in
/// characters after trimming surrounding whitespace.
pub fn check_skill_description(description: &str) -> Result<(), FieldIssue> {
    let length = description.trim().chars().count();
    if length < MIN_SKILL_DESCRIPTION_CHARS {
        return Err(FieldIssue::new(
            "description",
            format!(
                "must be at least {MIN_SKILL_DESCRIPTION_CHARS} characters (length: {length})"
            ),
        ));
    }
    Ok(())
}
