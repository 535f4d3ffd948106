//! OpenCode target records.
//!
//! Each record is built by exactly one transformation and consumed once by
//! the generator. Constructors enforce the invariants the generator and the
//! validators rely on, so an invalid target record cannot exist.

use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;

use plugbridge_validate::MIN_SKILL_DESCRIPTION_CHARS;

/// Agent mode emitted for every converted agent.
pub const SUBAGENT_MODE: &str = "subagent";

/// Permission category → granted actions, in rule order.
pub type Permissions = IndexMap<String, Vec<String>>;

/// An OpenCode command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetCommand {
    template: String,
    description: String,
    argument_hint: Option<String>,
    agent: Option<String>,
    model: Option<String>,
    subtask: bool,
}

impl TargetCommand {
    /// Build a command. The template (prompt body) must not be empty.
    pub fn new(
        template: impl Into<String>,
        description: impl Into<String>,
        argument_hint: Option<String>,
    ) -> Result<Self, String> {
        let template = template.into();
        if template.trim().is_empty() {
            return Err("command template must not be empty".to_string());
        }
        Ok(Self {
            template,
            description: description.into(),
            argument_hint,
            agent: None,
            model: None,
            subtask: false,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_subtask(mut self, subtask: bool) -> Self {
        self.subtask = subtask;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn argument_hint(&self) -> Option<&str> {
        self.argument_hint.as_deref()
    }

    /// Delegation agent. Never set by conversion: OpenCode runs a command's
    /// `agent` in the background, so delegation stays in the prompt text.
    pub fn agent(&self) -> Option<&str> {
        self.agent.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn subtask(&self) -> bool {
        self.subtask
    }
}

/// An OpenCode subagent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetAgent {
    name: String,
    description: String,
    model: Option<String>,
    tools: Vec<String>,
    permissions: Permissions,
    content: String,
}

impl TargetAgent {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        model: Option<String>,
        tools: Vec<String>,
        permissions: Permissions,
        content: impl Into<String>,
    ) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("agent name must not be empty".to_string());
        }
        Ok(Self {
            name,
            description: description.into(),
            model,
            tools,
            permissions,
            content: content.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Always `subagent`.
    pub fn mode(&self) -> &'static str {
        SUBAGENT_MODE
    }

    /// `None` when the source asked to inherit the caller's model.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// OpenCode tool names.
    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// An OpenCode skill (`skills/<name>/SKILL.md`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSkill {
    name: String,
    description: String,
    content: String,
    supporting_files: Vec<PathBuf>,
    allowed_tools: Vec<String>,
}

impl TargetSkill {
    /// Build a skill, re-checking the minimum description length.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        content: impl Into<String>,
        supporting_files: Vec<PathBuf>,
    ) -> Result<Self, String> {
        let description = description.into();
        let length = description.trim().chars().count();
        if length < MIN_SKILL_DESCRIPTION_CHARS {
            return Err(format!(
                "description must be at least {MIN_SKILL_DESCRIPTION_CHARS} characters (length: {length})"
            ));
        }
        Ok(Self {
            name: name.into(),
            description,
            content: content.into(),
            supporting_files,
            allowed_tools: Vec::new(),
        })
    }

    /// Carry over an `allowed-tools` list; names pass through unchanged.
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

    pub fn supporting_files(&self) -> &[PathBuf] {
        &self.supporting_files
    }

    pub fn allowed_tools(&self) -> &[String] {
        &self.allowed_tools
    }
}
