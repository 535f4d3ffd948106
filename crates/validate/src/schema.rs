//! L2 schema validation: required fields, value types and domain constraints.

use crate::common::{ArtifactKind, ValidationError, MIN_SKILL_DESCRIPTION_CHARS};
use crate::frontmatter::{parse_yaml_value, split_frontmatter, value_type_name};
use serde_yaml::{Mapping, Value};

/// Mode every generated agent must declare.
pub const AGENT_MODE: &str = "subagent";

struct Parsed<'a> {
    metadata: Mapping,
    body: &'a str,
}

fn parse(kind: ArtifactKind, content: &str) -> Result<Parsed<'_>, ValidationError> {
    let split = split_frontmatter(content).map_err(|_| {
        let label = match kind {
            ArtifactKind::Command => "Command",
            ArtifactKind::Agent => "Agent",
            ArtifactKind::Skill => "Skill",
        };
        ValidationError::schema(format!("{label} must have frontmatter and content"))
    })?;

    match parse_yaml_value(split.yaml) {
        Ok(Value::Mapping(metadata)) if !metadata.is_empty() => Ok(Parsed {
            metadata,
            body: split.body,
        }),
        Ok(Value::Null) | Ok(Value::Mapping(_)) => {
            Err(ValidationError::schema("Frontmatter is empty"))
        }
        Ok(other) => Err(ValidationError::schema(format!(
            "Frontmatter must be a mapping, got {}",
            value_type_name(&other)
        ))),
        Err(e) => Err(ValidationError::schema(e.to_string())),
    }
}

fn require_all(metadata: &Mapping, fields: &[&str]) -> Result<(), ValidationError> {
    let missing: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|field| !metadata.contains_key(*field))
        .collect();

    match missing.as_slice() {
        [] => Ok(()),
        [single] => Err(ValidationError::schema(format!(
            "Missing required field: {single}"
        ))),
        many => Err(ValidationError::schema(format!(
            "Missing required fields: {}",
            many.join(", ")
        ))),
    }
}

fn require_string<'m>(metadata: &'m Mapping, field: &str) -> Result<&'m str, ValidationError> {
    match metadata.get(field) {
        Some(Value::String(s)) => Ok(s),
        _ => Err(ValidationError::schema(format!(
            "Field '{field}' must be string"
        ))),
    }
}

/// L2 for commands: `description` is a string and a prompt body follows.
pub fn validate_command_schema(content: &str) -> Result<(), ValidationError> {
    let parsed = parse(ArtifactKind::Command, content)?;
    require_all(&parsed.metadata, &["description"])?;
    require_string(&parsed.metadata, "description")?;

    if parsed.body.trim().is_empty() {
        return Err(ValidationError::schema(
            "Command must have prompt content after frontmatter",
        ));
    }
    Ok(())
}

/// L2 for agents: `description`, `mode: subagent` and a `tools` mapping.
pub fn validate_agent_schema(content: &str) -> Result<(), ValidationError> {
    let parsed = parse(ArtifactKind::Agent, content)?;
    let metadata = &parsed.metadata;
    require_all(metadata, &["description", "mode", "tools"])?;
    require_string(metadata, "description")?;

    match metadata.get("mode") {
        Some(Value::String(mode)) if mode == AGENT_MODE => {}
        Some(Value::String(mode)) => {
            return Err(ValidationError::schema(format!(
                "Agent mode must be '{AGENT_MODE}', got '{mode}'"
            )))
        }
        Some(other) => {
            return Err(ValidationError::schema(format!(
                "Agent mode must be '{AGENT_MODE}', got {}",
                value_type_name(other)
            )))
        }
        None => {}
    }

    match metadata.get("tools") {
        Some(Value::Mapping(_)) => Ok(()),
        Some(other) => Err(ValidationError::schema(format!(
            "Field 'tools' must be object (dict), got {}",
            value_type_name(other)
        ))),
        None => Ok(()),
    }
}

/// L2 for skills: `name` and a `description` of at least 20 characters.
pub fn validate_skill_schema(content: &str) -> Result<(), ValidationError> {
    let parsed = parse(ArtifactKind::Skill, content)?;
    require_all(&parsed.metadata, &["name", "description"])?;
    require_string(&parsed.metadata, "name")?;
    let description = require_string(&parsed.metadata, "description")?;

    let length = description.trim().chars().count();
    if length < MIN_SKILL_DESCRIPTION_CHARS {
        return Err(ValidationError::schema(format!(
            "Description too short (must be >= {MIN_SKILL_DESCRIPTION_CHARS} chars): '{description}' (length: {length})"
        )));
    }
    Ok(())
}

/// Run the L2 check for any artifact kind.
pub fn validate_schema(kind: ArtifactKind, content: &str) -> Result<(), ValidationError> {
    match kind {
        ArtifactKind::Command => validate_command_schema(content),
        ArtifactKind::Agent => validate_agent_schema(content),
        ArtifactKind::Skill => validate_skill_schema(content),
    }
}
