//! L1 syntax validation: the frontmatter block can be isolated and parsed.

use crate::common::{ArtifactKind, ValidationError};
use crate::frontmatter::{has_frontmatter, parse_yaml_value, split_frontmatter, FrontmatterError};

fn label(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Command => "Command",
        ArtifactKind::Agent => "Agent",
        ArtifactKind::Skill => "Skill",
    }
}

/// Run the L1 check for any artifact kind.
pub fn validate_syntax(kind: ArtifactKind, content: &str) -> Result<(), ValidationError> {
    if !has_frontmatter(content) {
        return Err(ValidationError::syntax(format!(
            "{} must start with YAML frontmatter (---)",
            label(kind)
        )));
    }

    let split = split_frontmatter(content).map_err(|e| match e {
        FrontmatterError::MissingOpening => ValidationError::syntax(format!(
            "{} must start with YAML frontmatter (---)",
            label(kind)
        )),
        _ => ValidationError::syntax(
            "Invalid frontmatter structure (must have opening and closing ---)",
        ),
    })?;

    match parse_yaml_value(split.yaml) {
        Ok(_) => Ok(()),
        Err(FrontmatterError::Yaml(reason)) => Err(ValidationError::syntax(format!(
            "Invalid YAML in frontmatter: {reason}"
        ))),
        Err(other) => Err(ValidationError::syntax(other.to_string())),
    }
}

/// L1: command frontmatter is present and parses.
pub fn validate_command_syntax(content: &str) -> Result<(), ValidationError> {
    validate_syntax(ArtifactKind::Command, content)
}

/// L1: agent frontmatter is present and parses.
pub fn validate_agent_syntax(content: &str) -> Result<(), ValidationError> {
    validate_syntax(ArtifactKind::Agent, content)
}

/// L1: skill frontmatter is present and parses.
pub fn validate_skill_syntax(content: &str) -> Result<(), ValidationError> {
    validate_syntax(ArtifactKind::Skill, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_command_syntax() {
        let content = "---\ndescription: Test command\n---\n\nTemplate";
        assert!(validate_command_syntax(content).is_ok());
    }

    #[test]
    fn test_missing_opening_names_the_kind() {
        let err = validate_agent_syntax("description: x\n---\nbody").unwrap_err();
        assert_eq!(
            err,
            ValidationError::syntax("Agent must start with YAML frontmatter (---)")
        );
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let err = validate_skill_syntax("---\nname: x\ndescription: y\n").unwrap_err();
        assert!(err.reason().contains("must have opening and closing ---"));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = validate_command_syntax("---\ndescription: [broken\n---\nbody").unwrap_err();
        assert!(err.reason().starts_with("Invalid YAML in frontmatter:"));
    }

    #[test]
    fn test_byte_order_mark_before_frontmatter_is_valid() {
        let content = "\u{feff}---\ndescription: Test command\n---\n\nTemplate";
        assert!(validate_command_syntax(content).is_ok());
    }

    #[test]
    fn test_empty_frontmatter_is_syntactically_valid() {
        // Emptiness is an L2 concern.
        assert!(validate_command_syntax("---\n---\nbody").is_ok());
    }
}
