//! YAML frontmatter handling shared by the parser, generator and validators.
//!
//! Artifacts on both platforms are markdown files that open with a `---`
//! line, carry `key: value` metadata, close with a second `---` line and
//! continue with free-form body text:
//!
//! ```text
//! ---
//! description: Build the knowledge base
//! argument-hint: "[path]"
//! ---
//!
//! Body text...
//! ```
//!
//! Splitting is line based: the closing delimiter must sit on its own line,
//! so `---` appearing inside a value never ends the block.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Line that opens and closes a frontmatter block.
pub const DELIMITER: &str = "---";

/// Errors raised while isolating or parsing a frontmatter block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontmatterError {
    /// The content does not open with a `---` line.
    #[error("missing YAML frontmatter (must start with ---)")]
    MissingOpening,
    /// No closing `---` line follows the opening one.
    #[error("invalid frontmatter structure (must have opening and closing ---)")]
    MissingClosing,
    /// The block is not valid YAML.
    #[error("invalid YAML in frontmatter: {0}")]
    Yaml(String),
    /// The block parsed but is empty or not a `key: value` mapping.
    #[error("frontmatter is empty or not a mapping")]
    NotAMapping,
}

/// Frontmatter block and body, borrowed from the original content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitFrontmatter<'a> {
    /// Raw YAML between the delimiters (without the delimiter lines).
    pub yaml: &'a str,
    /// Everything after the closing delimiter line, untouched.
    pub body: &'a str,
}

/// Parsed metadata plus the trimmed body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFrontmatter {
    /// Top-level `key: value` pairs.
    pub metadata: Mapping,
    /// Body text with surrounding whitespace removed.
    pub body: String,
}

/// Check whether content opens with a frontmatter delimiter, ignoring a
/// leading byte order mark the same way [`split_frontmatter`] does.
pub fn has_frontmatter(content: &str) -> bool {
    content
        .strip_prefix('\u{feff}')
        .unwrap_or(content)
        .starts_with(DELIMITER)
}

/// Split content into its frontmatter block and body.
pub fn split_frontmatter(content: &str) -> Result<SplitFrontmatter<'_>, FrontmatterError> {
    let rest = content
        .strip_prefix('\u{feff}')
        .unwrap_or(content)
        .strip_prefix(DELIMITER)
        .ok_or(FrontmatterError::MissingOpening)?;

    let (opening_tail, after_open) = match rest.find('\n') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, ""),
    };
    if !opening_tail.trim().is_empty() {
        return Err(FrontmatterError::MissingOpening);
    }

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            return Ok(SplitFrontmatter {
                yaml: &after_open[..offset],
                body: &after_open[offset + line.len()..],
            });
        }
        offset += line.len();
    }

    Err(FrontmatterError::MissingClosing)
}

/// Parse a YAML block into a generic value.
///
/// An empty block yields `Value::Null`, which is syntactically fine.
pub fn parse_yaml_value(yaml: &str) -> Result<Value, FrontmatterError> {
    if yaml.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str::<Value>(yaml).map_err(|e| FrontmatterError::Yaml(e.to_string()))
}

/// Parse a YAML block that must be a non-empty mapping.
pub fn parse_yaml_mapping(yaml: &str) -> Result<Mapping, FrontmatterError> {
    match parse_yaml_value(yaml)? {
        Value::Mapping(mapping) if !mapping.is_empty() => Ok(mapping),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

/// Split and parse a complete artifact.
pub fn parse_frontmatter(content: &str) -> Result<ParsedFrontmatter, FrontmatterError> {
    let split = split_frontmatter(content)?;
    let metadata = parse_yaml_mapping(split.yaml)?;
    Ok(ParsedFrontmatter {
        metadata,
        body: split.body.trim().to_string(),
    })
}

/// Name of a YAML value's type, for error messages.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

const RESERVED_WORDS: &[&str] = &[
    "true", "false", "yes", "no", "on", "off", "null", "y", "n", "~",
];

const INDICATORS: &[char] = &[
    '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
    '`',
];

// Characters YAML treats as line breaks or that must never appear raw.
fn needs_escape(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}')
}

fn is_plain_safe(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };
    if value.trim() != value || value.chars().any(needs_escape) {
        return false;
    }
    if INDICATORS.contains(&first) || first.is_ascii_digit() || first == '.' || first == '+' {
        return false;
    }
    if value.contains(": ") || value.ends_with(':') || value.contains(" #") {
        return false;
    }
    !RESERVED_WORDS
        .iter()
        .any(|word| value.eq_ignore_ascii_case(word))
}

/// Render a string as a double-quoted YAML scalar.
pub fn quoted_scalar(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if needs_escape(c) => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a string as a YAML scalar that re-parses to the same string.
///
/// Plain style is used when unambiguous, double quotes otherwise.
pub fn yaml_scalar(value: &str) -> String {
    if is_plain_safe(value) {
        value.to_string()
    } else {
        quoted_scalar(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_frontmatter() {
        assert!(has_frontmatter("---\nname: test\n---\n# Content"));
        assert!(!has_frontmatter("# No frontmatter"));
        assert!(!has_frontmatter("-- not quite"));
    }

    #[test]
    fn test_byte_order_mark_is_ignored_consistently() {
        // GIVEN frontmatter preceded by a BOM
        let content = "\u{feff}---\nname: test\n---\nBody";

        // THEN detection and splitting agree
        assert!(has_frontmatter(content));
        let split = split_frontmatter(content).unwrap();
        assert_eq!(split.yaml, "name: test\n");
        assert!(!has_frontmatter("\u{feff}# Heading"));
    }

    #[test]
    fn test_split_frontmatter() {
        let content = "---\nname: test\ndescription: A test skill\n---\n# Heading\nBody";
        let split = split_frontmatter(content).unwrap();

        assert_eq!(split.yaml, "name: test\ndescription: A test skill\n");
        assert_eq!(split.body, "# Heading\nBody");
    }

    #[test]
    fn test_split_requires_opening_line() {
        assert_eq!(
            split_frontmatter("# Just markdown"),
            Err(FrontmatterError::MissingOpening)
        );
        assert_eq!(
            split_frontmatter("---name: x\n---\n"),
            Err(FrontmatterError::MissingOpening)
        );
    }

    #[test]
    fn test_split_requires_closing_line() {
        assert_eq!(
            split_frontmatter("---\nname: test\nbody without close"),
            Err(FrontmatterError::MissingClosing)
        );
    }

    #[test]
    fn test_inline_dashes_do_not_close_block() {
        let content = "---\ndescription: a---b\n---\nbody --- more";
        let split = split_frontmatter(content).unwrap();
        assert_eq!(split.yaml, "description: a---b\n");
        assert_eq!(split.body, "body --- more");
    }

    #[test]
    fn test_crlf_delimiters() {
        let content = "---\r\nname: test\r\n---\r\nBody";
        let split = split_frontmatter(content).unwrap();
        assert_eq!(split.yaml, "name: test\r\n");
        assert_eq!(split.body, "Body");
    }

    #[test]
    fn test_parse_frontmatter_trims_body() {
        let parsed = parse_frontmatter("---\nname: my-skill\n---\n\n# My Skill\n\n").unwrap();
        assert_eq!(
            parsed.metadata.get("name"),
            Some(&Value::String("my-skill".into()))
        );
        assert_eq!(parsed.body, "# My Skill");
    }

    #[test]
    fn test_parse_frontmatter_rejects_empty_block() {
        assert_eq!(
            parse_frontmatter("---\n---\nbody"),
            Err(FrontmatterError::NotAMapping)
        );
    }

    #[test]
    fn test_parse_frontmatter_reports_yaml_errors() {
        let err = parse_frontmatter("---\nname: [unclosed\n---\nbody").unwrap_err();
        assert!(matches!(err, FrontmatterError::Yaml(_)));
    }

    #[test]
    fn test_comments_are_ignored() {
        let parsed = parse_frontmatter("---\n# comment\nname: x\n\n---\nbody").unwrap();
        assert_eq!(parsed.metadata.len(), 1);
    }

    #[test]
    fn test_yaml_scalar_plain_when_safe() {
        assert_eq!(yaml_scalar("Build the knowledge base"), "Build the knowledge base");
        assert_eq!(yaml_scalar("my-skill"), "my-skill");
        assert_eq!(yaml_scalar("a:b"), "a:b");
    }

    #[test]
    fn test_yaml_scalar_quotes_when_needed() {
        assert_eq!(yaml_scalar("Contains: colon"), "\"Contains: colon\"");
        assert_eq!(yaml_scalar("true"), "\"true\"");
        assert_eq!(yaml_scalar("123"), "\"123\"");
        assert_eq!(yaml_scalar("[path]"), "\"[path]\"");
        assert_eq!(yaml_scalar(""), "\"\"");
        assert_eq!(yaml_scalar("say \"hi\" # now"), "\"say \\\"hi\\\" # now\"");
    }

    #[test]
    fn test_yaml_scalar_round_trips_through_parser() {
        let samples = [
            "plain text",
            "key: value",
            "ends with colon:",
            "- dash start",
            "null",
            "1.0",
            "multi\nline",
            "tab\there",
            "back\\slash",
            "  padded  ",
            "{name}",
            "it's fine",
        ];
        for sample in samples {
            let yaml = format!("description: {}\n", yaml_scalar(sample));
            let mapping = parse_yaml_mapping(&yaml).unwrap();
            assert_eq!(
                mapping.get("description"),
                Some(&Value::String(sample.to_string())),
                "sample {sample:?} rendered as {yaml:?}"
            );
        }
    }

    #[test]
    fn test_value_type_name() {
        assert_eq!(value_type_name(&Value::Sequence(vec![])), "sequence");
        assert_eq!(value_type_name(&Value::Mapping(Mapping::new())), "mapping");
    }
}
