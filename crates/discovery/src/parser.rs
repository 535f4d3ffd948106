//! Record parser: one source file (or skill directory) in, one typed record out.
//!
//! All field presence, type and domain checks happen here. Every offending
//! field is collected before failing, so a single error names all of them.

use std::fs;
use std::path::{Path, PathBuf};

use pathdiff::diff_paths;
use plugbridge_validate::frontmatter::{parse_frontmatter, value_type_name, ParsedFrontmatter};
use plugbridge_validate::SKILL_FILE;
use serde_yaml::{Mapping, Value};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::ParseError;
use crate::types::{
    check_skill_description, FieldIssue, SourceAgent, SourceCommand, SourceSkill, INHERIT_MODEL,
};

/// Skill subdirectories whose files are carried along as supporting files.
pub const SUPPORTING_DIRS: [&str; 3] = ["templates", "scripts", "examples"];

/// Collects field issues while reading values out of a frontmatter mapping.
struct Fields<'a> {
    metadata: &'a Mapping,
    issues: Vec<FieldIssue>,
}

impl<'a> Fields<'a> {
    fn new(metadata: &'a Mapping) -> Self {
        Self {
            metadata,
            issues: Vec::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        match self.metadata.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn optional(&mut self, key: &str) -> Option<String> {
        let value = self.get(key)?;
        match coerce_scalar(value) {
            Ok(s) => Some(s),
            Err(message) => {
                self.issues.push(FieldIssue::new(key, message));
                None
            }
        }
    }

    fn required(&mut self, key: &str) -> String {
        if self.get(key).is_none() {
            self.issues.push(FieldIssue::missing(key));
            return String::new();
        }
        match self.optional(key) {
            Some(s) if s.is_empty() => {
                self.issues.push(FieldIssue::new(key, "must not be empty"));
                s
            }
            Some(s) => s,
            None => String::new(),
        }
    }

    fn required_list(&mut self, key: &str) -> Vec<String> {
        match self.get(key) {
            None => {
                self.issues.push(FieldIssue::missing(key));
                Vec::new()
            }
            Some(Value::Sequence(items)) => self.scalar_items(key, items),
            Some(other) => {
                self.issues.push(FieldIssue::new(
                    key,
                    format!("expected a list, got {}", value_type_name(other)),
                ));
                Vec::new()
            }
        }
    }

    /// A list, or a comma separated string. Entries are trimmed and empty ones dropped.
    fn flexible_list(&mut self, key: &str) -> Vec<String> {
        match self.get(key) {
            None => Vec::new(),
            Some(Value::String(s)) => split_comma_list(s),
            Some(Value::Sequence(items)) => self
                .scalar_items(key, items)
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect(),
            Some(other) => {
                self.issues.push(FieldIssue::new(
                    key,
                    format!(
                        "expected a list or comma-separated string, got {}",
                        value_type_name(other)
                    ),
                ));
                Vec::new()
            }
        }
    }

    fn scalar_items(&mut self, key: &str, items: &[Value]) -> Vec<String> {
        let mut out = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            match coerce_scalar(item) {
                Ok(s) => out.push(s),
                Err(message) => self
                    .issues
                    .push(FieldIssue::new(format!("{key}[{idx}]"), message)),
            }
        }
        out
    }

    fn finish(self, path: &Path) -> Result<(), ParseError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ParseError::Validation {
                path: path.to_path_buf(),
                issues: self.issues,
            })
        }
    }
}

/// Coerce a YAML scalar to a trimmed string.
fn coerce_scalar(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(format!(
            "expected a scalar value, got {}",
            value_type_name(other)
        )),
    }
}

/// Split `"Read, Write, , Bash"` into `["Read", "Write", "Bash"]`.
pub fn split_comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_source(path: &Path) -> Result<String, ParseError> {
    fs::read_to_string(path).map_err(|e| ParseError::from_io(path, e))
}

fn split_source(path: &Path, content: &str) -> Result<ParsedFrontmatter, ParseError> {
    parse_frontmatter(content).map_err(|e| ParseError::InvalidFrontmatter {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Parse a command from already-loaded text; `path` is used for error attribution.
pub fn parse_command_str(path: &Path, content: &str) -> Result<SourceCommand, ParseError> {
    let parsed = split_source(path, content)?;
    let mut fields = Fields::new(&parsed.metadata);

    let name = fields.required("name");
    let version = fields.required("version");
    let description = fields.required("description");
    let argument_hint = fields.optional("argument-hint");
    let tags = fields.required_list("tags");
    let created = fields.required("created");
    let updated = fields.optional("updated");
    let author = fields.required("author");
    fields.finish(path)?;

    Ok(SourceCommand {
        name,
        version,
        description,
        argument_hint,
        tags,
        created,
        updated,
        author,
        content: parsed.body,
    })
}

/// Parse `commands/<name>.md`.
pub fn parse_command(path: &Path) -> Result<SourceCommand, ParseError> {
    let content = read_source(path)?;
    let command = parse_command_str(path, &content)?;
    debug!(path = %path.display(), name = %command.name, "parsed command");
    Ok(command)
}

/// Parse an agent from already-loaded text.
pub fn parse_agent_str(path: &Path, content: &str) -> Result<SourceAgent, ParseError> {
    let parsed = split_source(path, content)?;
    let mut fields = Fields::new(&parsed.metadata);

    let name = fields.required("name");
    let description = fields.required("description");
    let tools = fields.flexible_list("tools");
    let model = fields
        .optional("model")
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| INHERIT_MODEL.to_string());
    fields.finish(path)?;

    Ok(SourceAgent {
        name,
        description,
        tools,
        model,
        content: parsed.body,
    })
}

/// Parse `agents/<name>.md`.
pub fn parse_agent(path: &Path) -> Result<SourceAgent, ParseError> {
    let content = read_source(path)?;
    let agent = parse_agent_str(path, &content)?;
    debug!(path = %path.display(), name = %agent.name, tools = agent.tools.len(), "parsed agent");
    Ok(agent)
}

/// Parse a skill's `SKILL.md` text together with its supporting file list.
pub fn parse_skill_str(
    path: &Path,
    content: &str,
    supporting_files: Vec<PathBuf>,
) -> Result<SourceSkill, ParseError> {
    let parsed = split_source(path, content)?;
    let mut fields = Fields::new(&parsed.metadata);

    let name = fields.required("name");
    let description = fields.required("description");
    if !description.is_empty() {
        if let Err(issue) = check_skill_description(&description) {
            fields.issues.push(issue);
        }
    }
    let allowed_tools = fields.flexible_list("allowed-tools");
    fields.finish(path)?;

    SourceSkill::new(name, description, parsed.body, supporting_files)
        .map(|skill| skill.with_allowed_tools(allowed_tools))
        .map_err(|issue| ParseError::Validation {
            path: path.to_path_buf(),
            issues: vec![issue],
        })
}

/// Parse a skill directory (`skills/<name>/`).
pub fn parse_skill(skill_dir: &Path) -> Result<SourceSkill, ParseError> {
    let skill_md = skill_dir.join(SKILL_FILE);
    let content = read_source(&skill_md)?;
    let supporting_files = find_supporting_files(skill_dir);
    let skill = parse_skill_str(&skill_md, &content, supporting_files)?;
    debug!(
        path = %skill_dir.display(),
        name = %skill.name(),
        supporting = skill.supporting_files().len(),
        "parsed skill"
    );
    Ok(skill)
}

/// Files under `templates/`, `scripts/` and `examples/`, relative to the skill root, sorted.
pub fn find_supporting_files(skill_dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for subdir in SUPPORTING_DIRS {
        let root = skill_dir.join(subdir);
        if !root.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&root)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if let Some(relative) = diff_paths(entry.path(), skill_dir) {
                files.push(relative);
            }
        }
    }
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const COMMAND: &str = "---\nname: knowledge-build\nversion: 2.0\ndescription: Build the KB\nargument-hint: \"[path]\"\ntags:\n  - kb\n  - build\ncreated: 2025-10-01\nauthor: rp1\n---\n\nUse rp1-base:kb-builder here.\n";

    #[test]
    fn parses_command_with_coercion() {
        let cmd = parse_command_str(Path::new("c.md"), COMMAND).unwrap();
        assert_eq!(cmd.name, "knowledge-build");
        assert_eq!(cmd.version, "2.0");
        assert_eq!(cmd.argument_hint.as_deref(), Some("[path]"));
        assert_eq!(cmd.tags, vec!["kb", "build"]);
        assert_eq!(cmd.created, "2025-10-01");
        assert_eq!(cmd.updated, None);
        assert_eq!(cmd.content, "Use rp1-base:kb-builder here.");
    }

    #[test]
    fn command_names_every_missing_field() {
        let err = parse_command_str(
            Path::new("c.md"),
            "---\nname: x\ndescription: y\n---\nbody",
        )
        .unwrap_err();
        let fields: Vec<&str> = err.issues().iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["version", "tags", "created", "author"]);
    }

    #[test]
    fn command_tags_must_be_list() {
        let content = COMMAND.replace("tags:\n  - kb\n  - build\n", "tags: kb\n");
        let err = parse_command_str(Path::new("c.md"), &content).unwrap_err();
        assert_eq!(err.issues()[0].field, "tags");
        assert!(err.issues()[0].message.contains("expected a list"));
    }

    #[test]
    fn command_scalar_field_rejects_mapping() {
        let content = COMMAND.replace("author: rp1", "author:\n  first: a");
        let err = parse_command_str(Path::new("c.md"), &content).unwrap_err();
        assert_eq!(err.issues()[0].field, "author");
    }

    #[test]
    fn missing_closing_marker_is_invalid_frontmatter() {
        let err = parse_command_str(Path::new("c.md"), "---\nname: x\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidFrontmatter { .. }));
    }

    #[test]
    fn agent_tools_from_comma_string() {
        let agent = parse_agent_str(
            Path::new("a.md"),
            "---\nname: a\ndescription: d\ntools: Read, Write,, Bash \n---\nbody",
        )
        .unwrap();
        assert_eq!(agent.tools, vec!["Read", "Write", "Bash"]);
        assert_eq!(agent.model, "inherit");
    }

    #[test]
    fn agent_tools_from_list_and_model() {
        let agent = parse_agent_str(
            Path::new("a.md"),
            "---\nname: a\ndescription: d\ntools:\n  - Grep\n  - Glob\nmodel: sonnet\n---\nbody",
        )
        .unwrap();
        assert_eq!(agent.tools, vec!["Grep", "Glob"]);
        assert_eq!(agent.model, "sonnet");
    }

    #[test]
    fn agent_without_tools_has_empty_list() {
        let agent =
            parse_agent_str(Path::new("a.md"), "---\nname: a\ndescription: d\n---\nbody").unwrap();
        assert!(agent.tools.is_empty());
    }

    #[test]
    fn skill_reports_missing_name_and_short_description_together() {
        let err = parse_skill_str(
            Path::new("SKILL.md"),
            "---\ndescription: too short\n---\nbody",
            vec![],
        )
        .unwrap_err();
        let fields: Vec<&str> = err.issues().iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "description"]);
    }

    #[test]
    fn skill_allowed_tools_from_comma_string() {
        // GIVEN a skill restricting its tools
        let content = "---\nname: maestro\ndescription: Orchestrates multi-step work\nallowed-tools: Read, Grep , ,Bash\n---\nbody";

        // WHEN parsing it
        let skill = parse_skill_str(Path::new("SKILL.md"), content, vec![]).unwrap();

        // THEN the list is split and trimmed
        assert_eq!(skill.allowed_tools(), ["Read", "Grep", "Bash"]);
    }

    #[test]
    fn skill_without_allowed_tools_is_unrestricted() {
        let skill = parse_skill_str(
            Path::new("SKILL.md"),
            "---\nname: maestro\ndescription: Orchestrates multi-step work\n---\nbody",
            vec![],
        )
        .unwrap();
        assert!(skill.allowed_tools().is_empty());

        let err = parse_skill_str(
            Path::new("SKILL.md"),
            "---\nname: maestro\ndescription: Orchestrates multi-step work\nallowed-tools:\n  a: b\n---\nbody",
            vec![],
        )
        .unwrap_err();
        assert_eq!(err.issues()[0].field, "allowed-tools");
    }

    #[test]
    fn parse_skill_collects_supporting_files_only_from_known_dirs() {
        let tmp = tempdir().unwrap();
        let skill = tmp.path().join("maestro");
        fs::create_dir_all(skill.join("templates/nested")).unwrap();
        fs::create_dir_all(skill.join("scripts")).unwrap();
        fs::create_dir_all(skill.join("other")).unwrap();
        fs::write(
            skill.join(SKILL_FILE),
            "---\nname: maestro\ndescription: Orchestrates multi-step work\n---\n\n# Maestro\n",
        )
        .unwrap();
        fs::write(skill.join("templates/nested/b.md"), "b").unwrap();
        fs::write(skill.join("templates/a.md"), "a").unwrap();
        fs::write(skill.join("scripts/run.sh"), "run").unwrap();
        fs::write(skill.join("other/ignored.md"), "x").unwrap();
        fs::write(skill.join("README.md"), "x").unwrap();

        let parsed = parse_skill(&skill).unwrap();
        assert_eq!(parsed.name(), "maestro");
        assert_eq!(parsed.content(), "# Maestro");
        assert_eq!(
            parsed.supporting_files(),
            &[
                PathBuf::from("scripts/run.sh"),
                PathBuf::from("templates/a.md"),
                PathBuf::from("templates/nested/b.md"),
            ]
        );
    }

    #[test]
    fn parse_skill_without_entry_point_is_not_found() {
        let tmp = tempdir().unwrap();
        let err = parse_skill(tmp.path()).unwrap_err();
        assert!(matches!(err, ParseError::NotFound { .. }));
    }
}
