//! Platform registry: the declarative Claude Code → OpenCode mapping table.
//!
//! Built-in defaults cover directory renames, tool names and metadata field
//! names. An optional YAML file overrides them key by key:
//!
//! ```yaml
//! tool_mappings:
//!   WebSearch: search_web     # rename
//!   TodoWrite: null           # no OpenCode equivalent, drop it
//! plugin_namespaces: [rp1-base, rp1-dev, acme]
//! ```
//!
//! The registry is constructed once per build and shared read-only.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

use plugbridge_validate::ArtifactLayout;

use crate::error::RegistryError;

/// Conventional location of the override file, relative to the source root.
pub const DEFAULT_REGISTRY_PATH: &str = "config/platform_registry.yaml";

/// Placeholder substituted with the skill name in the `Skill` mapping.
pub const SKILL_NAME_PLACEHOLDER: &str = "{name}";

const DEFAULT_DIRECTORY_MAPPINGS: &[(&str, &str)] = &[("agents", "agent"), ("commands", "command")];

const DEFAULT_TOOL_MAPPINGS: &[(&str, Option<&str>)] = &[
    // File operations
    ("Read", Some("read_file")),
    ("Write", Some("write_file")),
    ("Edit", Some("edit_file")),
    ("NotebookEdit", Some("edit_notebook_cell")),
    // Search
    ("Grep", Some("grep_file")),
    ("Glob", Some("glob_pattern")),
    // Execution
    ("Bash", Some("bash_run")),
    ("BashOutput", Some("get_bash_output")),
    ("KillShell", Some("kill_bash")),
    // Semantic: consumed by the transformation engine, not literal renames
    ("Task", Some("@mention")),
    ("SlashCommand", Some("command_invoke")),
    ("Skill", Some("skills_{name}")),
    // Web
    ("WebFetch", Some("web_fetch")),
    ("WebSearch", Some("web_search")),
    // Interaction
    ("AskUserQuestion", Some("ask_user")),
    ("TodoWrite", Some("manage_todos")),
    // Claude Code only
    ("ExitPlanMode", None),
    ("EnterPlanMode", None),
];

const DEFAULT_METADATA_FIELDS: &[&str] = &[
    "name",
    "version",
    "description",
    "argument-hint",
    "tags",
    "created",
    "author",
];

const DEFAULT_NAMESPACES: &[&str] = &["rp1-base", "rp1-dev"];

const KNOWN_KEYS: &[&str] = &[
    "directory_mappings",
    "tool_mappings",
    "metadata_mappings",
    "plugin_namespaces",
];

static DEFAULT_REGISTRY: LazyLock<PlatformRegistry> = LazyLock::new(|| PlatformRegistry {
    directory_mappings: DEFAULT_DIRECTORY_MAPPINGS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
    tool_mappings: DEFAULT_TOOL_MAPPINGS
        .iter()
        .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
        .collect(),
    metadata_mappings: DEFAULT_METADATA_FIELDS
        .iter()
        .map(|f| (f.to_string(), f.to_string()))
        .collect(),
    plugin_namespaces: DEFAULT_NAMESPACES.iter().map(|s| s.to_string()).collect(),
});

/// Tools whose mapping is a placeholder interpreted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticTool {
    /// Agent delegation.
    Task,
    /// Sub-command invocation; the mapping is the invoke function name.
    SlashCommand,
    /// Skill invocation; the mapping contains `{name}`.
    Skill,
}

impl SemanticTool {
    pub fn source_name(self) -> &'static str {
        match self {
            Self::Task => "Task",
            Self::SlashCommand => "SlashCommand",
            Self::Skill => "Skill",
        }
    }

    fn default_target(self) -> &'static str {
        match self {
            Self::Task => "@mention",
            Self::SlashCommand => "command_invoke",
            Self::Skill => "skills_{name}",
        }
    }
}

/// Registry file contents. Every section is optional.
#[derive(Debug, Default, Deserialize)]
struct RegistryOverride {
    #[serde(default)]
    directory_mappings: IndexMap<String, String>,
    #[serde(default)]
    tool_mappings: IndexMap<String, Option<String>>,
    #[serde(default)]
    metadata_mappings: IndexMap<String, String>,
    #[serde(default)]
    plugin_namespaces: Option<Vec<String>>,
}

/// Mapping table between the two platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformRegistry {
    directory_mappings: IndexMap<String, String>,
    tool_mappings: IndexMap<String, Option<String>>,
    metadata_mappings: IndexMap<String, String>,
    plugin_namespaces: Vec<String>,
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        DEFAULT_REGISTRY.clone()
    }
}

impl PlatformRegistry {
    /// Defaults merged with YAML override text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RegistryError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_yaml::from_str(yaml)?;
        let overrides = match &value {
            Value::Null => RegistryOverride::default(),
            Value::Mapping(mapping) => {
                for key in mapping.keys() {
                    match key.as_str() {
                        Some(k) if KNOWN_KEYS.contains(&k) => {}
                        _ => {
                            return Err(RegistryError::shape(format!(
                                "unknown top-level key {}",
                                describe_key(key)
                            )))
                        }
                    }
                }
                serde_yaml::from_value(value.clone())
                    .map_err(|e| RegistryError::shape(e.to_string()))?
            }
            _ => {
                return Err(RegistryError::shape(
                    "registry file must be a mapping of sections",
                ))
            }
        };

        let mut registry = Self::default();
        registry.merge(overrides);
        registry.check_shape()?;
        Ok(registry)
    }

    /// Load an override file that must exist.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                RegistryError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                RegistryError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let registry = Self::from_yaml_str(&yaml)?;
        info!(path = %path.display(), "loaded platform registry overrides");
        Ok(registry)
    }

    /// Load an override file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, RegistryError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no registry override file; using defaults");
            Ok(Self::default())
        }
    }

    fn merge(&mut self, overrides: RegistryOverride) {
        self.directory_mappings.extend(overrides.directory_mappings);
        self.tool_mappings.extend(overrides.tool_mappings);
        self.metadata_mappings.extend(overrides.metadata_mappings);
        if let Some(namespaces) = overrides.plugin_namespaces {
            self.plugin_namespaces = namespaces;
        }
    }

    fn check_shape(&self) -> Result<(), RegistryError> {
        for (section, map) in [
            ("directory_mappings", &self.directory_mappings),
            ("metadata_mappings", &self.metadata_mappings),
        ] {
            for (key, value) in map {
                if key.trim().is_empty() || value.trim().is_empty() {
                    return Err(RegistryError::shape(format!(
                        "{section} entries must be non-empty (got '{key}' -> '{value}')"
                    )));
                }
            }
        }

        for (key, value) in &self.tool_mappings {
            if key.trim().is_empty() {
                return Err(RegistryError::shape("tool_mappings keys must be non-empty"));
            }
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(RegistryError::shape(format!(
                    "tool_mappings.{key} must be a tool name or null"
                )));
            }
        }

        if let Some(Some(skill)) = self.tool_mappings.get(SemanticTool::Skill.source_name()) {
            if !skill.contains(SKILL_NAME_PLACEHOLDER) {
                return Err(RegistryError::shape(format!(
                    "tool_mappings.Skill must contain {SKILL_NAME_PLACEHOLDER} (got '{skill}')"
                )));
            }
        }

        for namespace in &self.plugin_namespaces {
            if !is_valid_namespace(namespace) {
                return Err(RegistryError::shape(format!(
                    "plugin namespace '{namespace}' may only contain letters, digits, '-', '_' and '.'"
                )));
            }
        }
        Ok(())
    }

    /// Add namespaces (e.g. of the plugins being built). Duplicates are ignored.
    ///
    /// Consumes the registry: call this before sharing it.
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for namespace in namespaces {
            let namespace = namespace.into();
            if !is_valid_namespace(&namespace) {
                return Err(RegistryError::shape(format!(
                    "plugin namespace '{namespace}' may only contain letters, digits, '-', '_' and '.'"
                )));
            }
            if !self.plugin_namespaces.contains(&namespace) {
                self.plugin_namespaces.push(namespace);
            }
        }
        Ok(self)
    }

    /// Target name for a source tool.
    ///
    /// `None` means the tool has no OpenCode equivalent and must be dropped.
    /// Unknown tools pass through unchanged.
    pub fn map_tool<'a>(&'a self, tool: &'a str) -> Option<&'a str> {
        match self.tool_mappings.get(tool) {
            Some(mapped) => mapped.as_deref(),
            None => Some(tool),
        }
    }

    /// Target directory name for a source directory (`agents` → `agent`).
    pub fn map_directory<'a>(&'a self, dir: &'a str) -> &'a str {
        self.directory_mappings
            .get(dir)
            .map(String::as_str)
            .unwrap_or(dir)
    }

    /// Target metadata field name for a source field.
    pub fn map_metadata_field<'a>(&'a self, field: &'a str) -> &'a str {
        self.metadata_mappings
            .get(field)
            .map(String::as_str)
            .unwrap_or(field)
    }

    /// Placeholder value for a semantic tool.
    ///
    /// Falls back to the built-in value when an override maps it to null.
    pub fn semantic(&self, tool: SemanticTool) -> &str {
        self.tool_mappings
            .get(tool.source_name())
            .and_then(|v| v.as_deref())
            .unwrap_or(tool.default_target())
    }

    /// Short-form skill invocation, e.g. `skills_maestro`.
    pub fn skill_invocation(&self, skill_name: &str) -> String {
        self.semantic(SemanticTool::Skill)
            .replace(SKILL_NAME_PLACEHOLDER, skill_name)
    }

    /// Plugin namespaces recognised in sub-command references.
    pub fn namespaces(&self) -> &[String] {
        &self.plugin_namespaces
    }

    pub fn directory_mappings(&self) -> &IndexMap<String, String> {
        &self.directory_mappings
    }

    pub fn tool_mappings(&self) -> &IndexMap<String, Option<String>> {
        &self.tool_mappings
    }

    pub fn metadata_mappings(&self) -> &IndexMap<String, String> {
        &self.metadata_mappings
    }

    /// Generated-tree layout implied by the directory mappings.
    pub fn artifact_layout(&self) -> ArtifactLayout {
        ArtifactLayout {
            command_dir: self.map_directory("commands").to_string(),
            agent_dir: self.map_directory("agents").to_string(),
            skills_dir: self.map_directory("skills").to_string(),
        }
    }
}

fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty()
        && namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn describe_key(key: &Value) -> String {
    match key.as_str() {
        Some(s) => format!("'{s}'"),
        None => format!("{key:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_cover_known_tools() {
        let registry = PlatformRegistry::default();
        assert_eq!(registry.map_tool("Read"), Some("read_file"));
        assert_eq!(registry.map_tool("Bash"), Some("bash_run"));
        assert_eq!(registry.map_tool("ExitPlanMode"), None);
        assert_eq!(registry.map_tool("EnterPlanMode"), None);
        assert_eq!(registry.map_tool("FutureTool"), Some("FutureTool"));
        assert_eq!(registry.tool_mappings().len(), 18);
    }

    #[test]
    fn defaults_cover_directories_and_semantics() {
        let registry = PlatformRegistry::default();
        assert_eq!(registry.map_directory("agents"), "agent");
        assert_eq!(registry.map_directory("commands"), "command");
        assert_eq!(registry.map_directory("skills"), "skills");
        assert_eq!(registry.semantic(SemanticTool::Task), "@mention");
        assert_eq!(registry.semantic(SemanticTool::SlashCommand), "command_invoke");
        assert_eq!(registry.skill_invocation("maestro"), "skills_maestro");
        assert_eq!(registry.map_metadata_field("argument-hint"), "argument-hint");
        assert_eq!(registry.namespaces(), &["rp1-base", "rp1-dev"]);
    }

    #[test]
    fn override_merges_per_key() {
        let registry = PlatformRegistry::from_yaml_str(
            "tool_mappings:\n  WebSearch: search_web\n  TodoWrite: null\n",
        )
        .unwrap();
        assert_eq!(registry.map_tool("WebSearch"), Some("search_web"));
        assert_eq!(registry.map_tool("TodoWrite"), None);
        // Untouched defaults survive.
        assert_eq!(registry.map_tool("Read"), Some("read_file"));
        assert_eq!(registry.map_directory("agents"), "agent");
    }

    #[test]
    fn empty_override_file_means_defaults() {
        let registry = PlatformRegistry::from_yaml_str("").unwrap();
        assert_eq!(registry, PlatformRegistry::default());
    }

    #[test]
    fn unknown_section_is_a_shape_error() {
        let err = PlatformRegistry::from_yaml_str("tool_mapping:\n  Read: x\n").unwrap_err();
        assert!(matches!(err, RegistryError::Shape { .. }));
        assert!(err.to_string().contains("tool_mapping"));
    }

    #[test]
    fn wrong_section_type_is_a_shape_error() {
        let err = PlatformRegistry::from_yaml_str("tool_mappings: [Read]\n").unwrap_err();
        assert!(matches!(err, RegistryError::Shape { .. }));
    }

    #[test]
    fn skill_placeholder_is_required() {
        let err = PlatformRegistry::from_yaml_str("tool_mappings:\n  Skill: skills\n").unwrap_err();
        assert!(err.to_string().contains("{name}"));
    }

    #[test]
    fn invalid_namespace_is_rejected() {
        let err =
            PlatformRegistry::from_yaml_str("plugin_namespaces: [\"rp1 base\"]\n").unwrap_err();
        assert!(matches!(err, RegistryError::Shape { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = PlatformRegistry::from_yaml_str("tool_mappings: [unclosed\n").unwrap_err();
        assert!(matches!(err, RegistryError::Parse(_)));
    }

    #[test]
    fn semantic_falls_back_when_nulled() {
        let registry =
            PlatformRegistry::from_yaml_str("tool_mappings:\n  SlashCommand: null\n").unwrap();
        assert_eq!(registry.map_tool("SlashCommand"), None);
        assert_eq!(registry.semantic(SemanticTool::SlashCommand), "command_invoke");
    }

    #[test]
    fn with_namespaces_appends_unique() {
        let registry = PlatformRegistry::default()
            .with_namespaces(["rp1-base", "acme"])
            .unwrap();
        assert_eq!(registry.namespaces(), &["rp1-base", "rp1-dev", "acme"]);
    }

    #[test]
    fn load_requires_existing_file_but_load_or_default_does_not() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("platform_registry.yaml");

        assert!(matches!(
            PlatformRegistry::load(&path),
            Err(RegistryError::NotFound { .. })
        ));
        assert_eq!(
            PlatformRegistry::load_or_default(&path).unwrap(),
            PlatformRegistry::default()
        );

        fs::write(&path, "directory_mappings:\n  agents: agents\n").unwrap();
        let registry = PlatformRegistry::load_or_default(&path).unwrap();
        assert_eq!(registry.artifact_layout().agent_dir, "agents");
    }
}
