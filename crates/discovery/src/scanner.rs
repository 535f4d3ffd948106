use anyhow::{bail, Context};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use plugbridge_validate::SKILL_FILE;

use crate::Result;

/// Source directory names within a plugin.
pub const COMMANDS_DIR: &str = "commands";
pub const AGENTS_DIR: &str = "agents";
pub const SKILLS_DIR: &str = "skills";

/// Version used when `plugin.json` does not carry one.
pub const DEFAULT_PLUGIN_VERSION: &str = "1.0.0";

/// Contents of `.claude-plugin/plugin.json` that matter for conversion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginMetadata {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// A plugin source directory and the artifact paths found in it.
#[derive(Debug, Clone)]
pub struct PluginSource {
    /// Directory name under `plugins/` (e.g. `base`).
    pub dir_name: String,
    pub root: PathBuf,
    /// Namespace used for generated subdirectories (e.g. `rp1-base`).
    pub namespace: String,
    pub version: String,
    /// `commands/*.md`, sorted.
    pub commands: Vec<PathBuf>,
    /// `agents/*.md`, sorted.
    pub agents: Vec<PathBuf>,
    /// `skills/*/` directories containing `SKILL.md`, sorted.
    pub skills: Vec<PathBuf>,
}

impl PluginSource {
    pub fn artifact_count(&self) -> usize {
        self.commands.len() + self.agents.len() + self.skills.len()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
        .map(DirEntry::into_path)
        .collect()
}

fn skill_dirs(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && e.path().join(SKILL_FILE).is_file())
        .map(DirEntry::into_path)
        .collect()
}

/// Read `.claude-plugin/plugin.json`; a missing file yields empty metadata.
pub fn load_plugin_metadata(plugin_dir: &Path) -> Result<PluginMetadata> {
    let path = plugin_dir.join(".claude-plugin").join("plugin.json");
    if !path.is_file() {
        return Ok(PluginMetadata::default());
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid plugin.json at {}", path.display()))
}

/// Scan one plugin directory.
pub fn scan_plugin(plugin_dir: &Path) -> Result<PluginSource> {
    if !plugin_dir.is_dir() {
        bail!("plugin directory not found: {}", plugin_dir.display());
    }
    let dir_name = plugin_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("plugin directory has no name: {}", plugin_dir.display()))?;

    let metadata = load_plugin_metadata(plugin_dir)?;
    let namespace = metadata
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("rp1-{dir_name}"));
    let version = metadata
        .version
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PLUGIN_VERSION.to_string());

    let source = PluginSource {
        commands: markdown_files(&plugin_dir.join(COMMANDS_DIR)),
        agents: markdown_files(&plugin_dir.join(AGENTS_DIR)),
        skills: skill_dirs(&plugin_dir.join(SKILLS_DIR)),
        root: plugin_dir.to_path_buf(),
        dir_name,
        namespace,
        version,
    };
    debug!(
        plugin = %source.dir_name,
        namespace = %source.namespace,
        commands = source.commands.len(),
        agents = source.agents.len(),
        skills = source.skills.len(),
        "scanned plugin"
    );
    Ok(source)
}

/// Directory holding all plugins under a source root.
pub fn plugins_root(source_root: &Path) -> PathBuf {
    source_root.join("plugins")
}

/// Names of plugin directories under `<source_root>/plugins`, sorted.
pub fn list_plugins(source_root: &Path) -> Result<Vec<String>> {
    let root = plugins_root(source_root);
    if !root.is_dir() {
        bail!("no plugins directory at {}", root.display());
    }
    let mut names = Vec::new();
    for entry in WalkDir::new(&root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry.with_context(|| format!("failed to list {}", root.display()))?;
        if entry.file_type().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scan_missing_dirs_yields_empty_lists() {
        let tmp = tempdir().unwrap();
        let plugin = tmp.path().join("dev");
        fs::create_dir_all(&plugin).unwrap();

        let source = scan_plugin(&plugin).unwrap();
        assert_eq!(source.namespace, "rp1-dev");
        assert_eq!(source.version, DEFAULT_PLUGIN_VERSION);
        assert_eq!(source.artifact_count(), 0);
    }

    #[test]
    fn scan_ignores_hidden_and_non_markdown() {
        let tmp = tempdir().unwrap();
        let commands = tmp.path().join("base/commands");
        fs::create_dir_all(&commands).unwrap();
        fs::write(commands.join("b.md"), "").unwrap();
        fs::write(commands.join("a.md"), "").unwrap();
        fs::write(commands.join(".hidden.md"), "").unwrap();
        fs::write(commands.join("notes.txt"), "").unwrap();

        let source = scan_plugin(&tmp.path().join("base")).unwrap();
        let names: Vec<_> = source
            .commands
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }

    #[test]
    fn skills_require_entry_point() {
        let tmp = tempdir().unwrap();
        let skills = tmp.path().join("base/skills");
        fs::create_dir_all(skills.join("real")).unwrap();
        fs::create_dir_all(skills.join("empty")).unwrap();
        fs::write(skills.join("real").join(SKILL_FILE), "").unwrap();

        let source = scan_plugin(&tmp.path().join("base")).unwrap();
        assert_eq!(source.skills, vec![skills.join("real")]);
    }

    #[test]
    fn invalid_plugin_json_is_an_error() {
        let tmp = tempdir().unwrap();
        let meta = tmp.path().join("base/.claude-plugin");
        fs::create_dir_all(&meta).unwrap();
        fs::write(meta.join("plugin.json"), "{not json").unwrap();

        let err = scan_plugin(&tmp.path().join("base")).unwrap_err();
        assert!(err.to_string().contains("invalid plugin.json"));
    }
}
