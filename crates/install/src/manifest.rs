//! Loading build manifests from an artifacts directory.

use anyhow::{bail, Context};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use plugbridge_transform::MANIFEST_FILE;

use crate::Result;

const REQUIRED_FIELDS: [&str; 5] = [
    "plugin",
    "version",
    "generated_at",
    "opencode_version_tested",
    "artifacts",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ManifestArtifacts {
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// The parts of a plugin's `manifest.json` the installer relies on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginManifest {
    pub plugin: String,
    pub version: String,
    pub generated_at: String,
    pub opencode_version_tested: String,
    pub artifacts: ManifestArtifacts,
}

impl PluginManifest {
    pub fn total_artifacts(&self) -> usize {
        self.artifacts.commands.len() + self.artifacts.agents.len() + self.artifacts.skills.len()
    }
}

/// A built plugin ready for installation.
#[derive(Debug, Clone)]
pub struct BuiltPlugin {
    /// Plugin output directory (contains `manifest.json`).
    pub dir: PathBuf,
    pub manifest: PluginManifest,
}

/// Load and check one `manifest.json`.
pub fn load_manifest(path: &Path) -> Result<PluginManifest> {
    if !path.is_file() {
        bail!("Manifest not found: {}", path.display());
    }
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| value.get(field).is_none())
        .collect();
    if !missing.is_empty() {
        bail!(
            "Manifest missing required fields: {} ({})",
            missing.join(", "),
            path.display()
        );
    }
    if !value["artifacts"].is_object() {
        bail!("Manifest 'artifacts' must be an object ({})", path.display());
    }

    serde_json::from_value(value).with_context(|| format!("invalid manifest {}", path.display()))
}

/// Load every `<artifacts_dir>/<plugin>/manifest.json`, sorted by directory name.
pub fn discover_plugins(artifacts_dir: &Path) -> Result<Vec<BuiltPlugin>> {
    if !artifacts_dir.is_dir() {
        bail!("Artifacts directory not found: {}", artifacts_dir.display());
    }

    let mut plugins = Vec::new();
    for entry in WalkDir::new(artifacts_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry =
            entry.with_context(|| format!("failed to list {}", artifacts_dir.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let manifest_path = entry.path().join(MANIFEST_FILE);
        if manifest_path.is_file() {
            plugins.push(BuiltPlugin {
                dir: entry.path().to_path_buf(),
                manifest: load_manifest(&manifest_path)?,
            });
        }
    }

    if plugins.is_empty() {
        bail!("No plugin manifests found in {}", artifacts_dir.display());
    }
    Ok(plugins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_manifest(dir: &Path, plugin: &str, json: &str) {
        let plugin_dir = dir.join(plugin);
        fs::create_dir_all(&plugin_dir).unwrap();
        fs::write(plugin_dir.join(MANIFEST_FILE), json).unwrap();
    }

    #[test]
    fn loads_generated_manifest() {
        let temp = tempdir().unwrap();
        let json = plugbridge_transform::generate_manifest(
            "rp1-base",
            "2.1.0",
            vec!["build".into()],
            vec![],
            vec!["maestro".into()],
        )
        .unwrap();
        write_manifest(temp.path(), "base", &json);

        let manifest = load_manifest(&temp.path().join("base").join(MANIFEST_FILE)).unwrap();
        assert_eq!(manifest.plugin, "rp1-base");
        assert_eq!(manifest.artifacts.skills, vec!["maestro"]);
        assert_eq!(manifest.total_artifacts(), 2);
    }

    #[test]
    fn missing_fields_are_named() {
        let temp = tempdir().unwrap();
        write_manifest(temp.path(), "base", r#"{"plugin": "p", "version": "1"}"#);
        let err = load_manifest(&temp.path().join("base").join(MANIFEST_FILE)).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("generated_at, opencode_version_tested, artifacts"), "{msg}");
    }

    #[test]
    fn artifacts_must_be_object() {
        let temp = tempdir().unwrap();
        write_manifest(
            temp.path(),
            "base",
            r#"{"plugin": "p", "version": "1", "generated_at": "x",
                "opencode_version_tested": "0.9.x", "artifacts": []}"#,
        );
        let err = load_manifest(&temp.path().join("base").join(MANIFEST_FILE)).unwrap_err();
        assert!(err.to_string().contains("'artifacts' must be an object"));
    }

    #[test]
    fn discovery_requires_at_least_one_manifest() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("empty")).unwrap();
        let err = discover_plugins(temp.path()).unwrap_err();
        assert!(err.to_string().contains("No plugin manifests found"));
    }
}
