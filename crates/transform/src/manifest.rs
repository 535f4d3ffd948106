//! Per-plugin `manifest.json` describing a build's output.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// File name of the manifest inside a plugin output directory.
pub const MANIFEST_FILE: &str = "manifest.json";
/// OpenCode release line the generated artifacts were checked against.
pub const OPENCODE_VERSION_TESTED: &str = "0.9.x";
/// Minimum OpenCode version able to load the generated artifacts.
pub const MIN_OPENCODE_VERSION: &str = ">=0.8.0";

/// Names of the artifacts a build generated, by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestArtifacts {
    pub commands: Vec<String>,
    pub agents: Vec<String>,
    pub skills: Vec<String>,
}

/// Where the installer puts each artifact kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationPaths {
    pub commands_dir: String,
    pub agents_dir: String,
    pub skills_dir: String,
}

impl Default for InstallationPaths {
    fn default() -> Self {
        Self {
            commands_dir: "~/.config/opencode/command/".to_string(),
            agents_dir: "~/.config/opencode/agent/".to_string(),
            skills_dir: "~/.config/opencode/skills/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    pub opencode_version: String,
    pub opencode_skills_required: bool,
}

/// Machine-readable description of one plugin's build output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub plugin: String,
    pub version: String,
    pub generated_at: String,
    pub opencode_version_tested: String,
    pub artifacts: ManifestArtifacts,
    pub installation: InstallationPaths,
    pub requirements: Requirements,
}

impl Manifest {
    /// Build a manifest stamped with the current UTC time.
    pub fn new(plugin: &str, version: &str, artifacts: ManifestArtifacts) -> Self {
        let skills_required = !artifacts.skills.is_empty();
        Self {
            plugin: plugin.to_string(),
            version: version.to_string(),
            generated_at: now_rfc3339(),
            opencode_version_tested: OPENCODE_VERSION_TESTED.to_string(),
            artifacts,
            installation: InstallationPaths::default(),
            requirements: Requirements {
                opencode_version: MIN_OPENCODE_VERSION.to_string(),
                opencode_skills_required: skills_required,
            },
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

/// Render the manifest text for a plugin build.
pub fn generate_manifest(
    plugin: &str,
    version: &str,
    commands: Vec<String>,
    agents: Vec<String>,
    skills: Vec<String>,
) -> serde_json::Result<String> {
    Manifest::new(
        plugin,
        version,
        ManifestArtifacts {
            commands,
            agents,
            skills,
        },
    )
    .to_json()
}
