//! Build reporting: what was generated and what failed.

use serde::Serialize;
use serde_json::{json, Value};

use plugbridge_validate::ArtifactKind;

/// Failures listed in a text summary before the overflow line.
pub const SUMMARY_FAILURE_LIMIT: usize = 5;

/// Pipeline stage at which an artifact failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Parse,
    Transform,
    Generate,
    Write,
}

impl FailureStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Transform => "transform",
            Self::Generate => "generate",
            Self::Write => "write",
        }
    }
}

/// One artifact that did not make it into the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactFailure {
    pub kind: ArtifactKind,
    pub name: String,
    pub stage: FailureStage,
    pub reason: String,
}

impl ArtifactFailure {
    pub fn new(
        kind: ArtifactKind,
        name: impl Into<String>,
        stage: FailureStage,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            stage,
            reason: reason.into(),
        }
    }

    /// Returns a human-readable description of the failure.
    pub fn description(&self) -> String {
        format!(
            "{} '{}' ({} failed): {}",
            self.kind,
            self.name,
            self.stage.as_str(),
            self.reason
        )
    }
}

/// Outcome of building one plugin.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PluginBuildReport {
    /// Directory name under `plugins/`.
    pub plugin: String,
    pub namespace: String,
    /// Names of generated artifacts, in source order.
    pub commands: Vec<String>,
    pub agents: Vec<String>,
    pub skills: Vec<String>,
    pub failures: Vec<ArtifactFailure>,
}

impl PluginBuildReport {
    pub fn new(plugin: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn generated(&self) -> usize {
        self.commands.len() + self.agents.len() + self.skills.len()
    }

    pub fn record(&mut self, kind: ArtifactKind, name: String) {
        match kind {
            ArtifactKind::Command => self.commands.push(name),
            ArtifactKind::Agent => self.agents.push(name),
            ArtifactKind::Skill => self.skills.push(name),
        }
    }
}

/// Aggregate report for a whole build run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub plugins: Vec<PluginBuildReport>,
}

impl BuildReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, plugin: PluginBuildReport) {
        self.plugins.push(plugin);
    }

    /// Generated artifacts of one kind across all plugins.
    pub fn total(&self, kind: ArtifactKind) -> usize {
        self.plugins
            .iter()
            .map(|p| match kind {
                ArtifactKind::Command => p.commands.len(),
                ArtifactKind::Agent => p.agents.len(),
                ArtifactKind::Skill => p.skills.len(),
            })
            .sum()
    }

    pub fn total_generated(&self) -> usize {
        self.plugins.iter().map(PluginBuildReport::generated).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ArtifactFailure> {
        self.plugins.iter().flat_map(|p| p.failures.iter())
    }

    pub fn failure_count(&self) -> usize {
        self.plugins.iter().map(|p| p.failures.len()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }

    /// Generates a formatted summary for display.
    pub fn format_summary(&self) -> String {
        let mut out = String::new();
        for plugin in &self.plugins {
            out.push_str(&format!(
                "{} ({}): {} commands, {} agents, {} skills, {} failed\n",
                plugin.plugin,
                plugin.namespace,
                plugin.commands.len(),
                plugin.agents.len(),
                plugin.skills.len(),
                plugin.failures.len()
            ));
        }
        let failed = self.failure_count();
        out.push_str(&format!(
            "Build complete: {} processed, {} failed\n",
            self.total_generated() + failed,
            failed
        ));
        if failed > 0 {
            out.push_str("Errors:\n");
            for failure in self.failures().take(SUMMARY_FAILURE_LIMIT) {
                out.push_str(&format!("  - {}\n", failure.description()));
            }
            if failed > SUMMARY_FAILURE_LIMIT {
                out.push_str(&format!(
                    "  ... and {} more\n",
                    failed - SUMMARY_FAILURE_LIMIT
                ));
            }
        }
        out
    }

    /// Machine-readable outcome for `build --json`.
    pub fn to_json(&self) -> Value {
        let errors: Vec<String> = self.failures().map(ArtifactFailure::description).collect();
        json!({
            "status": if self.is_success() { "success" } else { "partial" },
            "commands": self.total(ArtifactKind::Command),
            "agents": self.total(ArtifactKind::Agent),
            "skills": self.total(ArtifactKind::Skill),
            "errors": errors,
        })
    }
}
