//! Post-install health checks.

use anyhow::bail;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use plugbridge_validate::{validate_artifact, ArtifactKind, ArtifactLayout, SKILL_FILE};

use crate::manifest::discover_plugins;
use crate::Result;

/// Expected counts when no manifest is available.
pub const FALLBACK_COMMANDS: usize = 20;
pub const FALLBACK_AGENTS: usize = 17;
pub const FALLBACK_SKILLS: usize = 4;
/// Skills checked when no manifest is available.
pub const FALLBACK_SKILL_NAMES: [&str; 4] =
    ["maestro", "mermaid", "markdown-preview", "knowledge-base-templates"];

/// One problem found during verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationIssue {
    pub kind: ArtifactKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub commands_found: usize,
    pub commands_expected: usize,
    pub agents_found: usize,
    pub agents_expected: usize,
    pub skills_found: usize,
    pub skills_expected: usize,
    pub issues: Vec<VerificationIssue>,
}

impl VerificationReport {
    /// Healthy when commands and agents are complete and have no issues.
    ///
    /// Skills need the separate opencode-skills plugin, so skill issues are
    /// reported but never make an installation unhealthy.
    pub fn is_healthy(&self) -> bool {
        !self.issues.iter().any(|i| i.kind != ArtifactKind::Skill)
            && self.commands_found == self.commands_expected
            && self.agents_found == self.agents_expected
    }

    fn issue(&mut self, kind: ArtifactKind, message: String) {
        self.issues.push(VerificationIssue { kind, message });
    }

    /// Generates a formatted summary for display.
    pub fn format_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "  Commands: {}/{}\n",
            self.commands_found, self.commands_expected
        ));
        out.push_str(&format!(
            "  Agents:   {}/{}\n",
            self.agents_found, self.agents_expected
        ));
        out.push_str(&format!(
            "  Skills:   {}/{}\n",
            self.skills_found, self.skills_expected
        ));
        for issue in &self.issues {
            out.push_str(&format!("  - {}\n", issue.message));
        }
        out
    }
}

#[derive(Default)]
struct Expected {
    /// Every manifest entry; the same name in two plugins is two files.
    commands: Vec<String>,
    agents: Vec<String>,
    /// Skills share one directory, so names are deduplicated.
    skills: BTreeSet<String>,
    /// Namespace subdirectories owned by the discovered manifests.
    namespaces: BTreeSet<String>,
}

fn expected_from(artifacts_dir: Option<&Path>) -> Expected {
    let mut expected = Expected::default();
    let Some(dir) = artifacts_dir.filter(|d| d.is_dir()) else {
        return expected;
    };
    match discover_plugins(dir) {
        Ok(plugins) => {
            for plugin in plugins {
                expected.namespaces.insert(plugin.manifest.plugin);
                let artifacts = plugin.manifest.artifacts;
                expected.commands.extend(artifacts.commands);
                expected.agents.extend(artifacts.agents);
                expected.skills.extend(artifacts.skills);
            }
        }
        Err(err) => debug!(error = %err, "no manifests; using fallback expectations"),
    }
    expected
}

fn installed_markdown(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|e| e == "md"))
        .collect()
}

/// Keep files sitting directly in one of `namespaces` under `root`. Files
/// from other sources share the directory and are not ours to count.
fn in_namespaces(files: Vec<PathBuf>, root: &Path, namespaces: &BTreeSet<String>) -> Vec<PathBuf> {
    if namespaces.is_empty() {
        return files;
    }
    files
        .into_iter()
        .filter(|file| {
            let Ok(relative) = file.strip_prefix(root) else {
                return false;
            };
            let parts: Vec<_> = relative.components().collect();
            parts.len() == 2
                && namespaces.contains(&*parts[0].as_os_str().to_string_lossy())
        })
        .collect()
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Run L1 and L2 validation on one installed file.
pub fn check_file_health(kind: ArtifactKind, path: &Path) -> Option<String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    match fs::read_to_string(path) {
        Ok(content) => validate_artifact(kind, &content)
            .err()
            .map(|err| format!("{name}: {err}")),
        Err(err) => Some(format!("Cannot read {name}: {err}")),
    }
}

fn check_named(
    report: &mut VerificationReport,
    kind: ArtifactKind,
    files: &[PathBuf],
    expected: &[String],
    fallback: usize,
) -> usize {
    let label = kind.plural();
    if expected.is_empty() {
        if files.len() < fallback {
            report.issue(
                kind,
                format!(
                    "Missing {label}: found {}, expected {fallback}. Re-run installation to fix.",
                    files.len()
                ),
            );
        }
        return fallback;
    }
    let installed: BTreeSet<String> = files.iter().map(|p| stem(p)).collect();
    let wanted: BTreeSet<&String> = expected.iter().collect();
    let missing: Vec<&str> = wanted
        .into_iter()
        .filter(|name| !installed.contains(*name))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        report.issue(
            kind,
            format!(
                "Missing {label} ({}): {}. Re-run installation to fix.",
                missing.len(),
                missing.join(", ")
            ),
        );
    }
    expected.len()
}

/// Check an OpenCode directory against the manifests in `artifacts_dir`
/// (or fixed fallback expectations when there are none).
pub fn verify_installation(
    target_dir: &Path,
    artifacts_dir: Option<&Path>,
) -> Result<VerificationReport> {
    if !target_dir.is_dir() {
        bail!(
            "OpenCode configuration directory not found: {}. Please install OpenCode first.",
            target_dir.display()
        );
    }
    let layout = ArtifactLayout::default();
    let expected = expected_from(artifacts_dir);
    let mut report = VerificationReport::default();

    for (kind, dir, names, fallback) in [
        (
            ArtifactKind::Command,
            &layout.command_dir,
            &expected.commands,
            FALLBACK_COMMANDS,
        ),
        (
            ArtifactKind::Agent,
            &layout.agent_dir,
            &expected.agents,
            FALLBACK_AGENTS,
        ),
    ] {
        let root = target_dir.join(dir);
        let files = in_namespaces(installed_markdown(&root), &root, &expected.namespaces);
        let expected_count = check_named(&mut report, kind, &files, names, fallback);
        for file in &files {
            if let Some(problem) = check_file_health(kind, file) {
                report.issue(kind, problem);
            }
        }
        match kind {
            ArtifactKind::Command => {
                report.commands_found = files.len();
                report.commands_expected = expected_count;
            }
            _ => {
                report.agents_found = files.len();
                report.agents_expected = expected_count;
            }
        }
    }

    let skill_names: Vec<String> = if expected.skills.is_empty() {
        FALLBACK_SKILL_NAMES.iter().map(|s| s.to_string()).collect()
    } else {
        expected.skills.iter().cloned().collect()
    };
    report.skills_expected = if expected.skills.is_empty() {
        FALLBACK_SKILLS
    } else {
        expected.skills.len()
    };
    let skills_dir = target_dir.join(&layout.skills_dir);
    let mut missing = Vec::new();
    for name in &skill_names {
        let entry = skills_dir.join(name).join(SKILL_FILE);
        if entry.is_file() {
            report.skills_found += 1;
            if let Some(problem) = check_file_health(ArtifactKind::Skill, &entry) {
                report.issue(ArtifactKind::Skill, format!("{name}/{problem}"));
            }
        } else {
            missing.push(name.as_str());
        }
    }
    if !missing.is_empty() {
        missing.sort_unstable();
        let message = format!(
            "Missing skills ({}): {}. Note: Skills require opencode-skills plugin. Re-run installation to fix.",
            missing.len(),
            missing.join(", ")
        );
        report.issue(ArtifactKind::Skill, message);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(kind: ArtifactKind) -> VerificationIssue {
        VerificationIssue {
            kind,
            message: "x".into(),
        }
    }

    #[test]
    fn skill_issues_do_not_affect_health() {
        let mut report = VerificationReport {
            commands_found: 2,
            commands_expected: 2,
            agents_found: 1,
            agents_expected: 1,
            ..Default::default()
        };
        report.issues.push(issue(ArtifactKind::Skill));
        assert!(report.is_healthy());

        report.issues.push(issue(ArtifactKind::Agent));
        assert!(!report.is_healthy());
    }

    #[test]
    fn count_mismatch_is_unhealthy() {
        let report = VerificationReport {
            commands_found: 1,
            commands_expected: 2,
            ..Default::default()
        };
        assert!(!report.is_healthy());
    }

    #[test]
    fn namespace_filter_keeps_direct_children_only() {
        let root = Path::new("/oc/command");
        let files = vec![
            root.join("rp1-base/build.md"),
            root.join("rp1-base/nested/deep.md"),
            root.join("mine/notes.md"),
            root.join("loose.md"),
        ];
        let namespaces = BTreeSet::from(["rp1-base".to_string()]);

        let kept = in_namespaces(files.clone(), root, &namespaces);
        assert_eq!(kept, vec![root.join("rp1-base/build.md")]);
        assert_eq!(in_namespaces(files.clone(), root, &BTreeSet::new()), files);
    }

    #[test]
    fn missing_target_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = verify_installation(&temp.path().join("none"), None).unwrap_err();
        assert!(err.to_string().contains("Please install OpenCode first"));
    }
}
