//! Copying built plugins into an OpenCode configuration directory.

use anyhow::{bail, Context};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use plugbridge_validate::ArtifactLayout;

use crate::backup::{backup_existing, restore_backup};
use crate::manifest::BuiltPlugin;
use crate::Result;

/// Mode for installed files.
pub const FILE_MODE: u32 = 0o644;
/// Mode for installed directories.
pub const DIR_MODE: u32 = 0o755;

/// What one or more copy passes did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub files_copied: usize,
    /// Existing files replaced with different content.
    pub overwritten: usize,
    /// Existing files whose content already matched.
    pub unchanged: usize,
    /// Files and skill directories created or replaced by this run.
    pub installed_paths: Vec<PathBuf>,
}

impl InstallReport {
    fn merge(&mut self, other: InstallReport) {
        self.files_copied += other.files_copied;
        self.overwritten += other.overwritten;
        self.unchanged += other.unchanged;
        self.installed_paths.extend(other.installed_paths);
    }
}

#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// OpenCode configuration directory (e.g. `~/.config/opencode`).
    pub target_dir: PathBuf,
    pub backup_root: PathBuf,
    pub skip_skills: bool,
    pub dry_run: bool,
}

/// Result of [`install`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallOutcome {
    /// `None` for dry runs.
    pub backup_path: Option<PathBuf>,
    pub report: InstallReport,
    /// Per-plugin file counts, in install order.
    pub plugins: Vec<(String, usize)>,
}

/// Computes a SHA-256 hash of a file's content as lowercase hex.
pub fn file_hash(path: &Path) -> Result<String> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(format!("{:x}", Sha256::digest(&data)))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .permissions();
    perms.set_mode(mode);
    fs::set_permissions(path, perms)
        .with_context(|| format!("failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("failed to create {}", path.display()))?;
    set_mode(path, DIR_MODE)
}

/// Markdown files below `dir`, sorted.
fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == "md") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn copy_markdown_dir(
    from: &Path,
    to: &Path,
    label: &str,
    report: &mut InstallReport,
) -> Result<()> {
    for source in markdown_files(from)? {
        let relative = source
            .strip_prefix(from)
            .with_context(|| format!("{} is outside {}", source.display(), from.display()))?;
        let dest = to.join(relative);
        if dest.exists() {
            if file_hash(&dest)? == file_hash(&source)? {
                report.unchanged += 1;
                continue;
            }
            warn!(path = %format!("{label}/{}", relative.display()), "overwriting existing file");
            report.overwritten += 1;
        }
        if let Some(parent) = dest.parent() {
            ensure_dir(parent)?;
        }
        fs::copy(&source, &dest).with_context(|| {
            format!("failed to copy {} to {}", source.display(), dest.display())
        })?;
        set_mode(&dest, FILE_MODE)?;
        report.files_copied += 1;
        report.installed_paths.push(dest);
    }
    Ok(())
}

fn copy_skill_dir(from: &Path, to: &Path, report: &mut InstallReport) -> Result<()> {
    if to.exists() {
        warn!(skill = %to.display(), "replacing existing skill");
        fs::remove_dir_all(to).with_context(|| format!("failed to remove {}", to.display()))?;
        report.overwritten += 1;
    }
    // Record first so a partial copy is still rolled back.
    report.installed_paths.push(to.to_path_buf());
    ensure_dir(to)?;
    for entry in WalkDir::new(from).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", from.display()))?;
        let relative = entry.path().strip_prefix(from).with_context(|| {
            format!("{} is outside {}", entry.path().display(), from.display())
        })?;
        let dest = to.join(relative);
        if entry.file_type().is_dir() {
            ensure_dir(&dest)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &dest).with_context(|| {
                format!("failed to copy {} to {}", entry.path().display(), dest.display())
            })?;
            set_mode(&dest, FILE_MODE)?;
            report.files_copied += 1;
        }
    }
    Ok(())
}

fn copy_into(
    plugin_dir: &Path,
    target_dir: &Path,
    skip_skills: bool,
    report: &mut InstallReport,
) -> Result<()> {
    if !plugin_dir.is_dir() {
        bail!("Source directory not found: {}", plugin_dir.display());
    }
    let layout = ArtifactLayout::default();
    for dir in [&layout.command_dir, &layout.agent_dir] {
        copy_markdown_dir(&plugin_dir.join(dir), &target_dir.join(dir), dir, report)?;
    }
    if skip_skills {
        return Ok(());
    }
    let skills_src = plugin_dir.join(&layout.skills_dir);
    if !skills_src.is_dir() {
        return Ok(());
    }
    let skills_dst = target_dir.join(&layout.skills_dir);
    ensure_dir(&skills_dst)?;
    for entry in WalkDir::new(&skills_src)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("failed to list {}", skills_src.display()))?;
        if entry.file_type().is_dir() {
            copy_skill_dir(entry.path(), &skills_dst.join(entry.file_name()), report)?;
        }
    }
    Ok(())
}

/// Copy one built plugin's commands, agents and (unless skipped) skills into
/// `target_dir`, keeping namespace subdirectories.
pub fn copy_artifacts(
    plugin_dir: &Path,
    target_dir: &Path,
    skip_skills: bool,
) -> Result<InstallReport> {
    let mut report = InstallReport::default();
    copy_into(plugin_dir, target_dir, skip_skills, &mut report)?;
    Ok(report)
}

/// Target paths an install would write, without touching the filesystem.
pub fn plan_install(plugin_dir: &Path, target_dir: &Path, skip_skills: bool) -> Result<Vec<PathBuf>> {
    let layout = ArtifactLayout::default();
    let mut planned = Vec::new();
    for dir in [&layout.command_dir, &layout.agent_dir] {
        let from = plugin_dir.join(dir);
        for source in markdown_files(&from)? {
            if let Ok(relative) = source.strip_prefix(&from) {
                planned.push(target_dir.join(dir).join(relative));
            }
        }
    }
    if !skip_skills {
        let skills_src = plugin_dir.join(&layout.skills_dir);
        if skills_src.is_dir() {
            for entry in WalkDir::new(&skills_src)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_dir())
            {
                planned.push(target_dir.join(&layout.skills_dir).join(entry.file_name()));
            }
        }
    }
    Ok(planned)
}

fn remove_installed(paths: &[PathBuf]) {
    for path in paths.iter().rev() {
        let result = if path.is_dir() {
            fs::remove_dir_all(path)
        } else if path.exists() {
            fs::remove_file(path)
        } else {
            Ok(())
        };
        if let Err(err) = result {
            warn!(path = %path.display(), error = %err, "failed to remove during rollback");
        }
    }
}

/// Install built plugins.
///
/// The current installation is backed up first. If any copy fails, every
/// path installed by this run is removed and the backup is restored before
/// the error is returned.
pub fn install(plugins: &[BuiltPlugin], options: &InstallOptions) -> Result<InstallOutcome> {
    if options.dry_run {
        let mut outcome = InstallOutcome::default();
        for plugin in plugins {
            let planned = plan_install(&plugin.dir, &options.target_dir, options.skip_skills)?;
            outcome
                .plugins
                .push((plugin.manifest.plugin.clone(), planned.len()));
            outcome.report.files_copied += planned.len();
            outcome.report.installed_paths.extend(planned);
        }
        return Ok(outcome);
    }

    let skill_names: Vec<String> = plugins
        .iter()
        .flat_map(|p| p.manifest.artifacts.skills.iter().cloned())
        .collect();
    let backup_path = backup_existing(&options.target_dir, &options.backup_root, &skill_names)?;

    let mut outcome = InstallOutcome {
        backup_path: Some(backup_path.clone()),
        ..Default::default()
    };
    for plugin in plugins {
        let mut report = InstallReport::default();
        let copied = copy_into(&plugin.dir, &options.target_dir, options.skip_skills, &mut report);
        let files = report.files_copied;
        outcome.report.merge(report);
        if let Err(err) = copied {
            warn!(plugin = %plugin.manifest.plugin, error = %err, "install failed; rolling back");
            remove_installed(&outcome.report.installed_paths);
            restore_backup(&backup_path, &options.target_dir)
                .context("rollback failed to restore backup")?;
            return Err(err.context(format!(
                "failed to install {}; previous installation restored from {}",
                plugin.manifest.plugin,
                backup_path.display()
            )));
        }
        info!(plugin = %plugin.manifest.plugin, files, "installed plugin");
        outcome.plugins.push((plugin.manifest.plugin.clone(), files));
    }
    Ok(outcome)
}
