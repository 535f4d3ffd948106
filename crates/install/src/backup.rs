//! Snapshot and restore of an existing OpenCode installation.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description;
use time::OffsetDateTime;
use tracing::{debug, info};
use walkdir::WalkDir;

use plugbridge_validate::ArtifactLayout;

use crate::Result;

/// Record written as `backup.json` inside every backup directory.
pub const BACKUP_RECORD_FILE: &str = "backup.json";

const TIMESTAMP_FORMAT: &str = "[year][month][day]_[hour][minute][second]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub timestamp: String,
    pub backup_path: PathBuf,
    pub files_backed_up: usize,
}

/// `YYYYMMDD_HHMMSS` in local time, UTC when the local offset is unknown.
pub fn backup_timestamp() -> Result<String> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let format = format_description::parse(TIMESTAMP_FORMAT)
        .context("invalid backup timestamp format")?;
    now.format(&format).context("failed to format backup timestamp")
}

fn unique_backup_dir(backup_root: &Path, timestamp: &str) -> PathBuf {
    let base = backup_root.join(format!("backup_{timestamp}"));
    if !base.exists() {
        return base;
    }
    (1..)
        .map(|n| backup_root.join(format!("backup_{timestamp}_{n}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}

/// Copy every file under `from` whose name ends in `suffix` (all files when
/// `None`) to the same relative path under `to`. Returns the count copied.
pub(crate) fn copy_tree(from: &Path, to: &Path, suffix: Option<&str>) -> Result<usize> {
    if !from.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", from.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if suffix.is_some_and(|s| !name.ends_with(s)) {
            continue;
        }
        let relative = entry.path().strip_prefix(from).with_context(|| {
            format!("{} is outside {}", entry.path().display(), from.display())
        })?;
        let dest = to.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::copy(entry.path(), &dest).with_context(|| {
            format!("failed to copy {} to {}", entry.path().display(), dest.display())
        })?;
        copied += 1;
    }
    Ok(copied)
}

/// Back up the commands, agents and named skills currently installed in
/// `target_dir` into a new `backup_<timestamp>` directory under `backup_root`.
///
/// With nothing installed the backup directory is still created, holding
/// only its record.
pub fn backup_existing(
    target_dir: &Path,
    backup_root: &Path,
    skill_names: &[String],
) -> Result<PathBuf> {
    let timestamp = backup_timestamp()?;
    let backup_path = unique_backup_dir(backup_root, &timestamp);
    fs::create_dir_all(&backup_path)
        .with_context(|| format!("failed to create {}", backup_path.display()))?;

    let layout = ArtifactLayout::default();
    let mut files = 0;
    if target_dir.is_dir() {
        for dir in [&layout.command_dir, &layout.agent_dir] {
            files += copy_tree(&target_dir.join(dir), &backup_path.join(dir), Some(".md"))?;
        }
        for skill in skill_names {
            let installed = target_dir.join(&layout.skills_dir).join(skill);
            files += copy_tree(
                &installed,
                &backup_path.join(&layout.skills_dir).join(skill),
                None,
            )?;
        }
    } else {
        debug!(target = %target_dir.display(), "no existing installation to back up");
    }

    let record = BackupRecord {
        timestamp,
        backup_path: backup_path.clone(),
        files_backed_up: files,
    };
    let record_path = backup_path.join(BACKUP_RECORD_FILE);
    let json = serde_json::to_string_pretty(&record).context("failed to render backup record")?;
    fs::write(&record_path, json)
        .with_context(|| format!("failed to write {}", record_path.display()))?;

    info!(path = %backup_path.display(), files, "created backup");
    Ok(backup_path)
}

/// Copy a backup's contents back over `target_dir`.
pub fn restore_backup(backup_path: &Path, target_dir: &Path) -> Result<usize> {
    let layout = ArtifactLayout::default();
    let mut restored = 0;
    for dir in [&layout.command_dir, &layout.agent_dir, &layout.skills_dir] {
        restored += copy_tree(&backup_path.join(dir), &target_dir.join(dir), None)?;
    }
    info!(backup = %backup_path.display(), restored, "restored backup");
    Ok(restored)
}
