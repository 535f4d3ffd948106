use anyhow::Result;
use std::path::{Path, PathBuf};

use plugbridge_install::{discover_plugins, install, verify_installation, InstallOptions};

use crate::config::Config;

/// Handle the `install` command.
pub(crate) fn handle_install_command(
    config: &Config,
    artifacts_dir: Option<PathBuf>,
    target_dir: Option<PathBuf>,
    backup_dir: Option<PathBuf>,
    skip_skills: bool,
    dry_run: bool,
) -> Result<()> {
    let artifacts = config.output_dir(artifacts_dir)?;
    let paths = config.install_paths(target_dir, backup_dir)?;
    let plugins = discover_plugins(&artifacts)?;

    let options = InstallOptions {
        target_dir: paths.target_dir,
        backup_root: paths.backup_dir,
        skip_skills,
        dry_run,
    };
    let outcome = install(&plugins, &options)?;

    if dry_run {
        println!(
            "Dry run: would install {} files into {}",
            outcome.report.files_copied,
            options.target_dir.display()
        );
        for path in &outcome.report.installed_paths {
            println!("  {}", relative_to(path, &options.target_dir).display());
        }
        return Ok(());
    }

    if let Some(backup) = &outcome.backup_path {
        println!("Backed up existing installation to {}", backup.display());
    }
    for (plugin, files) in &outcome.plugins {
        println!("  {plugin}: {files} files");
    }
    println!(
        "Installed {} files into {} ({} overwritten, {} unchanged)",
        outcome.report.files_copied,
        options.target_dir.display(),
        outcome.report.overwritten,
        outcome.report.unchanged
    );
    if skip_skills {
        println!("Skills were skipped (--skip-skills).");
    }

    let report = verify_installation(&options.target_dir, Some(&artifacts))?;
    println!("\nVerification:");
    print!("{}", report.format_summary());
    if !report.is_healthy() {
        eprintln!("Warning: verification reported problems; run `plugbridge verify` for details.");
    }
    Ok(())
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planned_paths_are_shown_relative_to_target() {
        let base = Path::new("/home/u/.config/opencode");
        assert_eq!(
            relative_to(&base.join("command/rp1-base/build.md"), base),
            PathBuf::from("command/rp1-base/build.md")
        );
    }
}
