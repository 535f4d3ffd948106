use anyhow::{Context, Result};
use inquire::Confirm;
use std::path::PathBuf;

use crate::config::Config;

/// Handle the `clean` command.
pub(crate) fn handle_clean_command(
    config: &Config,
    output_dir: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let dir = config.output_dir(output_dir)?;
    if !dir.exists() {
        println!("Nothing to clean: {} does not exist", dir.display());
        return Ok(());
    }

    if !force {
        let confirmed = Confirm::new(&format!("Remove {}?", dir.display()))
            .with_default(false)
            .prompt()
            .context("Failed to get user confirmation")?;
        if !confirmed {
            println!("Clean cancelled.");
            return Ok(());
        }
    }

    std::fs::remove_dir_all(&dir)
        .with_context(|| format!("failed to remove {}", dir.display()))?;
    tracing::info!(path = %dir.display(), "removed build output");
    println!("Removed {}", dir.display());
    Ok(())
}
