use anyhow::{bail, Result};
use serde_json::json;
use std::path::PathBuf;

use plugbridge_transform::{build, BuildOptions, PluginSelection};

use crate::config::Config;

/// Handle the `build` command.
pub(crate) fn handle_build_command(
    config: &Config,
    plugin: String,
    output_dir: Option<PathBuf>,
    source_root: Option<PathBuf>,
    registry: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let paths = config.build_paths(source_root, output_dir, registry)?;
    let mut options = BuildOptions::new(paths.source_root, paths.output_dir);
    options.plugins = PluginSelection::from_arg(&plugin);
    options.registry_path = paths.registry;

    let report = match build(&options) {
        Ok(report) => report,
        Err(err) => {
            if json {
                let failed = json!({
                    "status": "failed",
                    "commands": 0,
                    "agents": 0,
                    "skills": 0,
                    "errors": [format!("{err:#}")],
                });
                println!("{}", serde_json::to_string_pretty(&failed)?);
            }
            return Err(err);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        print!("{}", report.format_summary());
        if report.is_success() {
            println!("Output written to {}", options.output_dir.display());
        }
    }

    if !report.is_success() {
        bail!("{} artifact(s) failed to build", report.failure_count());
    }
    Ok(())
}
