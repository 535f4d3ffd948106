use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface for the `plugbridge` application.
#[derive(Debug, Parser)]
#[command(
    name = "plugbridge",
    version,
    about = "Convert Claude Code plugins into OpenCode commands, agents and skills"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available `plugbridge` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Converts plugin sources into OpenCode artifacts.
    Build {
        /// Plugin directory name to build, or `all`.
        #[arg(long, value_name = "NAME", default_value = "all")]
        plugin: String,
        /// Output directory for generated artifacts (default: `dist/opencode`).
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Directory containing `plugins/` (default: current directory).
        #[arg(long, value_name = "DIR")]
        source_root: Option<PathBuf>,
        /// Platform registry override file (YAML).
        #[arg(long, value_name = "FILE")]
        registry: Option<PathBuf>,
        /// Prints the build result as JSON on stdout.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Validates generated artifacts (syntax and schema).
    Validate {
        /// Directory holding build output (default: the build output directory).
        #[arg(long, value_name = "DIR")]
        artifacts_dir: Option<PathBuf>,
    },
    /// Removes the build output directory.
    Clean {
        /// Output directory to remove (default: the build output directory).
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Skips the confirmation prompt.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Installs built artifacts into the OpenCode configuration directory.
    Install {
        /// Directory holding build output (default: the build output directory).
        #[arg(long, value_name = "DIR")]
        artifacts_dir: Option<PathBuf>,
        /// OpenCode configuration directory (default: `~/.config/opencode`).
        #[arg(long, value_name = "DIR", env = "PLUGBRIDGE_OPENCODE_DIR")]
        target_dir: Option<PathBuf>,
        /// Directory receiving backups of the previous installation.
        #[arg(long, value_name = "DIR", env = "PLUGBRIDGE_BACKUP_DIR")]
        backup_dir: Option<PathBuf>,
        /// Does not install skills.
        #[arg(long, default_value_t = false)]
        skip_skills: bool,
        /// Shows what would be installed without writing anything.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Checks an installation against the build manifests.
    Verify {
        /// Directory holding build output (default: the build output directory).
        #[arg(long, value_name = "DIR")]
        artifacts_dir: Option<PathBuf>,
        /// OpenCode configuration directory (default: `~/.config/opencode`).
        #[arg(long, value_name = "DIR", env = "PLUGBRIDGE_OPENCODE_DIR")]
        target_dir: Option<PathBuf>,
    },
}
