//! Command-line application for plugbridge.
//!
//! [`run`] initialises logging, loads the optional configuration file and
//! dispatches to the subcommand handlers. Logs go to stderr (filtered by
//! `RUST_LOG`) so that `build --json` keeps stdout machine-readable.
//!
//! Any error returned from [`run`] makes the binary exit with status 1.

#![deny(unsafe_code)]

pub mod cli;
mod commands;
pub mod config;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::{
    handle_build_command, handle_clean_command, handle_install_command, handle_validate_command,
    handle_verify_command,
};

/// The main entry point for the `plugbridge` application.
pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config()?.unwrap_or_default();

    match cli.command {
        Commands::Build {
            plugin,
            output_dir,
            source_root,
            registry,
            json,
        } => handle_build_command(&config, plugin, output_dir, source_root, registry, json),
        Commands::Validate { artifacts_dir } => handle_validate_command(&config, artifacts_dir),
        Commands::Clean { output_dir, force } => handle_clean_command(&config, output_dir, force),
        Commands::Install {
            artifacts_dir,
            target_dir,
            backup_dir,
            skip_skills,
            dry_run,
        } => handle_install_command(
            &config,
            artifacts_dir,
            target_dir,
            backup_dir,
            skip_skills,
            dry_run,
        ),
        Commands::Verify {
            artifacts_dir,
            target_dir,
        } => handle_verify_command(&config, artifacts_dir, target_dir),
    }
}
