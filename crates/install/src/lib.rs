//! Installing generated OpenCode artifacts.
//!
//! An install backs up whatever is already in the OpenCode configuration
//! directory, copies each built plugin in, and rolls back to the backup if
//! any copy fails. [`verify_installation`] checks the result against the
//! build manifests.

#![deny(unsafe_code)]

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub mod backup;
pub mod installer;
pub mod manifest;
pub mod verifier;

pub use backup::{backup_existing, backup_timestamp, restore_backup, BackupRecord, BACKUP_RECORD_FILE};
pub use installer::{
    copy_artifacts, file_hash, install, plan_install, InstallOptions, InstallOutcome,
    InstallReport,
};
pub use manifest::{discover_plugins, load_manifest, BuiltPlugin, ManifestArtifacts, PluginManifest};
pub use verifier::{check_file_health, verify_installation, VerificationIssue, VerificationReport};
