//! Claude Code → OpenCode conversion.
//!
//! The pipeline for each plugin is parse → transform → generate → write:
//!
//! - [`registry`] holds the tool, directory and metadata mappings between
//!   the two platforms, with optional YAML overrides.
//! - [`engine`] turns parsed source records into target records. It is pure
//!   and safe to run in parallel against one shared registry.
//! - [`generator`] renders target records to file text; [`manifest`]
//!   describes the build output.
//! - [`orchestrator`] drives a build and collects a [`BuildReport`].
//!
//! # Examples
//!
//! ```
//! use plugbridge_discovery::parse_agent_str;
//! use plugbridge_transform::{generate_agent, transform_agent, PlatformRegistry};
//! use plugbridge_validate::{validate_artifact, ArtifactKind, ArtifactLayout};
//! use std::path::Path;
//!
//! let source = parse_agent_str(
//!     Path::new("helper.md"),
//!     "---\nname: helper\ndescription: Helps\ntools: Read, Bash\n---\nRun /rp1-base:review first.",
//! )
//! .unwrap();
//! let registry = PlatformRegistry::default();
//! let agent = transform_agent(&source, &registry).unwrap();
//! assert_eq!(agent.tools(), &["read_file", "bash_run"]);
//! assert_eq!(agent.content(), "Run command_invoke(\"rp1-base:review\") first.");
//!
//! let file = generate_agent(&agent, "rp1-base", &ArtifactLayout::default()).unwrap();
//! assert!(validate_artifact(ArtifactKind::Agent, &file.content).is_ok());
//! ```

#![deny(unsafe_code)]

/// Error type for build-level operations.
pub type Error = anyhow::Error;
/// Result type for build-level operations.
pub type Result<T> = std::result::Result<T, Error>;

pub mod engine;
pub mod error;
pub mod fence;
pub mod generator;
pub mod manifest;
pub mod models;
pub mod orchestrator;
pub mod registry;
pub mod report;

pub use engine::{
    derive_permissions, rewrite_namespaces, rewrite_skill_invocations, rewrite_slash_commands,
    transform_agent, transform_command, transform_skill, translate_tools,
};
pub use error::{GenerationError, RegistryError, TransformError};
pub use fence::{is_in_code_block, replace_outside_fences};
pub use generator::{
    generate_agent, generate_command, generate_skill, is_safe_file_name, GeneratedArtifact,
    GeneratedSkill,
};
pub use manifest::{generate_manifest, Manifest, ManifestArtifacts, MANIFEST_FILE};
pub use models::{Permissions, TargetAgent, TargetCommand, TargetSkill};
pub use orchestrator::{
    build, build_plugin, load_registry, BuildOptions, PluginSelection, DEFAULT_OUTPUT_DIR,
};
pub use registry::{PlatformRegistry, SemanticTool, DEFAULT_REGISTRY_PATH};
pub use report::{ArtifactFailure, BuildReport, FailureStage, PluginBuildReport};
