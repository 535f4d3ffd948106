//! Reading Claude Code plugin sources.
//!
//! This crate provides:
//! - Typed source records for commands, agents and skills.
//! - A parser that validates every field once, at the boundary.
//! - Plugin directory scanning (`commands/`, `agents/`, `skills/`).
//!
//! # Examples
//!
//! ```
//! use plugbridge_discovery::parse_agent_str;
//! use std::path::Path;
//!
//! let text = "---\nname: helper\ndescription: Helps\ntools: Read, Bash\n---\nBody";
//! let agent = parse_agent_str(Path::new("helper.md"), text).unwrap();
//! assert_eq!(agent.tools, vec!["Read", "Bash"]);
//! assert_eq!(agent.model, "inherit");
//! ```

#![deny(unsafe_code)]

/// Error type for scanning operations.
pub type Error = anyhow::Error;
/// Result type for scanning operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Per-file parse failures.
pub mod error;
/// Frontmatter to record conversion.
pub mod parser;
/// Plugin directory scanning.
pub mod scanner;
/// Source record types.
pub mod types;

pub use error::ParseError;
pub use parser::{
    find_supporting_files, parse_agent, parse_agent_str, parse_command, parse_command_str,
    parse_skill, parse_skill_str, split_comma_list, SUPPORTING_DIRS,
};
pub use scanner::{
    list_plugins, load_plugin_metadata, plugins_root, scan_plugin, PluginMetadata, PluginSource,
};
pub use types::{FieldIssue, SourceAgent, SourceCommand, SourceSkill, INHERIT_MODEL};
