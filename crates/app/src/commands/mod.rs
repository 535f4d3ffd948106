//! Subcommand handlers.

mod build;
mod clean;
mod install;
mod validate;
mod verify;

pub(crate) use build::handle_build_command;
pub(crate) use clean::handle_clean_command;
pub(crate) use install::handle_install_command;
pub(crate) use validate::handle_validate_command;
pub(crate) use verify::handle_verify_command;
