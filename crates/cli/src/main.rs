//! Command-line interface for the `plugbridge` application.
//!
//! This crate serves as the main entry point for the executable, delegating
//! its functionality to the `plugbridge-app` crate.

fn main() -> anyhow::Result<()> {
    plugbridge_app::run()
}
