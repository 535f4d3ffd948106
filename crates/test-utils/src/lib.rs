//! Shared test utilities for plugbridge crates.
//!
//! Provides a temporary plugin source tree builder, canned artifact
//! sources and guards for tests that touch process-global state.

use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
///
/// Acquire this guard at the start of any test that modifies environment
/// variables to prevent race conditions between parallel tests.
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for environment variables - restores original value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Set an environment variable and return a guard that restores the original on drop.
///
/// # Example
/// ```
/// let _guard = plugbridge_test_utils::set_env_var("MY_VAR", Some("value"));
/// assert_eq!(std::env::var("MY_VAR").as_deref(), Ok("value"));
/// ```
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

/// Source text for a Claude Code command with every required field.
pub fn command_source(name: &str, description: &str, body: &str) -> String {
    format!(
        "---\nname: {name}\nversion: 1.0.0\ndescription: {description}\ntags:\n  - core\ncreated: 2025-10-01\nauthor: test\n---\n\n{body}\n"
    )
}

/// Source text for a Claude Code agent.
pub fn agent_source(name: &str, description: &str, tools: &str, body: &str) -> String {
    format!(
        "---\nname: {name}\ndescription: {description}\ntools: {tools}\nmodel: inherit\n---\n\n{body}\n"
    )
}

/// Source text for a Claude Code skill.
pub fn skill_source(name: &str, description: &str, body: &str) -> String {
    format!("---\nname: {name}\ndescription: {description}\n---\n\n{body}\n")
}

/// Temporary directory laid out like a plugin source repository.
///
/// ```text
/// <root>/plugins/<plugin>/{commands,agents,skills}/...
/// ```
///
/// The tempdir is cleaned up when the fixture is dropped.
pub struct PluginFixture {
    pub tempdir: tempfile::TempDir,
    /// Source root (contains `plugins/`).
    pub source_root: PathBuf,
}

impl PluginFixture {
    pub fn new() -> std::io::Result<Self> {
        let tempdir = tempfile::tempdir()?;
        let source_root = tempdir.path().join("source");
        std::fs::create_dir_all(source_root.join("plugins"))?;
        Ok(Self {
            tempdir,
            source_root,
        })
    }

    /// Directory of a plugin (`<root>/plugins/<plugin>`), created on demand.
    pub fn plugin_dir(&self, plugin: &str) -> PathBuf {
        self.source_root.join("plugins").join(plugin)
    }

    /// A scratch directory next to the source tree (e.g. build output).
    pub fn path(&self, relative: &str) -> PathBuf {
        self.tempdir.path().join(relative)
    }

    fn write(&self, path: &Path, content: &str) -> std::io::Result<PathBuf> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(path.to_path_buf())
    }

    /// Write `.claude-plugin/plugin.json`.
    pub fn write_plugin_json(
        &self,
        plugin: &str,
        name: &str,
        version: &str,
    ) -> std::io::Result<PathBuf> {
        let path = self.plugin_dir(plugin).join(".claude-plugin/plugin.json");
        let json = format!("{{\n  \"name\": \"{name}\",\n  \"version\": \"{version}\"\n}}\n");
        self.write(&path, &json)
    }

    pub fn add_command(&self, plugin: &str, name: &str, content: &str) -> std::io::Result<PathBuf> {
        let path = self
            .plugin_dir(plugin)
            .join("commands")
            .join(format!("{name}.md"));
        self.write(&path, content)
    }

    pub fn add_agent(&self, plugin: &str, name: &str, content: &str) -> std::io::Result<PathBuf> {
        let path = self
            .plugin_dir(plugin)
            .join("agents")
            .join(format!("{name}.md"));
        self.write(&path, content)
    }

    /// Create `skills/<name>/SKILL.md`; returns the skill directory.
    pub fn add_skill(&self, plugin: &str, name: &str, content: &str) -> std::io::Result<PathBuf> {
        let skill_dir = self.plugin_dir(plugin).join("skills").join(name);
        self.write(&skill_dir.join("SKILL.md"), content)?;
        Ok(skill_dir)
    }

    /// Add a file below a skill directory (e.g. `templates/a.md`).
    pub fn add_skill_file(
        &self,
        plugin: &str,
        skill: &str,
        relative: &str,
        content: &str,
    ) -> std::io::Result<PathBuf> {
        let path = self
            .plugin_dir(plugin)
            .join("skills")
            .join(skill)
            .join(relative);
        self.write(&path, content)
    }

    /// Populate a small but complete plugin: two commands, two agents, one skill.
    pub fn sample_plugin(&self, plugin: &str) -> std::io::Result<()> {
        let namespace = format!("rp1-{plugin}");
        self.write_plugin_json(plugin, &namespace, "2.1.0")?;
        self.add_command(
            plugin,
            "build",
            &command_source(
                "build",
                "Build the knowledge base",
                &format!("Use subagent_type: {namespace}:builder to build."),
            ),
        )?;
        self.add_command(
            plugin,
            "review",
            &command_source("review", "Review changes", "Review the current diff."),
        )?;
        self.add_agent(
            plugin,
            "builder",
            &agent_source(
                "builder",
                "Builds things",
                "Read, Write, Bash",
                &format!("Run /{namespace}:review after building.\n\n```\n/{namespace}:review\n```"),
            ),
        )?;
        self.add_agent(
            plugin,
            "searcher",
            &agent_source("searcher", "Searches code", "Grep, Glob, ExitPlanMode", "Search."),
        )?;
        self.add_skill(
            plugin,
            "maestro",
            &skill_source(
                "maestro",
                "Orchestrates complex multi-step work",
                "Use the Skill tool with skill: maestro to start.",
            ),
        )?;
        self.add_skill_file(plugin, "maestro", "templates/plan.md", "# Plan\n")?;
        self.add_skill_file(plugin, "maestro", "scripts/run.sh", "#!/bin/sh\necho run\n")?;
        Ok(())
    }
}
