//! Configuration file support for plugbridge.
//!
//! Loads settings from `~/.plugbridge/config.toml` (or the file named by
//! `PLUGBRIDGE_CONFIG`) with the following precedence:
//! CLI arguments > Environment variables > Config file > Defaults
//!
//! ## Configuration File Format
//!
//! ```toml
//! # ~/.plugbridge/config.toml
//!
//! [build]
//! # Directory containing plugins/
//! source_root = "."
//! output_dir = "dist/opencode"
//! # Platform registry override (YAML)
//! registry = "config/platform_registry.yaml"
//!
//! [install]
//! target_dir = "~/.config/opencode"
//! backup_dir = "~/.plugbridge/backups"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use plugbridge_transform::DEFAULT_OUTPUT_DIR;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "PLUGBRIDGE_CONFIG";
pub const DEFAULT_TARGET_DIR: &str = "~/.config/opencode";
pub const DEFAULT_BACKUP_DIR: &str = "~/.plugbridge/backups";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub install: InstallConfig,
}

/// Configuration for `build`, `validate` and `clean`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    pub source_root: Option<String>,
    pub output_dir: Option<String>,
    pub registry: Option<String>,
}

/// Configuration for `install` and `verify`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallConfig {
    pub target_dir: Option<String>,
    pub backup_dir: Option<String>,
}

/// Returns the user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    #[cfg(unix)]
    if let Ok(home) = std::env::var("HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("home directory not found"))
}

/// Expands a leading `~` against the home directory.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => Ok(home_dir()?.join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}

/// Returns the path to the config file.
fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    home_dir()
        .ok()
        .map(|h| h.join(".plugbridge").join("config.toml"))
}

/// Loads the configuration file if it exists.
///
/// Returns `Ok(None)` if the file doesn't exist.
/// Returns `Err` if the file exists but fails to parse.
pub fn load_config() -> Result<Option<Config>> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(None),
    }
}

/// Loads a specific configuration file, `Ok(None)` when it is absent.
pub fn load_config_from(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("invalid configuration file {}", path.display()))?;

    tracing::debug!(
        target: "plugbridge::config",
        path = %path.display(),
        "Loaded configuration file"
    );

    Ok(Some(config))
}

/// Build-side paths after applying precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    pub source_root: PathBuf,
    pub output_dir: PathBuf,
    pub registry: Option<PathBuf>,
}

/// Install-side paths after applying precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    pub target_dir: PathBuf,
    pub backup_dir: PathBuf,
}

fn optional(flag: Option<PathBuf>, file: Option<&str>) -> Result<Option<PathBuf>> {
    match flag {
        Some(flag) => Ok(Some(flag)),
        None => file.map(expand_tilde).transpose(),
    }
}

fn required(flag: Option<PathBuf>, file: Option<&str>, default: &str) -> Result<PathBuf> {
    match flag {
        Some(flag) => Ok(flag),
        None => expand_tilde(file.unwrap_or(default)),
    }
}

impl Config {
    /// Resolves build paths. `None` arguments fall through to the file,
    /// then to the built-in defaults.
    pub fn build_paths(
        &self,
        source_root: Option<PathBuf>,
        output_dir: Option<PathBuf>,
        registry: Option<PathBuf>,
    ) -> Result<BuildPaths> {
        Ok(BuildPaths {
            source_root: required(source_root, self.build.source_root.as_deref(), ".")?,
            output_dir: self.output_dir(output_dir)?,
            registry: optional(registry, self.build.registry.as_deref())?,
        })
    }

    /// Build output directory, also the default artifacts directory.
    pub fn output_dir(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        required(flag, self.build.output_dir.as_deref(), DEFAULT_OUTPUT_DIR)
    }

    /// Resolves install paths. Environment variables reach this function
    /// through the CLI arguments, so they already win over the file.
    pub fn install_paths(
        &self,
        target_dir: Option<PathBuf>,
        backup_dir: Option<PathBuf>,
    ) -> Result<InstallPaths> {
        Ok(InstallPaths {
            target_dir: required(
                target_dir,
                self.install.target_dir.as_deref(),
                DEFAULT_TARGET_DIR,
            )?,
            backup_dir: required(
                backup_dir,
                self.install.backup_dir.as_deref(),
                DEFAULT_BACKUP_DIR,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugbridge_test_utils::{env_guard, set_env_var};
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_none() {
        let temp = tempdir().unwrap();
        assert!(load_config_from(&temp.path().join("none.toml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn parses_both_sections() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "[build]\noutput_dir = \"out\"\n\n[install]\ntarget_dir = \"/opt/opencode\"\n",
        )
        .unwrap();

        let config = load_config_from(&path).unwrap().unwrap();
        assert_eq!(config.build.output_dir.as_deref(), Some("out"));
        assert!(config.build.registry.is_none());
        assert_eq!(config.install.target_dir.as_deref(), Some("/opt/opencode"));
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[build\noutput_dir = ").unwrap();
        assert!(load_config_from(&path).is_err());

        std::fs::write(&path, "[serve]\nport = 1\n").unwrap();
        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn config_env_selects_file() {
        let _guard = env_guard();
        let temp = tempdir().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "[build]\nsource_root = \"src-root\"\n").unwrap();
        let _env = set_env_var(CONFIG_ENV, Some(path.to_str().unwrap()));

        let config = load_config().unwrap().unwrap();
        assert_eq!(config.build.source_root.as_deref(), Some("src-root"));
    }

    #[test]
    fn tilde_expands_against_home() {
        let _guard = env_guard();
        let _home = set_env_var("HOME", Some("/home/tester"));
        assert_eq!(
            expand_tilde("~/.config/opencode").unwrap(),
            PathBuf::from("/home/tester/.config/opencode")
        );
        assert_eq!(expand_tilde("~").unwrap(), PathBuf::from("/home/tester"));
        assert_eq!(expand_tilde("rel/~x").unwrap(), PathBuf::from("rel/~x"));
    }

    #[test]
    fn precedence_is_flag_then_file_then_default() {
        let _guard = env_guard();
        let _home = set_env_var("HOME", Some("/home/tester"));
        let config = Config {
            build: BuildConfig {
                output_dir: Some("from-file".into()),
                ..Default::default()
            },
            install: InstallConfig {
                backup_dir: Some("~/bk".into()),
                ..Default::default()
            },
        };

        let build = config
            .build_paths(Some(PathBuf::from("src")), None, None)
            .unwrap();
        assert_eq!(build.source_root, PathBuf::from("src"));
        assert_eq!(build.output_dir, PathBuf::from("from-file"));
        assert!(build.registry.is_none());

        let flagged = config.output_dir(Some(PathBuf::from("flag"))).unwrap();
        assert_eq!(flagged, PathBuf::from("flag"));

        let install = config.install_paths(None, None).unwrap();
        assert_eq!(install.target_dir, PathBuf::from("/home/tester/.config/opencode"));
        assert_eq!(install.backup_dir, PathBuf::from("/home/tester/bk"));
    }

    #[test]
    fn defaults_without_file() {
        let paths = Config::default().build_paths(None, None, None).unwrap();
        assert_eq!(paths.source_root, PathBuf::from("."));
        assert_eq!(paths.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }
}
