//! Configuration file support for stanbuild.
//!
//! stanbuild supports two configuration file locations:
//! - Global: `~/.stanbuild/config.toml` - User-wide defaults
//! - Project: `.stanbuild/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Backend selection is
//! not configured here; it comes from `STAN_BACKEND` only.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// stanbuild configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Toolchain locations
    pub toolchain: ToolchainSettings,
}

/// Locations of the external toolchains driven by model builders.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Python interpreter with PyStan installed
    pub python: Option<PathBuf>,

    /// CmdStan installation directory (falls back to `$CMDSTAN`)
    pub cmdstan: Option<PathBuf>,

    /// GNU make used to drive CmdStan
    pub make: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.toolchain.python.is_some() {
            self.toolchain.python = other.toolchain.python;
        }
        if other.toolchain.cmdstan.is_some() {
            self.toolchain.cmdstan = other.toolchain.cmdstan;
        }
        if other.toolchain.make.is_some() {
            self.toolchain.make = other.toolchain.make;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.stanbuild/config.toml)
/// 2. Global config (~/.stanbuild/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global stanbuild config directory (~/.stanbuild).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".stanbuild"))
}

/// Get the global config path (~/.stanbuild/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.toolchain.python.is_none());
        assert!(config.toolchain.cmdstan.is_none());
        assert!(config.toolchain.make.is_none());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[toolchain]
python = "/usr/bin/python3"
cmdstan = "/opt/cmdstan-2.33.0"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(
            config.toolchain.python,
            Some(PathBuf::from("/usr/bin/python3"))
        );
        assert_eq!(
            config.toolchain.cmdstan,
            Some(PathBuf::from("/opt/cmdstan-2.33.0"))
        );
        assert!(config.toolchain.make.is_none());
    }

    #[test]
    fn test_project_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("project.toml");

        std::fs::write(
            &global,
            "[toolchain]\npython = \"/usr/bin/python3\"\nmake = \"gmake\"\n",
        )
        .unwrap();
        std::fs::write(&project, "[toolchain]\npython = \"/venv/bin/python\"\n").unwrap();

        let config = load_config(Some(&global), &project);
        assert_eq!(
            config.toolchain.python,
            Some(PathBuf::from("/venv/bin/python"))
        );
        assert_eq!(config.toolchain.make, Some(PathBuf::from("gmake")));
    }

    #[test]
    fn test_malformed_config_falls_back() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("config.toml");
        std::fs::write(&project, "[toolchain\npython = ").unwrap();

        let config = load_config(None, &project);
        assert_eq!(config.toolchain, ToolchainSettings::default());
    }
}
