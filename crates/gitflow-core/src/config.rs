//! User settings for gitflow.
//!
//! Settings live outside the repository (the flow configuration itself is
//! stored in git config, see [`crate::FlowConfig`]). A missing file yields
//! the defaults.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::traits::ConfigReader;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV: &str = "GITFLOW_CONFIG";

/// Settings loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Git executable settings.
    #[serde(default)]
    pub git: GitSettings,

    /// Workflow settings.
    #[serde(default)]
    pub flow: FlowSettings,
}

impl Settings {
    /// Load settings from a TOML file.
    ///
    /// # Errors
    /// Returns error if the file exists but can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::SettingsParse {
            file: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load settings from [`Settings::default_path`], if there is one.
    ///
    /// # Errors
    /// Returns error if the file exists but can't be read or parsed.
    pub fn load_default() -> Result<Self> {
        Self::default_path().map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Save settings to a TOML file.
    ///
    /// # Errors
    /// Returns error if serialization or write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| std::io::Error::other(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// `$GITFLOW_CONFIG`, else `<config dir>/gitflow/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        path_from(std::env::var_os(CONFIG_ENV), dirs::config_dir())
    }
}

impl ConfigReader for Settings {
    fn get(&self, key: &str) -> Option<String> {
        match key {
            "git.path" => self.git.path.clone(),
            "git.timeout_secs" => self.git.timeout_secs.map(|s| s.to_string()),
            "flow.remote" => Some(self.flow.remote.clone()),
            "flow.push_on_finish" => Some(self.flow.push_on_finish.to_string()),
            _ => None,
        }
    }
}

/// Git executable settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitSettings {
    /// Location hint for the git executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Per-command timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSettings {
    /// Remote used for tracking checks, branch deletion and pushes.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Push main, develop and tags after a release or hotfix finish.
    #[serde(default)]
    pub push_on_finish: bool,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            push_on_finish: false,
        }
    }
}

fn path_from(env: Option<OsString>, config_dir: Option<PathBuf>) -> Option<PathBuf> {
    env.filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| config_dir.map(|d| d.join("gitflow").join("config.toml")))
}

fn default_remote() -> String {
    "origin".into()
}
