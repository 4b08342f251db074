// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Read from `<config dir>/camera-controls/config.json` (or an explicit
//! path). The file is only ever read; the effects pipeline itself is not
//! saved between runs.

use crate::constants::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_TOOL};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Directory name under the user config dir
pub const APP_DIR: &str = "camera-controls";

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control tool program followed by leading arguments
    /// (e.g., `["flatpak-spawn", "--host", "v4l2-ctl"]`)
    pub tool_command: Vec<String>,
    /// Timeout for a single tool invocation in milliseconds
    pub command_timeout_ms: u64,
    /// Device path used when none is given on the command line
    pub default_device: Option<String>,
    /// Write a control's default back when its effect is removed
    pub restore_default_on_remove: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool_command: vec![DEFAULT_TOOL.to_string()],
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT.as_millis() as u64,
            default_device: None,
            restore_default_on_remove: false, // Removing only stops tracking
        }
    }
}

impl Config {
    /// Default config file location, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or from [`Config::default_path`] when `None`
    ///
    /// A missing file at the default location yields the defaults; an
    /// explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::from_json(&contents).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
            path: String::new(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tool_command.iter().all(|part| part.trim().is_empty()) {
            return Err(ConfigError::EmptyToolCommand);
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}
