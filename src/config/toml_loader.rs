//! Optional TOML settings file.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::DeployError;

/// Values read from the settings file.  Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    /// Source root.
    pub source: Option<PathBuf>,
    /// Destination root.
    pub destination: Option<PathBuf>,
    /// Username override.
    pub username: Option<String>,
    /// Hostname override.
    pub hostname: Option<String>,
    /// Ignore file, relative to the source root.
    pub ignorefile: Option<PathBuf>,
    /// Remove existing destinations before linking.
    pub force: Option<bool>,
    /// Verbose output.
    pub verbose: Option<bool>,
}

/// Default settings file: `$XDG_CONFIG_HOME/dotdeploy/config.toml`, falling
/// back to `~/.config/dotdeploy/config.toml`.
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| super::home_dir().map(|home| home.join(".config")))?;
    Some(config_dir.join("dotdeploy").join("config.toml"))
}

/// Load settings from `path`.
///
/// When `required` is false a missing file yields default settings.
///
/// # Errors
///
/// Returns [`DeployError::Settings`] if the file is missing while required,
/// cannot be read, or is not valid TOML for [`FileSettings`].
pub fn load(path: &Path, required: bool) -> Result<FileSettings, DeployError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            return Ok(FileSettings::default());
        }
        Err(e) => {
            return Err(DeployError::Settings {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
        }
    };

    toml::from_str(&content).map_err(|e| DeployError::Settings {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}
