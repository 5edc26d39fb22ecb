//! Run settings: CLI flags layered over the settings file and detection.
//!
//! Precedence for every value is CLI flag, then settings file, then the
//! detected or built-in default.
pub mod ignore;
pub mod toml_loader;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::Cli;
use crate::destination_map::normalize;
use crate::error::DeployError;
use crate::identity::Identity;

/// Default name of the ignore file inside the source root.
pub const DEFAULT_IGNORE_FILE: &str = ".deployignore";

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Absolute source root; exists and is a directory.
    pub source: PathBuf,
    /// Absolute destination root.
    pub destination: PathBuf,
    /// Identity qualifiers are matched against.
    pub identity: Identity,
    /// Absolute path of the ignore file (may not exist).
    pub ignore_file: PathBuf,
    /// Emit extra progress output.
    pub verbose: bool,
    /// Compute and report the plan without mutating the filesystem.
    pub dry_run: bool,
    /// Remove pre-existing entries at destinations before linking.
    pub force: bool,
    /// Skip the confirmation prompt.
    pub assume_yes: bool,
}

impl Settings {
    /// Resolve settings from the command line, reading the settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is invalid, the identity cannot
    /// be detected, the home directory is unknown, or the source root is not
    /// a directory.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => toml_loader::load(path, true)?,
            None => match toml_loader::default_path() {
                Some(path) => toml_loader::load(&path, false)?,
                None => toml_loader::FileSettings::default(),
            },
        };
        Self::from_layers(cli, &file)
    }

    /// Resolve settings from already loaded layers.
    ///
    /// # Errors
    ///
    /// See [`Settings::resolve`].
    pub fn from_layers(cli: &Cli, file: &toml_loader::FileSettings) -> Result<Self> {
        let source = match cli.source.as_ref().or(file.source.as_ref()) {
            Some(path) => path.clone(),
            None => std::env::current_dir().context("reading current directory")?,
        };
        let source = absolute(&source)?;
        if !source.is_dir() {
            let reason = if source.exists() {
                "not a directory"
            } else {
                "does not exist"
            };
            return Err(DeployError::SourceRoot {
                path: source,
                reason: reason.to_string(),
            }
            .into());
        }
        let source = dunce::canonicalize(&source)
            .with_context(|| format!("resolving source root {}", source.display()))?;

        let destination = match cli.destination.as_ref().or(file.destination.as_ref()) {
            Some(path) => path.clone(),
            None => home_dir().context(
                "cannot determine home directory; pass a destination or set HOME",
            )?,
        };
        let destination = absolute(&destination)?;

        let identity = Identity::detect(
            cli.username.as_deref().or(file.username.as_deref()),
            cli.hostname.as_deref().or(file.hostname.as_deref()),
        )?;

        let ignore_name = cli
            .ignorefile
            .as_deref()
            .or(file.ignorefile.as_deref())
            .unwrap_or_else(|| Path::new(DEFAULT_IGNORE_FILE));
        let ignore_file = normalize(&source.join(ignore_name));

        Ok(Self {
            source,
            destination,
            identity,
            ignore_file,
            verbose: cli.verbose || file.verbose.unwrap_or(false),
            dry_run: cli.dry,
            force: cli.force || file.force.unwrap_or(false),
            assume_yes: cli.yes,
        })
    }
}

/// Home directory from `HOME`, or `USERPROFILE` on Windows.
#[must_use]
pub fn home_dir() -> Option<PathBuf> {
    let vars: &[&str] = if cfg!(target_os = "windows") {
        &["USERPROFILE", "HOME"]
    } else {
        &["HOME"]
    };
    vars.iter()
        .filter_map(|var| std::env::var_os(var))
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Make `path` absolute against the current directory and normalize it.
fn absolute(path: &Path) -> Result<PathBuf> {
    let abs = std::path::absolute(path)
        .with_context(|| format!("resolving path {}", path.display()))?;
    Ok(normalize(&abs))
}
