//! Error types for the deploy engine.
//!
//! Fatal failures are [`DeployError`] variants returned by library code and
//! converted to [`anyhow::Error`] at the command boundary with `?`.
//! Recoverable skips are not errors; they are [`SkipReason`] values collected
//! in the plan and reported to the user.
//!
//! # Error taxonomy
//!
//! ```text
//! fatal (DeployError)                   non-fatal (SkipReason)
//! ├── SourceRoot                        ├── ParseFailed
//! ├── OutsideSourceRoot                 ├── InvalidSpecialization
//! ├── Walk                              └── IgnoredByPattern
//! ├── IgnoreFile / IgnorePattern
//! ├── Identity / Settings
//! ├── DestinationExists
//! └── Filesystem
//! ```
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Unrecoverable errors that abort a deploy run.
#[derive(Error, Debug)]
pub enum DeployError {
    /// The source root is missing or is not a directory.
    #[error("invalid source root {}: {reason}", path.display())]
    SourceRoot {
        /// Path given as the source root.
        path: PathBuf,
        /// Why it cannot be used.
        reason: String,
    },

    /// A walked directory does not live under the source root.
    #[error("{} is not inside source root {}", directory.display(), root.display())]
    OutsideSourceRoot {
        /// The offending directory.
        directory: PathBuf,
        /// The source root.
        root: PathBuf,
    },

    /// Directory traversal failed.
    #[error("walking {}: {source}", path.display())]
    Walk {
        /// Path being walked when the error occurred.
        path: PathBuf,
        /// Underlying walker error.
        source: walkdir::Error,
    },

    /// The ignore file exists but cannot be read.
    #[error("reading ignore file {}: {source}", path.display())]
    IgnoreFile {
        /// Path of the ignore file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A line of the ignore file is not a valid glob.
    #[error("invalid ignore pattern '{pattern}': {source}")]
    IgnorePattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob compilation error.
        source: globset::Error,
    },

    /// Username or hostname cannot be determined.
    #[error("cannot determine identity: {0}")]
    Identity(String),

    /// The settings file cannot be read or parsed.
    #[error("settings file {}: {message}", path.display())]
    Settings {
        /// Path of the settings file.
        path: PathBuf,
        /// Human-readable description of the problem.
        message: String,
    },

    /// An existing entry at a destination could not be removed.
    #[error("cannot remove existing {}: {source}", path.display())]
    DestinationExists {
        /// Destination path that is in the way.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Creating a directory or symlink failed.
    #[error("{action} {}: {source}", path.display())]
    Filesystem {
        /// What was being done (e.g. `"create directory"`).
        action: &'static str,
        /// Path the action applied to.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Why a file or directory found by the walk was not deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The filename does not fit the `name<qualifier>` grammar.
    ParseFailed,
    /// The qualifier does not match the current identity.
    InvalidSpecialization {
        /// The qualifier that did not match.
        qualifier: String,
    },
    /// The name matched a rule of the ignore file.
    IgnoredByPattern {
        /// The matching pattern.
        pattern: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseFailed => write!(f, "unparseable name"),
            Self::InvalidSpecialization { qualifier } => {
                write!(f, "specialization <{qualifier}> does not apply")
            }
            Self::IgnoredByPattern { pattern } => write!(f, "matches ignore rule '{pattern}'"),
        }
    }
}
