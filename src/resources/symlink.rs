//! Symlink resource.
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::DeployError;

/// A symlink at `target` pointing to `source`.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// The file the symlink points to.
    pub source: PathBuf,
    /// Where the symlink is created.
    pub target: PathBuf,
    /// Remove whatever occupies `target` before linking.
    pub force: bool,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf, force: bool) -> Self {
        Self {
            source,
            target,
            force,
        }
    }
}

impl Applicable for SymlinkResource {
    fn apply(&self) -> Result<ResourceChange> {
        let change = match self.current_state()? {
            ResourceState::Correct => return Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Incorrect { current } if self.force => {
                remove_existing(&self.target)?;
                ResourceChange::Replaced { previous: current }
            }
            ResourceState::Incorrect { .. } | ResourceState::Missing => ResourceChange::Applied,
        };

        create_symlink(&self.source, &self.target).map_err(|source| DeployError::Filesystem {
            action: "create symlink",
            path: self.target.clone(),
            source,
        })?;
        Ok(change)
    }
}

impl Resource for SymlinkResource {
    fn current_state(&self) -> Result<ResourceState> {
        let meta = match std::fs::symlink_metadata(&self.target) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ResourceState::Missing);
            }
            Err(e) => return Err(e.into()),
        };

        if meta.file_type().is_symlink() {
            let existing = std::fs::read_link(&self.target)?;
            if paths_equal(&existing, &self.source) {
                return Ok(ResourceState::Correct);
            }
            return Ok(ResourceState::Incorrect {
                current: format!("symlink to {}", existing.display()),
            });
        }

        let current = if meta.is_dir() {
            "directory"
        } else {
            "regular file"
        };
        Ok(ResourceState::Incorrect {
            current: current.to_string(),
        })
    }
}

/// Compare two paths for equality, ignoring the `\\?\` prefix on Windows.
fn paths_equal(a: &Path, b: &Path) -> bool {
    let normalize = |p: &Path| -> PathBuf {
        #[cfg(windows)]
        {
            let s = p.to_string_lossy();
            if let Some(stripped) = s.strip_prefix(r"\\?\") {
                return PathBuf::from(stripped);
            }
        }
        p.to_path_buf()
    };

    normalize(a) == normalize(b)
}

/// Remove the file, symlink (broken included) or empty directory at `path`.
///
/// A path that is already gone counts as removed.
fn remove_existing(path: &Path) -> Result<(), DeployError> {
    let result = match std::fs::symlink_metadata(path) {
        Ok(meta) if is_dir_like(&meta) => std::fs::remove_dir(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(DeployError::DestinationExists {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Whether metadata describes a directory or a directory symlink.
///
/// On Windows `symlink_metadata().is_dir()` is `false` for directory
/// symlinks, so the raw `FILE_ATTRIBUTE_DIRECTORY` bit is checked instead.
fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & 0x10 != 0 // FILE_ATTRIBUTE_DIRECTORY
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(windows)]
    {
        if target.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        }
    }
}
