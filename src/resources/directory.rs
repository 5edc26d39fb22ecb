//! Directory resource.
use anyhow::Result;
use std::path::PathBuf;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::DeployError;

/// A destination directory, created together with its missing ancestors.
#[derive(Debug, Clone)]
pub struct DirectoryResource {
    /// Directory to create.
    pub path: PathBuf,
}

impl DirectoryResource {
    /// Create a new directory resource.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Applicable for DirectoryResource {
    fn apply(&self) -> Result<ResourceChange> {
        if self.path.is_dir() {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        std::fs::create_dir_all(&self.path).map_err(|source| DeployError::Filesystem {
            action: "create directory",
            path: self.path.clone(),
            source,
        })?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for DirectoryResource {
    fn current_state(&self) -> Result<ResourceState> {
        match std::fs::metadata(&self.path) {
            Ok(meta) if meta.is_dir() => Ok(ResourceState::Correct),
            Ok(_) => Ok(ResourceState::Incorrect {
                current: "not a directory".to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ResourceState::Missing),
            Err(e) => Err(e.into()),
        }
    }
}
