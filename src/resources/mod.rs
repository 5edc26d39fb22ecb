//! Idempotent filesystem primitives (check + apply pattern).
pub mod directory;
pub mod symlink;

use anyhow::Result;

/// A filesystem change that can be applied.
pub trait Applicable {
    /// Bring the resource to its desired state.
    ///
    /// # Errors
    ///
    /// Returns an error if the filesystem cannot be changed.  Errors carry a
    /// [`DeployError`](crate::error::DeployError) that callers may downcast.
    fn apply(&self) -> Result<ResourceChange>;
}

/// Observed state of a resource.
///
/// # Examples
///
/// ```
/// use dotdeploy::resources::ResourceState;
///
/// let wrong = ResourceState::Incorrect { current: "regular file".into() };
/// assert_ne!(wrong, ResourceState::Correct);
/// assert_eq!(ResourceState::Missing, ResourceState::Missing);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Nothing exists at the path.
    Missing,
    /// The path already has the desired state.
    Correct,
    /// Something else occupies the path.
    Incorrect {
        /// What is there instead.
        current: String,
    },
}

/// Result of applying a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// The resource was created.
    Applied,
    /// An existing entry was removed and the resource created in its place.
    Replaced {
        /// What was removed.
        previous: String,
    },
    /// Nothing to do.
    AlreadyCorrect,
}

/// A resource that can inspect its own state before applying.
pub trait Resource: Applicable {
    /// Check the current state of the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be determined.
    fn current_state(&self) -> Result<ResourceState>;

    /// Whether [`Applicable::apply`] would change anything.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Resource::current_state`].
    fn needs_change(&self) -> Result<bool> {
        Ok(self.current_state()? != ResourceState::Correct)
    }
}
