//! Destination map: one winning source per destination path.
//!
//! Every candidate found by the walk is mapped to the destination path it
//! would be linked at.  When several candidates share a destination, the one
//! with the strictly highest [`Priority`] is kept; on a tie the candidate that
//! arrived first stays.  The walk order therefore matters for ties, and the
//! scanner sorts directory entries to keep it stable.
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::error::DeployError;
use crate::specialization::{Candidate, Priority};

/// The winning source for one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationEntry {
    /// File the symlink will point to.
    pub source: PathBuf,
    /// Priority of the candidate that produced this entry.
    pub priority: Priority,
}

/// What [`DestinationMap::add`] did with a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// First candidate for this destination.
    Inserted {
        /// Computed destination path.
        destination: PathBuf,
    },
    /// The candidate outranked the previous entry and replaced it.
    Replaced {
        /// Computed destination path.
        destination: PathBuf,
        /// Source of the entry that was replaced.
        previous: PathBuf,
    },
    /// The existing entry ranks equal or higher and was kept.
    Kept {
        /// Computed destination path.
        destination: PathBuf,
        /// Source of the entry that was kept.
        incumbent: PathBuf,
    },
}

impl AddOutcome {
    /// The destination path the candidate mapped to.
    #[must_use]
    pub fn destination(&self) -> &Path {
        match self {
            Self::Inserted { destination }
            | Self::Replaced { destination, .. }
            | Self::Kept { destination, .. } => destination,
        }
    }
}

/// Accumulates `(source, destination)` pairs for a single run.
#[derive(Debug, Clone)]
pub struct DestinationMap {
    source_root: PathBuf,
    destination_root: PathBuf,
    entries: BTreeMap<PathBuf, DestinationEntry>,
}

impl DestinationMap {
    /// Create an empty map for the given roots.
    #[must_use]
    pub fn new(source_root: impl Into<PathBuf>, destination_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Add a candidate found in `directory`.
    ///
    /// A relative `directory` is taken relative to the source root.  The
    /// destination keeps the directory's position relative to the source
    /// root and uses the candidate's base name:
    ///
    /// ```
    /// use dotdeploy::destination_map::DestinationMap;
    /// use dotdeploy::identity::Identity;
    /// use dotdeploy::specialization::SpecializedName;
    /// use std::ffi::OsStr;
    /// use std::path::Path;
    ///
    /// let identity = Identity::new("alice", "box1").unwrap();
    /// let candidate = SpecializedName::parse(OsStr::new("my_file<box1>"))
    ///     .unwrap()
    ///     .resolve(&identity)
    ///     .unwrap();
    ///
    /// let mut map = DestinationMap::new("/a", "/out");
    /// let outcome = map.add(Path::new("/a/b"), candidate).unwrap();
    /// assert_eq!(outcome.destination(), Path::new("/out/b/my_file"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::OutsideSourceRoot`] if `directory` is not under
    /// the source root.
    pub fn add(&mut self, directory: &Path, candidate: Candidate) -> Result<AddOutcome, DeployError> {
        let directory = normalize(&self.source_root.join(directory));
        let relative = directory
            .strip_prefix(normalize(&self.source_root))
            .map_err(|_| DeployError::OutsideSourceRoot {
                directory: directory.clone(),
                root: self.source_root.clone(),
            })?;

        let destination = normalize(
            &self
                .destination_root
                .join(relative)
                .join(candidate.name().base_name()),
        );
        let source = directory.join(candidate.name().filename());
        let priority = candidate.priority();

        match self.entries.get_mut(&destination) {
            None => {
                self.entries
                    .insert(destination.clone(), DestinationEntry { source, priority });
                Ok(AddOutcome::Inserted { destination })
            }
            Some(entry) if priority > entry.priority => {
                let previous = std::mem::replace(entry, DestinationEntry { source, priority });
                Ok(AddOutcome::Replaced {
                    destination,
                    previous: previous.source,
                })
            }
            Some(entry) => Ok(AddOutcome::Kept {
                destination,
                incumbent: entry.source.clone(),
            }),
        }
    }

    /// Look up the entry for a destination path.
    #[must_use]
    pub fn get(&self, destination: &Path) -> Option<&DestinationEntry> {
        self.entries.get(destination)
    }

    /// Iterate over `(source, destination)` pairs, ordered by destination.
    pub fn entries(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.entries
            .iter()
            .map(|(destination, entry)| (entry.source.as_path(), destination.as_path()))
    }

    /// Number of destinations tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no destination is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lexically normalize a path: drop `.` segments and let `..` pop its parent.
///
/// Does not touch the filesystem, so symlinks in the path are not resolved.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
