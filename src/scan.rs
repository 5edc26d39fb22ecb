//! Source tree scan: walk, ignore rules, specialization, destination map.
//!
//! The scan is read-only.  It produces a [`DeployPlan`] describing which
//! destination directories to create, which symlinks to make, and which
//! walked entries were skipped and why.
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ignore::IgnoreRules;
use crate::destination_map::{AddOutcome, DestinationMap, normalize};
use crate::error::{DeployError, SkipReason};
use crate::identity::Identity;
use crate::logging::{Color, Log};
use crate::specialization::SpecializedName;

/// A walked entry that will not be deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Path of the entry in the source tree.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Everything a deploy run will do, computed without touching the
/// destination.
#[derive(Debug)]
pub struct DeployPlan {
    /// Destination directories to create, sorted.
    pub directories: BTreeSet<PathBuf>,
    /// Chosen source for every destination path.
    pub map: DestinationMap,
    /// Entries left out of the plan, in walk order.
    pub skipped: Vec<Skipped>,
}

impl DeployPlan {
    fn skip(&mut self, log: &dyn Log, path: &Path, reason: SkipReason) {
        let shown = path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        log.info(&format!("Ignoring {}", Color::Purple.paint(&shown)));
        log.debug(&format!("{}: {reason}", path.display()));
        self.skipped.push(Skipped {
            path: path.to_path_buf(),
            reason,
        });
    }
}

/// Walk `source_root` and build the deploy plan for `identity`.
///
/// Entries are visited in file-name order so that equal-priority candidates
/// resolve the same way on every run.  Symlinks inside the source tree are
/// deployed as files and never followed.  A directory matching an ignore rule
/// (tested with its path relative to the root, `.` for the root itself) is
/// skipped together with everything below it.  A file is tested with its bare
/// filename.
///
/// # Errors
///
/// Returns [`DeployError::Walk`] if the tree cannot be read, or
/// [`DeployError::OutsideSourceRoot`] if the walker yields a path outside the
/// root.
pub fn scan(
    source_root: &Path,
    destination_root: &Path,
    identity: &Identity,
    ignore: &IgnoreRules,
    log: &dyn Log,
) -> Result<DeployPlan, DeployError> {
    let mut plan = DeployPlan {
        directories: BTreeSet::new(),
        map: DestinationMap::new(source_root, destination_root),
        skipped: Vec::new(),
    };
    // Walked, non-ignored directories mapped to "has a non-ignored subdirectory".
    let mut walked_dirs: BTreeMap<PathBuf, bool> = BTreeMap::new();

    let mut walker = WalkDir::new(source_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| DeployError::Walk {
            path: e
                .path()
                .map_or_else(|| source_root.to_path_buf(), Path::to_path_buf),
            source: e,
        })?;
        let path = entry.path();

        if entry.file_type().is_dir() {
            let rel = relative_to(path, source_root)?;
            if let Some(pattern) = ignore.matching(&rel) {
                let reason = SkipReason::IgnoredByPattern {
                    pattern: pattern.to_string(),
                };
                plan.skip(log, path, reason);
                walker.skip_current_dir();
                continue;
            }
            if entry.depth() > 0
                && let Some(parent) = path.parent()
                && let Some(has_child) = walked_dirs.get_mut(parent)
            {
                *has_child = true;
            }
            walked_dirs.insert(path.to_path_buf(), false);
            continue;
        }

        let Some(parsed) = SpecializedName::parse(entry.file_name()) else {
            plan.skip(log, path, SkipReason::ParseFailed);
            continue;
        };
        let candidate = match parsed.resolve(identity) {
            Ok(candidate) => candidate,
            Err(rejected) => {
                let reason = SkipReason::InvalidSpecialization {
                    qualifier: rejected.qualifier().unwrap_or_default().to_string(),
                };
                plan.skip(log, path, reason);
                continue;
            }
        };
        if let Some(pattern) = ignore.matching(Path::new(entry.file_name())) {
            let reason = SkipReason::IgnoredByPattern {
                pattern: pattern.to_string(),
            };
            plan.skip(log, path, reason);
            continue;
        }

        let directory = path.parent().unwrap_or(source_root);
        match plan.map.add(directory, candidate)? {
            AddOutcome::Inserted { destination } => {
                log.debug(&format!("{} -> {}", path.display(), destination.display()));
            }
            AddOutcome::Replaced {
                destination,
                previous,
            } => log.debug(&format!(
                "{} replaces {} for {}",
                path.display(),
                previous.display(),
                destination.display()
            )),
            AddOutcome::Kept {
                destination,
                incumbent,
            } => log.debug(&format!(
                "{} keeps {} over {}",
                destination.display(),
                incumbent.display(),
                path.display()
            )),
        }
    }

    for (dir, has_child) in walked_dirs {
        if !has_child {
            let rel = relative_to(&dir, source_root)?;
            plan.directories
                .insert(normalize(&destination_root.join(rel)));
        }
    }

    Ok(plan)
}

/// `path` relative to `root`, `.` for the root itself.
fn relative_to(path: &Path, root: &Path) -> Result<PathBuf, DeployError> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| DeployError::OutsideSourceRoot {
            directory: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;
    if rel.as_os_str().is_empty() {
        Ok(PathBuf::from("."))
    } else {
        Ok(rel.to_path_buf())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::MemoryLog;
    use std::fs;

    struct Fixture {
        _src: tempfile::TempDir,
        root: PathBuf,
        out: PathBuf,
    }

    impl Fixture {
        fn new(files: &[&str], dirs: &[&str]) -> Self {
            let src = tempfile::tempdir().unwrap();
            let root = dunce::canonicalize(src.path()).unwrap();
            for dir in dirs {
                fs::create_dir_all(root.join(dir)).unwrap();
            }
            for file in files {
                let path = root.join(file);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, file.as_bytes()).unwrap();
            }
            Self {
                _src: src,
                root,
                out: PathBuf::from("/out"),
            }
        }

        fn scan(&self, ignore: &str) -> (DeployPlan, MemoryLog) {
            let log = MemoryLog::default();
            let identity = Identity::new("alice", "box1").unwrap();
            let rules = IgnoreRules::parse(ignore).unwrap();
            let plan = scan(&self.root, &self.out, &identity, &rules, &log).unwrap();
            (plan, log)
        }

        fn source_for(&self, plan: &DeployPlan, dest: &str) -> Option<PathBuf> {
            plan.map
                .get(&self.out.join(dest))
                .map(|e| e.source.strip_prefix(&self.root).unwrap().to_path_buf())
        }
    }

    #[test]
    fn picks_most_specific_variant() {
        let fx = Fixture::new(
            &[
                ".bashrc",
                ".bashrc<box1>",
                ".bashrc<alice@box1>",
                ".vimrc",
                ".vimrc<bob>",
                ".gitconfig<alice>",
            ],
            &[],
        );
        let (plan, _log) = fx.scan("");

        assert_eq!(plan.map.len(), 3);
        assert_eq!(
            fx.source_for(&plan, ".bashrc"),
            Some(PathBuf::from(".bashrc<alice@box1>"))
        );
        assert_eq!(fx.source_for(&plan, ".vimrc"), Some(PathBuf::from(".vimrc")));
        assert_eq!(
            fx.source_for(&plan, ".gitconfig"),
            Some(PathBuf::from(".gitconfig<alice>"))
        );
        assert_eq!(
            plan.skipped,
            vec![Skipped {
                path: fx.root.join(".vimrc<bob>"),
                reason: SkipReason::InvalidSpecialization {
                    qualifier: "bob".to_string()
                },
            }]
        );
    }

    #[test]
    fn equal_priority_keeps_first_in_walk_order() {
        let fx = Fixture::new(&["config<box1>", "config<alice>", "config"], &[]);
        let (plan, log) = fx.scan("");

        // Walk order: "config", "config<alice>", "config<box1>".
        assert_eq!(plan.map.len(), 1);
        assert_eq!(
            fx.source_for(&plan, "config"),
            Some(PathBuf::from("config<alice>"))
        );
        assert!(plan.skipped.is_empty());
        let debug = log.messages("debug");
        assert_eq!(debug.len(), 3, "{debug:?}");
        assert!(debug[0].ends_with("-> /out/config"), "{debug:?}");
        assert!(debug[1].contains("replaces"), "{debug:?}");
        assert!(debug[2].contains("keeps"), "{debug:?}");
        assert!(debug[2].ends_with("config<box1>"), "{debug:?}");
    }

    #[test]
    fn dot_base_names_are_skipped() {
        let fx = Fixture::new(&["..<box1>", ".<box1>", "keep"], &[]);
        let (plan, _log) = fx.scan("");

        assert_eq!(plan.map.len(), 1);
        assert!(
            plan.map
                .entries()
                .all(|(_, destination)| destination.starts_with("/out/"))
        );
        let skipped: Vec<_> = plan
            .skipped
            .iter()
            .map(|s| (s.path.strip_prefix(&fx.root).unwrap().to_path_buf(), s.reason.clone()))
            .collect();
        assert_eq!(
            skipped,
            vec![
                (PathBuf::from("..<box1>"), SkipReason::ParseFailed),
                (PathBuf::from(".<box1>"), SkipReason::ParseFailed),
            ]
        );
    }

    #[test]
    fn nested_files_keep_their_relative_directory() {
        let fx = Fixture::new(&["b/my_file", ".config/nvim/init.lua<box1>"], &[]);
        let (plan, _log) = fx.scan("");
        assert_eq!(
            fx.source_for(&plan, "b/my_file"),
            Some(PathBuf::from("b/my_file"))
        );
        assert_eq!(
            fx.source_for(&plan, ".config/nvim/init.lua"),
            Some(PathBuf::from(".config/nvim/init.lua<box1>"))
        );
    }

    #[test]
    fn only_leaf_directories_are_planned() {
        let fx = Fixture::new(&["a/b/c/file", "a/x"], &["d", "e/f"]);
        let (plan, _log) = fx.scan("");
        let dirs: Vec<_> = plan.directories.iter().cloned().collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/out/a/b/c"),
                PathBuf::from("/out/d"),
                PathBuf::from("/out/e/f"),
            ]
        );
    }

    #[test]
    fn empty_root_plans_destination_root() {
        let fx = Fixture::new(&["file"], &[]);
        let (plan, _log) = fx.scan("");
        assert_eq!(
            plan.directories.iter().collect::<Vec<_>>(),
            vec![Path::new("/out")]
        );
    }

    #[test]
    fn ignored_directory_prunes_subtree() {
        let fx = Fixture::new(&[".git/HEAD", ".git/refs/heads/main", "keep"], &[]);
        let (plan, log) = fx.scan(".git\n");

        assert_eq!(plan.map.len(), 1);
        assert!(fx.source_for(&plan, "keep").is_some());
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].path, fx.root.join(".git"));
        assert_eq!(log.messages("info"), vec!["Ignoring .git"]);
    }

    #[test]
    fn ignored_directory_does_not_hide_leaf_parent() {
        let fx = Fixture::new(&["a/.git/HEAD", "a/file"], &[]);
        let (plan, _log) = fx.scan("*.git\n");
        assert!(plan.directories.contains(Path::new("/out/a")));
        assert!(!plan.directories.iter().any(|d| d.ends_with(".git")));
    }

    #[test]
    fn directories_match_by_relative_path() {
        let fx = Fixture::new(&["a/b/file", "b/file"], &[]);
        let (plan, _log) = fx.scan("a/b\n");
        assert!(fx.source_for(&plan, "a/b/file").is_none());
        assert!(fx.source_for(&plan, "b/file").is_some());
    }

    #[test]
    fn ignored_root_skips_everything() {
        let fx = Fixture::new(&["file"], &[]);
        let (plan, _log) = fx.scan(".\n");
        assert!(plan.map.is_empty());
        assert!(plan.directories.is_empty());
    }

    #[test]
    fn files_match_by_filename() {
        let fx = Fixture::new(&["README.md", "docs/notes.md", ".deployignore"], &[]);
        let (plan, _log) = fx.scan("*.md\n.deployignore\n");
        assert!(plan.map.is_empty());
        let reasons: Vec<_> = plan.skipped.iter().map(|s| s.reason.to_string()).collect();
        assert_eq!(
            reasons,
            vec![
                "matches ignore rule '.deployignore'",
                "matches ignore rule '*.md'",
                "matches ignore rule '*.md'",
            ]
        );
    }

    #[test]
    fn ignore_rule_applies_to_qualified_filename() {
        let fx = Fixture::new(&["secret<alice>", "secret"], &[]);
        let (plan, _log) = fx.scan("secret<*\n");
        assert_eq!(fx.source_for(&plan, "secret"), Some(PathBuf::from("secret")));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_in_source_are_candidates_not_followed() {
        let fx = Fixture::new(&["real/file"], &[]);
        std::os::unix::fs::symlink(fx.root.join("real"), fx.root.join("alias")).unwrap();
        let (plan, _log) = fx.scan("");
        assert_eq!(fx.source_for(&plan, "alias"), Some(PathBuf::from("alias")));
        assert!(fx.source_for(&plan, "alias/file").is_none());
    }

    #[test]
    fn verbose_log_reports_replacements() {
        let fx = Fixture::new(&["rc", "rc<alice@box1>"], &[]);
        let (_plan, log) = fx.scan("");
        let debug = log.messages("debug");
        assert_eq!(debug.len(), 2);
        assert!(debug[0].ends_with("-> /out/rc"), "{debug:?}");
        assert!(debug[1].contains("replaces"), "{debug:?}");
    }

    #[test]
    fn relative_to_root_is_dot() {
        let root = Path::new("/src");
        assert_eq!(relative_to(root, root).unwrap(), PathBuf::from("."));
        assert_eq!(
            relative_to(Path::new("/src/a/b"), root).unwrap(),
            PathBuf::from("a/b")
        );
        assert!(matches!(
            relative_to(Path::new("/elsewhere"), root),
            Err(DeployError::OutsideSourceRoot { .. })
        ));
    }
}
