// Shared helpers for integration tests.
//
// Provides a temporary source tree and destination directory behind a fluent
// builder, plus a `Log` implementation that records messages so tests can
// assert on what a run reported.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dotdeploy::cli::Cli;
use dotdeploy::config::Settings;
use dotdeploy::config::toml_loader::FileSettings;
use dotdeploy::logging::{Log, StepEntry, StepStatus};

/// A source tree and an empty destination inside one [`tempfile::TempDir`].
pub struct DeployFixture {
    _tmp: tempfile::TempDir,
    /// Canonical source root.
    pub source: PathBuf,
    /// Canonical destination root.
    pub destination: PathBuf,
}

impl DeployFixture {
    /// Settings for `user@host` with the given flags, resolved through the
    /// same layering as the binary.
    pub fn settings(&self, user: &str, host: &str, dry: bool, force: bool) -> Settings {
        let cli = Cli {
            source: Some(self.source.clone()),
            destination: Some(self.destination.clone()),
            username: Some(user.to_string()),
            hostname: Some(host.to_string()),
            dry,
            force,
            yes: true,
            ..Cli::default()
        };
        Settings::from_layers(&cli, &FileSettings::default()).expect("resolve settings")
    }

    /// Every entry below the destination as sorted relative paths; symlinks
    /// are shown with their target relative to the source root.
    pub fn destination_listing(&self) -> Vec<String> {
        let mut out = Vec::new();
        for entry in walkdir::WalkDir::new(&self.destination)
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.expect("walk destination");
            let rel = entry
                .path()
                .strip_prefix(&self.destination)
                .expect("inside destination")
                .display()
                .to_string();
            if entry.path_is_symlink() {
                let target = std::fs::read_link(entry.path()).expect("read link");
                let target = target.strip_prefix(&self.source).unwrap_or(&target);
                out.push(format!("{rel} -> {}", target.display()));
            } else if entry.file_type().is_dir() {
                out.push(format!("{rel}/"));
            } else {
                out.push(rel);
            }
        }
        out
    }

    /// Path below the source root.
    pub fn src(&self, rel: &str) -> PathBuf {
        self.source.join(rel)
    }

    /// Path below the destination root.
    pub fn dst(&self, rel: &str) -> PathBuf {
        self.destination.join(rel)
    }
}

/// Fluent builder for [`DeployFixture`].
pub struct SourceTreeBuilder {
    fixture: DeployFixture,
}

impl SourceTreeBuilder {
    /// Begin with an empty source tree and an empty destination.
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = dunce::canonicalize(tmp.path()).expect("canonicalize temp dir");
        let source = root.join("dotfiles");
        let destination = root.join("home");
        std::fs::create_dir_all(&source).expect("create source");
        std::fs::create_dir_all(&destination).expect("create destination");
        Self {
            fixture: DeployFixture {
                _tmp: tmp,
                source,
                destination,
            },
        }
    }

    /// Add a file below the source root; its content is its own path.
    pub fn file(self, rel: &str) -> Self {
        let path = self.fixture.source.join(rel);
        create_parent(&path);
        std::fs::write(&path, rel).expect("write source file");
        self
    }

    /// Add several files.
    pub fn files(self, rels: &[&str]) -> Self {
        rels.iter().fold(self, |builder, rel| builder.file(rel))
    }

    /// Add an empty directory below the source root.
    pub fn dir(self, rel: &str) -> Self {
        std::fs::create_dir_all(self.fixture.source.join(rel)).expect("create source dir");
        self
    }

    /// Write the `.deployignore` file.
    pub fn ignore(self, content: &str) -> Self {
        std::fs::write(self.fixture.source.join(".deployignore"), content)
            .expect("write ignore file");
        self
    }

    /// Put a regular file at a destination path before the run.
    pub fn existing_destination_file(self, rel: &str, content: &str) -> Self {
        let path = self.fixture.destination.join(rel);
        create_parent(&path);
        std::fs::write(&path, content).expect("write destination file");
        self
    }

    /// Finish building.
    pub fn build(self) -> DeployFixture {
        self.fixture
    }
}

fn create_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
}

/// [`Log`] implementation that keeps every message, ANSI codes removed.
#[derive(Debug, Default)]
pub struct RecordingLog {
    messages: Mutex<Vec<(&'static str, String)>>,
    steps: Mutex<Vec<StepEntry>>,
}

impl RecordingLog {
    fn push(&self, kind: &'static str, msg: &str) {
        self.messages
            .lock()
            .expect("lock messages")
            .push((kind, strip_ansi(msg)));
    }

    /// Messages of `kind` (`"stage"`, `"info"`, `"dry_run"`, ...).
    pub fn messages(&self, kind: &str) -> Vec<String> {
        self.messages
            .lock()
            .expect("lock messages")
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Recorded steps.
    pub fn steps(&self) -> Vec<StepEntry> {
        self.steps.lock().expect("lock steps").clone()
    }
}

impl Log for RecordingLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
    fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>) {
        self.steps.lock().expect("lock steps").push(StepEntry {
            name: name.to_string(),
            status,
            message: message.map(String::from),
        });
    }
}

/// Remove `ESC [ ... m` sequences.
fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for inner in chars.by_ref() {
                if inner == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}
