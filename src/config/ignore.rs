//! Ignore rules read from a newline-delimited glob file.
//!
//! Each non-blank line (surrounding whitespace trimmed) is a shell glob with
//! `fnmatch` semantics: `*` and `?` also match `/`, braces are literal
//! characters rather than alternations, and a backslash is an ordinary
//! character.  Directories are tested with their path relative to the source
//! root, files with their filename.
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::DeployError;

/// Compiled ignore rules.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    patterns: Vec<String>,
    set: GlobSet,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }
}

impl IgnoreRules {
    /// Load rules from `path`.  A missing file yields empty rules.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::IgnoreFile`] if the file exists but cannot be
    /// read, or [`DeployError::IgnorePattern`] if a line is not a valid glob.
    pub fn load(path: &Path) -> Result<Self, DeployError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(DeployError::IgnoreFile {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Compile rules from file content.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::IgnorePattern`] for the first invalid glob.
    pub fn parse(content: &str) -> Result<Self, DeployError> {
        let mut patterns: Vec<String> = Vec::new();
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !patterns.iter().any(|p| p == line) {
                patterns.push(line.to_string());
            }
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(&escape_braces(pattern))
                .literal_separator(false)
                .backslash_escape(false)
                .build()
                .map_err(|source| DeployError::IgnorePattern {
                    pattern: pattern.clone(),
                    source,
                })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| DeployError::IgnorePattern {
            pattern: patterns.join(", "),
            source,
        })?;

        Ok(Self { patterns, set })
    }

    /// The first pattern matching `name`, if any.
    #[must_use]
    pub fn matching(&self, name: &Path) -> Option<&str> {
        self.set
            .matches(name)
            .into_iter()
            .min()
            .and_then(|index| self.patterns.get(index))
            .map(String::as_str)
    }

    /// Number of distinct rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Wrap `{` and `}` outside character classes in a class of their own, so
/// globset reads them literally.
fn escape_braces(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            '[' => {
                out.push(c);
                // `!` and a leading `]` belong to the class.
                if let Some(&bang) = chars.peek()
                    && bang == '!'
                {
                    out.push(bang);
                    chars.next();
                }
                if let Some(&close) = chars.peek()
                    && close == ']'
                {
                    out.push(close);
                    chars.next();
                }
                for inner in chars.by_ref() {
                    out.push(inner);
                    if inner == ']' {
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}
