//! Utility functions for log paths, ANSI handling, and time formatting.
use std::fs;
use std::path::PathBuf;

/// Terminal colors used in console output.
///
/// Each variant maps to a fixed SGR escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Ignored entries.
    Purple,
    /// Symlink sources.
    Blue,
    /// Symlink destinations.
    Green,
    /// Section headers.
    Yellow,
    /// Removals.
    Red,
}

const RESET: &str = "\x1b[0m";

impl Color {
    /// The SGR escape sequence for this color.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Purple => "\x1b[95m",
            Self::Blue => "\x1b[94m",
            Self::Green => "\x1b[92m",
            Self::Yellow => "\x1b[93m",
            Self::Red => "\x1b[91m",
        }
    }

    /// Wrap `text` in this color, resetting before and after.
    #[must_use]
    pub fn paint(self, text: impl std::fmt::Display) -> String {
        format!("{RESET}{}{text}{RESET}", self.code())
    }
}

/// Strip ANSI escape sequences from a string.
///
/// Handles SGR sequences (ending in `m`) and other CSI sequences (ending
/// in any byte in the `@`..`~` range).
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if let Some(next) = chars.next()
                && next == '['
            {
                for inner in chars.by_ref() {
                    if ('@'..='~').contains(&inner) {
                        break;
                    }
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Return the `$XDG_CACHE_HOME/dotdeploy/` directory, creating it if needed.
pub(super) fn cache_dir() -> Option<PathBuf> {
    let cache_dir = std::env::var("XDG_CACHE_HOME").map_or_else(
        |_| {
            std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .map_or_else(|_| PathBuf::from("."), PathBuf::from)
                .join(".cache")
        },
        PathBuf::from,
    );
    let dir = cache_dir.join("dotdeploy");
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Return the log file path for `command` under the cache directory.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    Some(cache_dir()?.join(format!("{command}.log")))
}

/// Format the current UTC time as `YYYY-MM-DD HH:MM:SS`.
pub(super) fn format_utc_datetime() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format the current UTC time as `HH:MM:SS`.
pub(super) fn format_utc_time() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}
