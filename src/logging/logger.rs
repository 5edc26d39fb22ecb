//! Console and file logger with a per-run step summary.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Log, StepEntry, StepStatus};
use super::utils::log_file_path;

/// Implement the message methods of [`Log`] by delegating to inherent methods
/// of the same name.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Logger used by the `deploy` binary.
///
/// Messages go through `tracing`, so the subscriber installed by
/// [`init_subscriber`](super::init_subscriber) decides where they land.  Step
/// results are kept in memory for [`Logger::print_summary`].
#[derive(Debug)]
pub struct Logger {
    steps: Mutex<Vec<StepEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a logger for `command`.
    ///
    /// Only remembers where the log file lives; the file itself is created by
    /// the subscriber.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            steps: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Path of the log file for this run, if the cache directory is usable.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn step_entries(&self) -> Vec<StepEntry> {
        self.steps.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header.
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message.
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log an action a dry run would have performed.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record a step result for the summary.
    pub fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.steps.lock() {
            guard.push(StepEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Number of failed steps.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.steps.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|s| s.status == StepStatus::Failed)
                .count()
        })
    }

    /// Print every recorded step followed by totals and the log file path.
    pub fn print_summary(&self) {
        let steps = match self.steps.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };
        if steps.is_empty() {
            return;
        }

        self.stage("Summary");

        let mut ok = 0u32;
        let mut skipped = 0u32;
        let mut dry_run = 0u32;
        let mut failed = 0u32;

        for step in &steps {
            let (icon, color) = match step.status {
                StepStatus::Ok => {
                    ok += 1;
                    ("✓", "\x1b[32m")
                }
                StepStatus::Skipped => {
                    skipped += 1;
                    ("○", "\x1b[33m")
                }
                StepStatus::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
                StepStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
            };
            let suffix = step
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));
            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", step.name));
        }

        let total = ok + skipped + dry_run + failed;
        self.info(&format!(
            "{total} steps: \x1b[32m{ok} ok\x1b[0m, \x1b[33m{skipped} skipped\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m, \x1b[31m{failed} failed\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>) {
        self.record_step(name, status, message);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use std::fs;

    fn log_contents(log: &Logger) -> String {
        fs::read_to_string(log.log_path().expect("log path")).unwrap()
    }

    #[test]
    fn new_logger_has_no_steps() {
        let (log, _tmp, _guard) = isolated_logger();
        assert!(log.step_entries().is_empty());
        assert_eq!(log.failure_count(), 0);
    }

    #[test]
    fn record_step_keeps_order_and_message() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_step("Create directories", StepStatus::Ok, Some("2 created"));
        log.record_step("Create symlinks", StepStatus::DryRun, None);
        let steps = log.step_entries();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].name, "Create directories");
        assert_eq!(steps[0].message.as_deref(), Some("2 created"));
        assert_eq!(steps[1].status, StepStatus::DryRun);
    }

    #[test]
    fn failure_count_counts_failed_steps() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_step("a", StepStatus::Ok, None);
        log.record_step("b", StepStatus::Failed, Some("boom"));
        log.record_step("c", StepStatus::Skipped, None);
        log.record_step("d", StepStatus::Failed, None);
        assert_eq!(log.failure_count(), 2);
    }

    #[test]
    fn log_trait_delegates_to_logger() {
        let (log, _tmp, _guard) = isolated_logger();
        let log_ref: &dyn Log = &log;
        log_ref.record_step("via-trait", StepStatus::Ok, None);
        assert_eq!(log.step_entries().len(), 1);
    }

    #[test]
    fn log_file_has_header() {
        let (log, _tmp, _guard) = isolated_logger();
        assert!(log_contents(&log).contains("dotdeploy "));
    }

    #[test]
    fn debug_always_reaches_file() {
        let (log, _tmp, _guard) = isolated_logger();
        log.debug("debug-marker");
        let contents = log_contents(&log);
        assert!(contents.contains("[debug] debug-marker"), "{contents}");
    }

    #[test]
    fn stage_and_dry_run_are_tagged_in_file() {
        let (log, _tmp, _guard) = isolated_logger();
        log.stage("stage-marker");
        log.dry_run("dry-marker");
        let contents = log_contents(&log);
        assert!(contents.contains("==> stage-marker"), "{contents}");
        assert!(contents.contains("[dry run] dry-marker"), "{contents}");
    }

    #[test]
    fn warn_and_error_are_tagged_in_file() {
        let (log, _tmp, _guard) = isolated_logger();
        log.warn("warn-marker");
        log.error("error-marker");
        let contents = log_contents(&log);
        assert!(contents.contains("[warn] warn-marker"), "{contents}");
        assert!(contents.contains("[error] error-marker"), "{contents}");
    }

    #[test]
    fn ansi_codes_are_stripped_in_file() {
        let (log, _tmp, _guard) = isolated_logger();
        log.info("\x1b[92m/out/.bashrc\x1b[0m --> \x1b[94m/src/.bashrc\x1b[0m");
        let contents = log_contents(&log);
        assert!(
            contents.contains("/out/.bashrc --> /src/.bashrc"),
            "{contents}"
        );
        assert!(!contents.contains('\x1b'));
    }

    #[test]
    fn summary_lists_steps_and_totals() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_step("Create directories", StepStatus::Ok, Some("1 created"));
        log.record_step("Create symlinks", StepStatus::Failed, Some("denied"));
        log.print_summary();
        let contents = log_contents(&log);
        assert!(contents.contains("==> Summary"), "{contents}");
        assert!(contents.contains("✓ Create directories (1 created)"));
        assert!(contents.contains("✗ Create symlinks (denied)"));
        assert!(contents.contains("2 steps: 1 ok, 0 skipped, 0 dry-run, 1 failed"));
        assert!(contents.contains("log: "));
    }

    #[test]
    fn empty_summary_prints_nothing() {
        let (log, _tmp, _guard) = isolated_logger();
        log.print_summary();
        assert!(!log_contents(&log).contains("Summary"));
    }
}
