//! Core logging types: step entries, status, and the [`Log`] trait.

/// Result of one deploy step, kept for the run summary.
#[derive(Debug, Clone)]
pub struct StepEntry {
    /// Human-readable step name.
    pub name: String,
    /// Final status of the step.
    pub status: StepStatus,
    /// Optional detail (counts, skip reason, error description).
    pub message: Option<String>,
}

/// Status of a completed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The step completed and applied its changes.
    Ok,
    /// The step had nothing to do.
    Skipped,
    /// The step only reported what it would do.
    DryRun,
    /// The step failed; the run aborts.
    Failed,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) writes through `tracing`; tests use an
/// in-memory implementation so that reported messages can be asserted on.
pub trait Log {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (shown on the console only when verbose).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log an action that a dry run would have performed.
    fn dry_run(&self, msg: &str);
    /// Record a step result for the summary.
    fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>);
}
