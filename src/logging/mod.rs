//! Logging infrastructure for structured console and file output.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use subscriber::init_subscriber;
pub use types::{Log, StepEntry, StepStatus};
pub use utils::Color;

/// Serializes `XDG_CACHE_HOME` manipulation across parallel test threads.
#[cfg(test)]
pub(crate) static TEST_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Create a [`Logger`] whose events land in a log file under a fresh
/// temporary cache directory.
///
/// The returned guard keeps the thread-local subscriber installed; drop it
/// last.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let env_lock = TEST_ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    // SAFETY: Protected by TEST_ENV_MUTEX; restored before lock is released.
    #[allow(unsafe_code)]
    unsafe {
        std::env::set_var("XDG_CACHE_HOME", tmp.path());
    }
    let file_layer = subscriber::FileLayer::new("test").expect("failed to create file layer");
    let log = Logger::new("test");
    #[allow(unsafe_code)]
    unsafe {
        std::env::remove_var("XDG_CACHE_HOME");
    }
    drop(env_lock);
    let subscriber =
        tracing_subscriber::registry().with(file_layer.with_filter(LevelFilter::DEBUG));
    let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(subscriber));
    (log, tmp, guard)
}

/// In-memory [`Log`] that records every message with its kind, for asserting
/// on what a command reported.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryLog {
    messages: std::sync::Mutex<Vec<(&'static str, String)>>,
    steps: std::sync::Mutex<Vec<StepEntry>>,
}

#[cfg(test)]
impl MemoryLog {
    fn push(&self, kind: &'static str, msg: &str) {
        if let Ok(mut guard) = self.messages.lock() {
            guard.push((kind, msg.to_string()));
        }
    }

    /// Messages of `kind`, ANSI codes removed.
    pub(crate) fn messages(&self, kind: &str) -> Vec<String> {
        self.messages.lock().map_or_else(
            |_| vec![],
            |guard| {
                guard
                    .iter()
                    .filter(|(k, _)| *k == kind)
                    .map(|(_, m)| utils::strip_ansi(m))
                    .collect()
            },
        )
    }

    /// Recorded steps.
    pub(crate) fn steps(&self) -> Vec<StepEntry> {
        self.steps.lock().map_or_else(|_| vec![], |g| g.clone())
    }
}

#[cfg(test)]
impl Log for MemoryLog {
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
        if let Ok(mut guard) = self.steps.lock() {
            guard.push(StepEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }
}
