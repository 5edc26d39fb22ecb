//! Tracing subscriber setup: console formatter, log file layer, initialisation.
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

/// Event target for stage headers.
pub(super) const STAGE_TARGET: &str = "dotdeploy::stage";
/// Event target for dry-run actions.
pub(super) const DRY_RUN_TARGET: &str = "dotdeploy::dry_run";

/// Pulls the `message` field out of a [`tracing::Event`].
#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

fn event_message(event: &tracing::Event<'_>) -> String {
    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);
    visitor.message
}

/// Appends every event to the run's log file, timestamped and without ANSI
/// codes.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate the log file for `command`, write a run header and open it
    /// for appending.
    ///
    /// Returns `None` when the cache directory or the file is unavailable;
    /// logging to the console still works in that case.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let version =
            option_env!("DOTDEPLOY_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let rule = "=".repeat(42);
        let header = format!("{rule}\ndotdeploy {version} {}\n{rule}\n", format_utc_datetime());
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let msg = strip_ansi(&event_message(event));
        let ts = format_utc_time();

        let line = match (*metadata.level(), metadata.target()) {
            (tracing::Level::INFO, STAGE_TARGET) => format!("[{ts}] ==> {msg}"),
            (tracing::Level::INFO, DRY_RUN_TARGET) => format!("[{ts}]     [dry run] {msg}"),
            (tracing::Level::ERROR, _) => format!("[{ts}]     [error] {msg}"),
            (tracing::Level::WARN, _) => format!("[{ts}]     [warn] {msg}"),
            (tracing::Level::DEBUG | tracing::Level::TRACE, _) => {
                format!("[{ts}]     [debug] {msg}")
            }
            _ => format!("[{ts}]     {msg}"),
        };

        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{line}").ok();
        }
    }
}

/// Console event format: bold stage headers, indented info lines, tagged
/// dry-run lines, dimmed debug lines.
struct DeployFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for DeployFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let msg = event_message(event);

        match (*metadata.level(), metadata.target()) {
            (tracing::Level::ERROR, _) => writeln!(writer, "\x1b[31mERROR\x1b[0m {msg}"),
            (tracing::Level::WARN, _) => writeln!(writer, "\x1b[33mWARN\x1b[0m  {msg}"),
            (tracing::Level::INFO, STAGE_TARGET) => {
                writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m")
            }
            (tracing::Level::INFO, DRY_RUN_TARGET) => {
                writeln!(writer, "  \x1b[33m[DRY RUN]\x1b[0m {msg}")
            }
            (tracing::Level::INFO, _) => writeln!(writer, "  {msg}"),
            _ => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Install the global [`tracing`] subscriber.
///
/// Warnings and errors go to stderr, everything else to stdout.  Debug lines
/// reach the console only when `verbose` is set; the log file at
/// `$XDG_CACHE_HOME/dotdeploy/<command>.log` always receives them.
/// Call once at startup, before any logging.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(DeployFormatter)
        .with_writer(make_writer)
        .with_filter(console_level);

    let file_layer = FileLayer::new(command).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}
