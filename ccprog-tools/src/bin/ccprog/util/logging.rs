use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::Context;
use indicatif::MultiProgress;
use parking_lot::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Progress of a running flash, erase or dump. Console output goes above it.
static PROGRESS: Mutex<Option<MultiProgress>> = Mutex::new(None);

/// Console verbosity selected with `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "UPPER")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    /// Every debug command exchanged with the target.
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// The JSON log of this run. It is flushed when dropped.
pub struct LogFile {
    _writer: WorkerGuard,
    path: PathBuf,
}

impl Drop for LogFile {
    fn drop(&mut self) {
        tracing::info!("Log written to {}", self.path.display());
    }
}

/// An explicit `--log-level` wins over `RUST_LOG`, which defaults to WARN.
fn console_filter(level: Option<LogLevel>) -> EnvFilter {
    let builder = EnvFilter::builder();
    match level {
        Some(level) => builder
            .with_default_directive(LevelFilter::from(level).into())
            .parse_lossy(""),
        None => builder
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy(),
    }
}

/// Installs the console logger and, with a `log_path`, the JSON file logger.
///
/// The file receives every event regardless of the console level.
pub fn setup_logging(
    log_path: Option<&Path>,
    level: Option<LogLevel>,
) -> anyhow::Result<Option<LogFile>> {
    let console = tracing_subscriber::fmt::layer()
        .compact()
        .without_time()
        .with_writer(|| ConsoleWriter)
        .with_filter(console_filter(level));

    let Some(path) = log_path else {
        tracing_subscriber::registry().with(console).init();
        return Ok(None);
    };

    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let (writer, guard) = NonBlockingBuilder::default().lossy(false).finish(file);

    let json = tracing_subscriber::fmt::layer()
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_writer(writer);

    tracing_subscriber::registry().with(console).with(json).init();
    tracing::info!("Logging to {}", path.display());

    Ok(Some(LogFile {
        _writer: guard,
        path: path.to_path_buf(),
    }))
}

/// Shows `progress` until [`clear_progress_bar`] is called.
pub fn set_progress_bar(progress: MultiProgress) {
    *PROGRESS.lock() = Some(progress);
}

pub fn clear_progress_bar() {
    *PROGRESS.lock() = None;
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn print_line(stream: Stream, line: &str) {
    if let Some(progress) = PROGRESS.lock().as_ref() {
        let _ = progress.println(line);
        return;
    }
    match stream {
        Stream::Stdout => println!("{line}"),
        Stream::Stderr => eprintln!("{line}"),
    }
}

/// Prints a status line to stderr.
pub fn eprintln(message: impl AsRef<str>) {
    print_line(Stream::Stderr, message.as_ref())
}

/// Prints command output to stdout.
pub fn println(message: impl AsRef<str>) {
    print_line(Stream::Stdout, message.as_ref())
}

/// Formatted log events, one per write, minus their trailing newline.
struct ConsoleWriter;

impl std::io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        print_line(Stream::Stderr, event_line(&String::from_utf8_lossy(buf)));
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn event_line(event: &str) -> &str {
    event.trim_end_matches(['\r', '\n'])
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case("Erasing chip\n", "Erasing chip")]
    #[test_case("Erasing chip\r\n", "Erasing chip")]
    #[test_case("chunk 1\nchunk 2\n", "chunk 1\nchunk 2")]
    #[test_case("no newline", "no newline")]
    fn event_keeps_inner_newlines(event: &str, expected: &str) {
        assert_eq!(event_line(event), expected);
    }

    #[test]
    fn explicit_level_sets_console_filter() {
        assert_eq!(
            console_filter(Some(LogLevel::Debug)).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            console_filter(Some(LogLevel::Off)).max_level_hint(),
            Some(LevelFilter::OFF)
        );
    }

    #[test]
    fn trace_level_parses_from_upper_case() {
        use clap::ValueEnum;

        let level = LogLevel::from_str("TRACE", false).unwrap();

        assert_eq!(LevelFilter::from(level), LevelFilter::TRACE);
    }
}
