//! Logging setup shared by the demo binaries. The library itself never
//! initializes a subscriber; only these binaries do.

use std::ffi::OsStr;
use std::path::Path;

use linkwire::logging::ColorizedFormatter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, prelude::*, Layer};

/// Initializes the demo binaries' subscriber: a colorized layer on stdout,
/// plus, if `log_file` is given, a second uncolored layer mirroring the
/// original CLI's `--log-file` option — `"stderr"` sends it to stderr,
/// anything else rotates it daily via [`tracing_appender::rolling::daily`].
///
/// The level is taken from `LOG_LEVEL` (`1` = error, `2` = warn, `3` = info,
/// `4` = debug/trace) if set, otherwise from `verbosity` the way the
/// original CLI maps `-v` flags: `0` = info, `1` = debug, `2+` = trace.
///
/// Returns the file appender's guard, if a file layer was installed; the
/// caller must bind it to a variable that lives for the rest of `main`, or
/// buffered log lines are lost the moment it's dropped.
pub fn init(verbosity: u8, log_file: Option<&str>) -> Option<WorkerGuard> {
    let level = match std::env::var("LOG_LEVEL").ok().and_then(|v| v.parse::<u8>().ok()) {
        Some(1) => LevelFilter::ERROR,
        Some(2) => LevelFilter::WARN,
        Some(3) => LevelFilter::INFO,
        Some(4) => LevelFilter::TRACE,
        _ => match verbosity {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        },
    };

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .event_format(ColorizedFormatter)
        .with_filter(level)
        .boxed();

    let (file_layer, guard) = match log_file {
        Some("stderr") => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_filter(level)
                .boxed();
            (Some(layer), None)
        }
        Some(path_str) => {
            let path = Path::new(path_str);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let filename = path
                .file_name()
                .unwrap_or_else(|| OsStr::new("linkwire.log"));
            let appender = tracing_appender::rolling::daily(dir, filename);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(level)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}
