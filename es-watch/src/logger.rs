use crate::error::{Result as WatchErrorResult, WatchError};

use std::fmt::Arguments;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::SystemTime;

use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::debug;

/// Install the global fern logger.
///
/// Console logging goes to stderr so JSON on stdout stays parseable. With
/// `log_file` set, records are appended there instead, with full timestamps
/// and source locations; `colored` only affects the console.
pub fn initialize(
    log_level: es_config::LogLevel,
    log_file: Option<PathBuf>,
    colored: bool,
) -> WatchErrorResult<()> {
    let level = log_level.0;

    let sink = match &log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| WatchError::LogFile {
                    path: path.display().to_string(),
                    source,
                })?;
            Dispatch::new()
                .format(|out, message, record| {
                    let date = humantime::format_rfc3339(SystemTime::now());
                    out.finish(format_args!(
                        "[{date} - {}] {message} [{}:{}]",
                        record.level(),
                        record.file().unwrap_or("unknown"),
                        record.line().unwrap_or(0),
                    ))
                })
                .chain(file)
        }
        None if colored => {
            let colors = ColoredLevelConfig::new()
                .trace(Color::Magenta)
                .debug(Color::Blue)
                .info(Color::Green)
                .warn(Color::Yellow)
                .error(Color::Red);
            Dispatch::new()
                .format(move |out, message, record| {
                    console_line(out, colors.color(record.level()), message)
                })
                .chain(std::io::stderr())
        }
        None => Dispatch::new()
            .format(|out, message, record| console_line(out, record.level(), message))
            .chain(std::io::stderr()),
    };

    Dispatch::new()
        .level(level)
        .chain(sink)
        .apply()
        .map_err(|e| WatchError::Logger {
            message: e.to_string(),
        })?;

    let target = log_file
        .as_ref()
        .map_or_else(|| "stderr".to_string(), |path| path.display().to_string());
    debug!("Logging at {level:?} to {target}");
    Ok(())
}

fn console_line(out: FormatCallback<'_>, level: impl std::fmt::Display, message: &Arguments<'_>) {
    let date = humantime::format_rfc3339_seconds(SystemTime::now());
    out.finish(format_args!("[{date} - {level}] {message}"));
}
