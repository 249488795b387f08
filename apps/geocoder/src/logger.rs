//! Logging for the geocoder adapter.
//!
//! stdout belongs to the host protocol, so diagnostics go to stderr (with
//! colors) and, when a log directory is configured, to a plain-text file.

use crate::error::GeocoderError;

use geocoder_core::config::LoggingSettings;

use common::ErrorLocation;

use std::fmt::{Arguments, Display};
use std::fs::create_dir_all;
use std::io::stderr;
use std::panic::Location;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use fern::{Dispatch, FormatCallback};
use humantime::format_rfc3339;
use log::{LevelFilter, Record, info, warn};

/// Thread-safe initialization guard.
static INIT_LOGGER_ONCE: Once = Once::new();

/// Tracks if logger initialization was already attempted.
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

/// Log file name.
pub const LOG_FILE_NAME: &str = "geocoder.log";

const LOGGER_INITIALIZED_MESSAGE_PREFIX: &str = "Logger initialized with level: ";
const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

/// Default log level for debug builds.
#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

/// Default log level for release builds.
#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Initialize the global logger.
///
/// Safe to call more than once: later calls log a warning and return Ok.
///
/// # Errors
///
/// Returns [`GeocoderError::Startup`] if the log file cannot be created or
/// the dispatch cannot be installed. A log file failure still installs the
/// stderr output, so the caller can log the error it is about to report.
pub fn initialize(settings: &LoggingSettings) -> Result<(), GeocoderError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        let level = settings.level_filter().unwrap_or(DEFAULT_LOG_LEVEL);
        let (dispatch, file_error) = resolve_dispatch(settings, level);

        if let Err(e) = dispatch.apply() {
            result = Err(GeocoderError::Startup {
                message: format!("Failed to initialize logger: {e}"),
                location: ErrorLocation::from(Location::caller()),
            });
            return;
        }

        info!("{LOGGER_INITIALIZED_MESSAGE_PREFIX}{level:?}");
        if let Some(e) = file_error {
            result = Err(e);
        }
    });

    result
}

/// Picks the dispatch to install: the configured one, or stderr alone
/// together with the reason the log file could not be used.
pub fn resolve_dispatch(
    settings: &LoggingSettings,
    level: LevelFilter,
) -> (Dispatch, Option<GeocoderError>) {
    match build_dispatch(settings, level) {
        Ok(dispatch) => (dispatch, None),
        Err(e) => (Dispatch::new().level(level).chain(stderr_output()), Some(e)),
    }
}

/// Builds the stderr (+ optional file) dispatch without installing it.
#[track_caller]
pub fn build_dispatch(
    settings: &LoggingSettings,
    level: LevelFilter,
) -> Result<Dispatch, GeocoderError> {
    let mut dispatch = Dispatch::new().level(level).chain(stderr_output());

    if let Some(log_dir) = &settings.log_dir {
        create_dir_all(log_dir).map_err(|e| GeocoderError::Startup {
            message: format!("Failed to create log directory {}: {e}", log_dir.display()),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let log_file_path = log_dir.join(LOG_FILE_NAME);
        let log_file = fern::log_file(&log_file_path).map_err(|e| GeocoderError::Startup {
            message: format!(
                "Failed to create log file {}: {e}",
                log_file_path.display()
            ),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let file_dispatch = Dispatch::new()
            .format(|out, message, record| write_line(out, message, record, &record.level()))
            .chain(log_file);

        dispatch = dispatch.chain(file_dispatch);
    }

    Ok(dispatch)
}

/// Colored stderr output.
fn stderr_output() -> Dispatch {
    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    Dispatch::new()
        .format(move |out, message, record| {
            let level = color_configuration.color(record.level());
            write_line(out, message, record, &level)
        })
        .chain(stderr())
}

/// `[rfc3339 - LEVEL] message [file:line]`, shared by both outputs.
fn write_line(
    out: FormatCallback<'_>,
    message: &Arguments<'_>,
    record: &Record<'_>,
    level: &dyn Display,
) {
    out.finish(format_args!(
        "[{} - {level}] {message} [{}:{}]",
        format_rfc3339(SystemTime::now()),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
    ))
}
