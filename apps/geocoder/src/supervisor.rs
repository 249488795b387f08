//! Last line of defense for the adapter process.
//!
//! Anything that escapes request-level handling ends up here: it is logged,
//! reported to the host as a `FatalError` and turned into a non-zero exit
//! status.

use crate::error::GeocoderError;

use geocoder_core::error::HostChannelError;
use geocoder_core::host_channel::{HostChannel, HostEventHandler, HostSender};

use common::ErrorLocation;

use std::panic::{Location, PanicHookInfo};
use std::sync::Arc;

use log::{error, info};
use tokio::io::AsyncRead;
use tokio::task::JoinError;

/// Exit status after the host closed its end of the channel.
pub const EXIT_OK: i32 = 0;

/// Exit status after a startup or fatal error.
pub const EXIT_FAILURE: i32 = 1;

/// Routes panics through the logger instead of the default stderr printer.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(log_panic));
}

fn log_panic(info: &PanicHookInfo<'_>) {
    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());

    match info.location() {
        Some(location) => error!(
            "Panic: {payload} at {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ),
        None => error!("Panic: {payload}"),
    }
}

/// Serves `channel` until the host closes it, returning the process exit
/// status.
///
/// The read loop runs in its own task so a panic inside a lifecycle handler
/// is caught here as well as one inside a dispatch.
pub async fn supervise<R, H>(channel: HostChannel<R>, handler: Arc<H>) -> i32
where
    R: AsyncRead + Unpin + Send + 'static,
    H: HostEventHandler,
{
    let sender = channel.sender();

    match tokio::spawn(channel.run(handler)).await {
        Ok(Ok(())) => {
            info!("Host channel reached end of input, shutting down");
            EXIT_OK
        }
        Ok(Err(e)) => fail(&sender, fatal_from_channel(e)).await,
        Err(e) => fail(&sender, fatal_from_join(e)).await,
    }
}

/// Reports `error` to the host and waits until it has been written.
pub async fn fail(sender: &HostSender, error: GeocoderError) -> i32 {
    error!("{error}");

    if let Err(e) = sender.report_error(&error).wait().await {
        error!("Could not report fatal error to host: {e}");
    }

    EXIT_FAILURE
}

#[track_caller]
fn fatal_from_channel(error: HostChannelError) -> GeocoderError {
    GeocoderError::Fatal {
        message: error.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

#[track_caller]
fn fatal_from_join(error: JoinError) -> GeocoderError {
    let message = if error.is_panic() {
        format!("Host channel task panicked: {error}")
    } else {
        format!("Host channel task was cancelled: {error}")
    };

    GeocoderError::Fatal {
        message,
        location: ErrorLocation::from(Location::caller()),
    }
}
