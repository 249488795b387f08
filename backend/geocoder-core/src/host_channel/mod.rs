//! Host channel: the single link between this process and the host that
//! launched it.
//!
//! The host speaks newline-delimited JSON envelopes. This module turns inbound
//! lines into calls on a [`HostEventHandler`] and exposes the outbound side as
//! [`HostSender`].
//!
//! # Lifecycle rules
//!
//! - The first `ready` envelope reaches the handler; later ones are dropped.
//! - Every `data` envelope is dispatched in its own task. Dispatches are not
//!   queued behind each other.
//! - The first `close` envelope reaches the handler; later ones are dropped.
//! - End of input stops reading, waits for in-flight dispatches and flushes
//!   the output before [`HostChannel::run`] returns.
//!
//! A line that is not valid UTF-8 is skipped like any other malformed line.
//! A panic inside a dispatch, a dead output writer or a broken input stream
//! ends `run` with a [`HostChannelError`]; the caller is expected to report
//! it and exit.

mod envelope;
mod handler;
mod sender;
mod writer;

pub use envelope::{InboundEnvelope, OutboundEnvelope, ReadyOptions};
pub use handler::HostEventHandler;
pub use sender::{Delivery, EMPTY_RESULT, HostSender};

use crate::error::HostChannelError;
use writer::writer_task;

use common::ErrorLocation;

use std::any::Any;
use std::io::ErrorKind;
use std::panic::Location;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};

pub struct HostChannel<R> {
    input: R,
    sender: HostSender,
    writer: JoinHandle<()>,
}

impl<R> HostChannel<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Creates a channel reading envelopes from `input` and writing them to
    /// `output`.
    ///
    /// Spawns the writer task, so this must be called inside a Tokio runtime.
    pub fn new<W>(input: R, output: W) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(writer_task(output, commands_rx));

        Self {
            input,
            sender: HostSender::new(commands_tx),
            writer,
        }
    }

    /// Outbound handle. Usable before and after `run`.
    pub fn sender(&self) -> HostSender {
        self.sender.clone()
    }

    /// Reads envelopes until end of input, routing them to `handler`.
    ///
    /// # Errors
    ///
    /// - [`HostChannelError::Read`] if the input stream fails
    /// - [`HostChannelError::TaskPanicked`] if a dispatch task panics
    /// - [`HostChannelError::WriterStopped`] if the output writer dies
    pub async fn run<H: HostEventHandler>(self, handler: Arc<H>) -> Result<(), HostChannelError> {
        let HostChannel {
            input,
            sender,
            mut writer,
        } = self;

        let mut lines = BufReader::new(input).lines();
        let mut in_flight: JoinSet<()> = JoinSet::new();
        let mut ready_seen = false;
        let mut close_seen = false;

        loop {
            tokio::select! {
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    reap(joined)?;
                }
                joined = &mut writer => {
                    return Err(writer_stopped(joined));
                }
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => break,
                        // The offending line is already consumed; the stream is still usable.
                        Err(e) if e.kind() == ErrorKind::InvalidData => {
                            warn!("Skipping host input line: {e}");
                            continue;
                        }
                        Err(e) => return Err(HostChannelError::from(e)),
                    };

                    if line.trim().is_empty() {
                        continue;
                    }

                    match InboundEnvelope::decode(&line) {
                        Ok(InboundEnvelope::Ready(options)) => {
                            if ready_seen {
                                debug!("Ignoring repeated ready envelope");
                                continue;
                            }
                            ready_seen = true;
                            handler.on_ready(options).await;
                        }
                        Ok(InboundEnvelope::Data(payload)) => {
                            let handler = Arc::clone(&handler);
                            in_flight.spawn(async move { handler.on_data(payload).await });
                        }
                        Ok(InboundEnvelope::Close) => {
                            if close_seen {
                                debug!("Ignoring repeated close envelope");
                                continue;
                            }
                            close_seen = true;
                            handler.on_close().await;
                        }
                        Err(reason) => {
                            warn!("Skipping host input line: {reason}");
                        }
                    }
                }
            }
        }

        info!(
            "Host input closed, waiting for {} in-flight dispatch(es)",
            in_flight.len()
        );

        while let Some(joined) = in_flight.join_next().await {
            reap(joined)?;
        }

        if let Err(e) = sender.flush().wait().await {
            warn!("Failed to flush host output: {e}");
        }

        // `sender` is still alive here, so a finished writer can only have died.
        if writer.is_finished() {
            return Err(writer_stopped(writer.await));
        }

        Ok(())
    }
}

fn reap(joined: Result<(), JoinError>) -> Result<(), HostChannelError> {
    match joined {
        Ok(()) => Ok(()),
        Err(e) if e.is_panic() => Err(HostChannelError::TaskPanicked {
            message: format!("dispatch task panicked: {}", panic_message(e.into_panic())),
            location: ErrorLocation::from(Location::caller()),
        }),
        Err(e) => {
            debug!("Dispatch task cancelled: {e}");
            Ok(())
        }
    }
}

#[track_caller]
fn writer_stopped(joined: Result<(), JoinError>) -> HostChannelError {
    let message = match joined {
        Ok(()) => String::from("host output writer exited early"),
        Err(e) if e.is_panic() => {
            format!("host output writer panicked: {}", panic_message(e.into_panic()))
        }
        Err(e) => format!("host output writer was cancelled: {e}"),
    };

    HostChannelError::WriterStopped {
        message,
        location: ErrorLocation::from(Location::caller()),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("non-string panic payload")
    }
}
