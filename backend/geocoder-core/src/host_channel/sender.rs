//! Outbound half of the host channel.
//!
//! Every operation validates locally, enqueues the envelope for the writer
//! task and returns at once. Nothing here blocks or panics; the outcome of a
//! send is only observable through the returned [`Delivery`].

use crate::error::{ChannelError, ErrorReport, Reportable};
use crate::host_channel::envelope::OutboundEnvelope;
use crate::host_channel::writer::WriterCommand;

use common::ErrorLocation;

use std::panic::Location;

use log::trace;
use serde::de::IgnoredAny;
use tokio::sync::{mpsc, oneshot};

/// Result text substituted when a dispatch has nothing to return.
pub const EMPTY_RESULT: &str = "{}";

/// Pending outcome of one outbound send.
///
/// Await [`Delivery::wait`] to learn whether the envelope reached the host
/// stream; drop it when the outcome does not matter.
#[derive(Debug)]
pub struct Delivery {
    receiver: oneshot::Receiver<Result<(), ChannelError>>,
}

impl Delivery {
    fn rejected(error: ChannelError) -> Self {
        let (sender, receiver) = oneshot::channel();
        // The receiver is held right here, so this send cannot fail.
        let _ = sender.send(Err(error));
        Self { receiver }
    }

    /// Waits until the writer has written and flushed the envelope, or
    /// returns the reason it never will.
    pub async fn wait(self) -> Result<(), ChannelError> {
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ChannelError::Closed {
                message: String::from("writer stopped before confirming delivery"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

/// Cloneable handle for sending envelopes to the host.
#[derive(Debug, Clone)]
pub struct HostSender {
    commands: mpsc::UnboundedSender<WriterCommand>,
}

impl HostSender {
    pub(crate) fn new(commands: mpsc::UnboundedSender<WriterCommand>) -> Self {
        Self { commands }
    }

    /// Acknowledges the `ready` handshake. Callers send this only once their
    /// own initialization is complete.
    pub fn notify_ready(&self) -> Delivery {
        self.enqueue(OutboundEnvelope::Ready)
    }

    /// Sends a dispatch result.
    ///
    /// `None` becomes [`EMPTY_RESULT`]. Text that is not a complete JSON
    /// document is rejected with [`ChannelError::InvalidResult`] and nothing
    /// is sent.
    #[track_caller]
    pub fn send_result(&self, result: Option<String>) -> Delivery {
        let result = result.unwrap_or_else(|| String::from(EMPTY_RESULT));

        if let Err(e) = serde_json::from_str::<IgnoredAny>(&result) {
            return Delivery::rejected(ChannelError::InvalidResult {
                message: format!("A valid JSON String is required as result: {e}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.enqueue(OutboundEnvelope::Result(result))
    }

    /// Sends diagnostic text to the host's loggers. Empty text is rejected.
    #[track_caller]
    pub fn log(&self, data: impl Into<String>) -> Delivery {
        let data = data.into();

        if data.is_empty() {
            return Delivery::rejected(ChannelError::InvalidLog {
                message: String::from("A valid log data is required."),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.enqueue(OutboundEnvelope::Log(data))
    }

    /// Reports an error to the host's exception handlers.
    #[track_caller]
    pub fn report_error<E: Reportable + ?Sized>(&self, error: &E) -> Delivery {
        self.report(ErrorReport::from_error(error))
    }

    /// Sends a prebuilt report. A report without a name is rejected.
    #[track_caller]
    pub fn report(&self, report: ErrorReport) -> Delivery {
        if report.name.is_empty() {
            return Delivery::rejected(ChannelError::InvalidError {
                message: String::from("A valid error object is required."),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.enqueue(OutboundEnvelope::Error(report))
    }

    /// Acknowledges a shutdown request.
    pub fn notify_close(&self) -> Delivery {
        self.enqueue(OutboundEnvelope::Close)
    }

    /// Resolves once every envelope enqueued before it has been written.
    pub(crate) fn flush(&self) -> Delivery {
        let (ack, receiver) = oneshot::channel();
        if self.commands.send(WriterCommand::Flush { ack }).is_err() {
            return Delivery::rejected(closed_error());
        }
        Delivery { receiver }
    }

    fn enqueue(&self, envelope: OutboundEnvelope) -> Delivery {
        trace!("Queueing '{}' envelope", envelope.kind());

        let (ack, receiver) = oneshot::channel();
        match self.commands.send(WriterCommand::Send { envelope, ack }) {
            Ok(()) => Delivery { receiver },
            Err(_) => Delivery::rejected(closed_error()),
        }
    }
}

#[track_caller]
fn closed_error() -> ChannelError {
    ChannelError::Closed {
        message: String::from("host channel writer is not running"),
        location: ErrorLocation::from(Location::caller()),
    }
}
