//! The task that owns the host output stream.

use crate::error::ChannelError;
use crate::host_channel::envelope::OutboundEnvelope;

use common::ErrorLocation;

use std::panic::Location;

use log::{debug, warn};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};

pub(crate) enum WriterCommand {
    Send {
        envelope: OutboundEnvelope,
        ack: oneshot::Sender<Result<(), ChannelError>>,
    },
    Flush {
        ack: oneshot::Sender<Result<(), ChannelError>>,
    },
}

/// Writes queued envelopes in order, one JSON line each, flushing after every
/// line. Runs until every `HostSender` is dropped.
pub(crate) async fn writer_task<W>(
    mut output: W,
    mut commands: mpsc::UnboundedReceiver<WriterCommand>,
) where
    W: AsyncWrite + Unpin + Send + 'static,
{
    while let Some(command) = commands.recv().await {
        match command {
            WriterCommand::Send { envelope, ack } => {
                let outcome = write_envelope(&mut output, &envelope).await;
                if let Err(ref e) = outcome {
                    warn!("Failed to write '{}' envelope: {e}", envelope.kind());
                }
                // The sender may have dropped its Delivery; that is allowed.
                let _ = ack.send(outcome);
            }
            WriterCommand::Flush { ack } => {
                let outcome = output.flush().await.map_err(ChannelError::from);
                let _ = ack.send(outcome);
            }
        }
    }

    debug!("Host channel writer stopped");
}

async fn write_envelope<W>(output: &mut W, envelope: &OutboundEnvelope) -> Result<(), ChannelError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(envelope).map_err(|e| ChannelError::Write {
        message: format!("Failed to encode '{}' envelope: {e}", envelope.kind()),
        location: ErrorLocation::from(Location::caller()),
    })?;
    line.push(b'\n');

    output.write_all(&line).await?;
    output.flush().await?;
    Ok(())
}
