use crate::error::report::Reportable;

use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

/// An outbound message failed local validation or could not be written.
///
/// Returned to whoever holds the `Delivery`; never turned into a second error
/// report.
#[derive(Debug, ThisError)]
pub enum ChannelError {
    #[error("Invalid Result Error: {message} {location}")]
    InvalidResult {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid Log Error: {message} {location}")]
    InvalidLog {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid Error Report: {message} {location}")]
    InvalidError {
        message: String,
        location: ErrorLocation,
    },

    #[error("Channel Closed Error: {message} {location}")]
    Closed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Write Error: {message} {location}")]
    Write {
        message: String,
        location: ErrorLocation,
    },
}

impl Reportable for ChannelError {
    fn name(&self) -> &'static str {
        "ChannelError"
    }

    fn message(&self) -> &str {
        match self {
            ChannelError::InvalidResult { message, .. }
            | ChannelError::InvalidLog { message, .. }
            | ChannelError::InvalidError { message, .. }
            | ChannelError::Closed { message, .. }
            | ChannelError::Write { message, .. } => message,
        }
    }

    fn location(&self) -> ErrorLocation {
        match self {
            ChannelError::InvalidResult { location, .. }
            | ChannelError::InvalidLog { location, .. }
            | ChannelError::InvalidError { location, .. }
            | ChannelError::Closed { location, .. }
            | ChannelError::Write { location, .. } => *location,
        }
    }
}

impl From<IoError> for ChannelError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        ChannelError::Write {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Failures that stop the read loop itself. These escape `HostChannel::run`
/// and end the process through the supervisor.
#[derive(Debug, ThisError)]
pub enum HostChannelError {
    #[error("Read Error: {message} {location}")]
    Read {
        message: String,
        location: ErrorLocation,
    },

    #[error("Task Panicked Error: {message} {location}")]
    TaskPanicked {
        message: String,
        location: ErrorLocation,
    },

    /// The output writer ended while the channel still owned a sender, so
    /// nothing more can reach the host.
    #[error("Writer Stopped Error: {message} {location}")]
    WriterStopped {
        message: String,
        location: ErrorLocation,
    },
}

impl From<IoError> for HostChannelError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        HostChannelError::Read {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
