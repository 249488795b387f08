use crate::error::report::Reportable;

use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use thiserror::Error as ThisError;

/// Request-scoped failures of a single dispatch.
///
/// Every variant ends in the same terminal pair: an error report followed by
/// an empty-object result. None of them is ever rethrown.
#[derive(Debug, ThisError)]
pub enum GeocodeError {
    /// Malformed or out-of-range request fields. No upstream call was made.
    #[error("Invalid Input Error: {message} {location}")]
    InvalidInput {
        message: String,
        location: ErrorLocation,
    },

    /// The upstream call could not complete.
    #[error("Transport Error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
    },

    /// The upstream answered with something other than 200.
    #[error("Upstream Error: {status} {message} {location}")]
    Upstream {
        status: HttpStatusCode,
        message: String,
        location: ErrorLocation,
    },

    /// The upstream body was not JSON, or lacked the record we needed.
    #[error("Response Parse Error: {message} {location}")]
    ResponseParse {
        message: String,
        location: ErrorLocation,
    },
}

impl GeocodeError {
    #[track_caller]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        GeocodeError::InvalidInput {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn response_parse(message: impl Into<String>) -> Self {
        GeocodeError::ResponseParse {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl Reportable for GeocodeError {
    fn name(&self) -> &'static str {
        match self {
            GeocodeError::InvalidInput { .. } => "InvalidInput",
            GeocodeError::Transport { .. } => "TransportError",
            GeocodeError::Upstream { .. } => "UpstreamError",
            GeocodeError::ResponseParse { .. } => "ResponseParseError",
        }
    }

    fn message(&self) -> &str {
        match self {
            GeocodeError::InvalidInput { message, .. }
            | GeocodeError::Transport { message, .. }
            | GeocodeError::Upstream { message, .. }
            | GeocodeError::ResponseParse { message, .. } => message,
        }
    }

    fn location(&self) -> ErrorLocation {
        match self {
            GeocodeError::InvalidInput { location, .. }
            | GeocodeError::Transport { location, .. }
            | GeocodeError::Upstream { location, .. }
            | GeocodeError::ResponseParse { location, .. } => *location,
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        // The request URL carries the API key in its query string.
        GeocodeError::Transport {
            message: error.without_url().to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for GeocodeError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        GeocodeError::ResponseParse {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
