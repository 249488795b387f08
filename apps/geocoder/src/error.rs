use geocoder_core::error::Reportable;

use common::ErrorLocation;

use thiserror::Error;

/// Process-level failures.
///
/// Both variants end the process with a non-zero status after a best-effort
/// report to the host.
#[derive(Debug, Error)]
pub enum GeocoderError {
    /// Configuration or logger setup failed before the channel was served.
    #[error("Startup Error: {message} {location}")]
    Startup {
        message: String,
        location: ErrorLocation,
    },

    /// Something escaped every request-level handler.
    #[error("Fatal Error: {message} {location}")]
    Fatal {
        message: String,
        location: ErrorLocation,
    },
}

impl Reportable for GeocoderError {
    fn name(&self) -> &'static str {
        match self {
            GeocoderError::Startup { .. } => "StartupError",
            GeocoderError::Fatal { .. } => "FatalError",
        }
    }

    fn message(&self) -> &str {
        match self {
            GeocoderError::Startup { message, .. } | GeocoderError::Fatal { message, .. } => {
                message
            }
        }
    }

    fn location(&self) -> ErrorLocation {
        match self {
            GeocoderError::Startup { location, .. } | GeocoderError::Fatal { location, .. } => {
                *location
            }
        }
    }
}
