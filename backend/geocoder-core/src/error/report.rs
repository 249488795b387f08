//! Conversion of any failure into the `{name, message, stack}` shape the host
//! expects on its error channel.

use common::ErrorLocation;

use std::error::Error as StdError;

use serde::{Deserialize, Serialize};

/// An error that can be sent to the host as an error report.
///
/// `name` is the stable kind marker the host switches on, `message` is the
/// bare human-readable text (no location suffix), and `location` becomes the
/// first frame of the rendered stack.
pub trait Reportable: StdError {
    fn name(&self) -> &'static str;
    fn message(&self) -> &str;
    fn location(&self) -> ErrorLocation;
}

/// Payload of an outbound `error` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub name: String,
    pub message: String,
    pub stack: String,
}

impl ErrorReport {
    /// Builds a report, rendering the stack as the headline, the raising
    /// location, then one line per error in the source chain.
    pub fn from_error<E: Reportable + ?Sized>(error: &E) -> Self {
        let mut stack = format!(
            "{}: {}\n    {}",
            error.name(),
            error.message(),
            error.location().as_frame()
        );

        let mut source = error.source();
        while let Some(cause) = source {
            stack.push_str("\n    caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }

        Self {
            name: error.name().to_string(),
            message: error.message().to_string(),
            stack,
        }
    }
}
