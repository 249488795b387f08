// Unit tests for process-level errors
// Tests serialization and how they are reported to the host

use crate::error::GeocoderError;

use geocoder_core::error::{ErrorReport, Reportable};

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Tests that process-level errors display their kind and raise site.
///
/// **WHY THIS MATTERS**: This text is what lands on stderr when startup fails, often
/// before anything else has been logged.
///
/// **BUG THIS CATCHES**: Would catch the `#[error]` format losing the message or the
/// location that tells an operator where the failure came from.
#[test]
fn given_startup_error_when_displayed_then_contains_kind_message_and_location() {
    // GIVEN: A startup error
    let err = GeocoderError::Startup {
        message: String::from("bad config"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Rendering it
    let text = err.to_string();

    // THEN: Kind, message and location are present
    assert!(text.starts_with("Startup Error: bad config"), "got {text}");
    assert!(text.contains("error.rs"), "got {text}");
}

/// **VALUE**: Tests the report names the host sees for process-level errors.
///
/// **WHY THIS MATTERS**: Hosts switch on the error name. A fatal error must
/// arrive as `FatalError` so the host knows the adapter is going away.
///
/// **BUG THIS CATCHES**: Would catch if the Reportable mapping swaps or renames
/// the variants.
#[test]
fn given_fatal_error_when_reported_then_name_is_fatal_error() {
    // GIVEN: A fatal error
    let err = GeocoderError::Fatal {
        message: String::from("Task Panicked Error: boom"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Building the host report
    let report = ErrorReport::from_error(&err);

    // THEN: Name and message carry through, stack starts with them
    assert_eq!(report.name, "FatalError");
    assert_eq!(report.message, "Task Panicked Error: boom");
    assert!(
        report.stack.starts_with("FatalError: Task Panicked Error: boom"),
        "got {}",
        report.stack
    );
    assert!(report.stack.contains("error.rs"), "got {}", report.stack);
}

#[test]
fn given_startup_error_when_reported_then_name_is_startup_error() {
    let err = GeocoderError::Startup {
        message: String::from("bad config"),
        location: ErrorLocation::from(Location::caller()),
    };

    assert_eq!(err.name(), "StartupError");
    assert_eq!(err.message(), "bad config");
}
