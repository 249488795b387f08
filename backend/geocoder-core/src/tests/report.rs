// Unit tests for error report rendering

use crate::error::{ChannelError, ErrorReport, GeocodeError, Reportable};

use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

/// **VALUE**: Verifies the report carries the bare message, not the Display string.
///
/// **WHY THIS MATTERS**: The host compares `message` against the status line or the
/// validation text. The `thiserror` Display adds a prefix and a location suffix that
/// must not leak into it.
///
/// **BUG THIS CATCHES**: Would catch `message: error.to_string()` in `from_error`.
#[test]
fn given_upstream_error_when_reported_then_message_is_status_line_only() {
    let error = GeocodeError::Upstream {
        status: HttpStatusCode(500),
        message: String::from("Internal Server Error"),
        location: ErrorLocation::from(Location::caller()),
    };

    let report = ErrorReport::from_error(&error);

    assert_eq!(report.name, "UpstreamError");
    assert_eq!(report.message, "Internal Server Error");
}

#[test]
fn given_error_when_reported_then_stack_has_headline_and_frame() {
    let error = GeocodeError::invalid_input("Invalid address.");

    let report = ErrorReport::from_error(&error);

    let mut lines = report.stack.lines();
    assert_eq!(lines.next(), Some("InvalidInput: Invalid address."));
    let frame = lines.next().unwrap();
    assert!(frame.trim_start().starts_with("at "));
    assert!(frame.contains("report.rs"), "frame should point at the raise site");
}

#[test]
fn given_each_variant_when_named_then_matches_taxonomy() {
    let location = ErrorLocation::from(Location::caller());
    let cases = [
        (GeocodeError::invalid_input("x"), "InvalidInput"),
        (
            GeocodeError::Transport {
                message: String::from("x"),
                location,
            },
            "TransportError",
        ),
        (
            GeocodeError::Upstream {
                status: HttpStatusCode(404),
                message: String::from("x"),
                location,
            },
            "UpstreamError",
        ),
        (GeocodeError::response_parse("x"), "ResponseParseError"),
    ];

    for (error, name) in cases {
        assert_eq!(error.name(), name);
    }

    let channel = ChannelError::InvalidLog {
        message: String::from("x"),
        location,
    };
    assert_eq!(channel.name(), "ChannelError");
}

#[test]
fn given_json_error_when_converted_then_response_parse() {
    let json_error = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();

    let error = GeocodeError::from(json_error);

    assert!(matches!(error, GeocodeError::ResponseParse { .. }));
}
