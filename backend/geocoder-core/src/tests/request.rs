// Unit tests for request validation
// Covers the InvalidInput boundary for both modes

use crate::dispatcher::request::INVALID_ADDRESS_MESSAGE;
use crate::dispatcher::{ForwardRequest, ReverseRequest};
use crate::error::{GeocodeError, Reportable};

use serde_json::json;

// ============================================
// FORWARD
// ============================================

#[test]
fn given_string_address_when_parsed_then_accepted() {
    let payload = json!({ "address": "10 Jupiter St, Bel-Air, Makati, PH 1209" });

    let request = ForwardRequest::parse(&payload).expect("string address should parse");

    assert_eq!(request.address, "10 Jupiter St, Bel-Air, Makati, PH 1209");
}

/// **VALUE**: Verifies non-string addresses are refused before any network call.
///
/// **WHY THIS MATTERS**: The host may forward arbitrary device payloads. A numeric or
/// missing address must surface as `InvalidInput` with the exact message the host's
/// exception handlers already know.
///
/// **BUG THIS CATCHES**: Would catch if numbers were coerced to strings or if the
/// message text drifted.
#[test]
fn given_non_string_address_when_parsed_then_invalid_input() {
    for payload in [
        json!({ "address": 42 }),
        json!({ "address": null }),
        json!({}),
        json!(null),
        json!("10 Jupiter St"),
    ] {
        let error = ForwardRequest::parse(&payload).expect_err("should be rejected");

        assert!(matches!(error, GeocodeError::InvalidInput { .. }));
        assert_eq!(error.message(), INVALID_ADDRESS_MESSAGE);
        assert_eq!(error.name(), "InvalidInput");
    }
}

// ============================================
// REVERSE
// ============================================

/// **VALUE**: Verifies the range bounds are inclusive.
///
/// **WHY THIS MATTERS**: The poles and the antimeridian are legitimate coordinates.
///
/// **BUG THIS CATCHES**: Would catch a half-open range (`-90..90`) sneaking in.
#[test]
fn given_boundary_coordinates_when_parsed_then_accepted() {
    for (lat, lng) in [(90.0, 180.0), (-90.0, -180.0), (0.0, 0.0), (14.5547, 121.0244)] {
        let payload = json!({ "lat": lat, "lng": lng });

        let request = ReverseRequest::parse(&payload).expect("in-range coordinates should parse");

        assert_eq!(request, ReverseRequest { lat, lng });
    }
}

#[test]
fn given_integer_coordinates_when_parsed_then_accepted() {
    let request = ReverseRequest::parse(&json!({ "lat": 14, "lng": 121 })).unwrap();

    assert_eq!(request, ReverseRequest { lat: 14.0, lng: 121.0 });
}

/// **VALUE**: Verifies out-of-range latitude is rejected with both values in the message.
///
/// **WHY THIS MATTERS**: This is the host-visible contract for bad coordinates; the
/// operator reading the error needs to see what was sent.
///
/// **BUG THIS CATCHES**: Would catch if only one value were embedded, or the check
/// were skipped for latitude.
#[test]
fn given_latitude_out_of_range_when_parsed_then_message_embeds_both_values() {
    let error = ReverseRequest::parse(&json!({ "lat": 95, "lng": 10 })).unwrap_err();

    assert_eq!(error.name(), "InvalidInput");
    assert_eq!(
        error.message(),
        "Latitude (lat) and Longitude (lng) are not valid. lat: 95 lng:10"
    );
}

#[test]
fn given_longitude_out_of_range_when_parsed_then_invalid_input() {
    let error = ReverseRequest::parse(&json!({ "lat": 10, "lng": -180.5 })).unwrap_err();

    assert!(matches!(error, GeocodeError::InvalidInput { .. }));
    assert!(error.message().contains("lng:-180.5"));
}

#[test]
fn given_non_numeric_or_missing_coordinates_when_parsed_then_invalid_input() {
    let error = ReverseRequest::parse(&json!({ "lat": "14.5", "lng": 121 })).unwrap_err();
    assert!(error.message().contains("lat: 14.5 lng:121"));

    let error = ReverseRequest::parse(&json!({ "lat": 14.5 })).unwrap_err();
    assert!(error.message().ends_with("lng:undefined"));

    let error = ReverseRequest::parse(&json!(null)).unwrap_err();
    assert!(error.message().ends_with("lat: undefined lng:undefined"));
}
