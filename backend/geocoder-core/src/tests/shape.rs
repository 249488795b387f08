// Unit tests for response shaping
// Forward extraction, reverse stripping, and the parse-failure boundary

use crate::dispatcher::shape::{LOG_TITLE, shape_forward, shape_reverse};
use crate::dispatcher::{ForwardRequest, ReverseRequest};
use crate::error::{GeocodeError, Reportable};

use serde_json::{Value, json};

fn forward_request() -> ForwardRequest {
    ForwardRequest {
        address: String::from("10 Jupiter St, Bel-Air, Makati, PH 1209"),
    }
}

fn reverse_body() -> Value {
    json!({
        "results": [{
            "providedLocation": { "latLng": { "lat": 14.5547, "lng": 121.0244 } },
            "locations": [{
                "street": "Jupiter Street",
                "adminArea5": "Makati",
                "postalCode": "1209",
                "latLng": { "lat": 14.5547, "lng": 121.0244 },
                "displayLatLng": { "lat": 14.5547, "lng": 121.0244 }
            }]
        }]
    })
}

#[test]
fn given_forward_body_with_match_when_shaped_then_result_is_lat_lng() {
    let body = json!({
        "results": [{ "locations": [{ "latLng": { "lat": 14.5547, "lng": 121.0244 } }] }]
    });

    let shaped = shape_forward(&forward_request(), body.clone()).unwrap();

    let result: Value = serde_json::from_str(&shaped.result).unwrap();
    assert_eq!(result, json!({ "lat": 14.5547, "lng": 121.0244 }));
    assert_eq!(shaped.log.title, LOG_TITLE);
    assert_eq!(
        shaped.log.input,
        json!({ "address": "10 Jupiter St, Bel-Air, Makati, PH 1209" })
    );
    assert_eq!(shaped.log.result, body, "forward log carries the full body");
}

/// **VALUE**: Verifies an empty match list yields the JSON text `null`, not an error.
///
/// **WHY THIS MATTERS**: An unresolvable address is a normal outcome upstream; the host
/// distinguishes it from a failure by the absence of an error message.
///
/// **BUG THIS CATCHES**: Would catch if a missing path were treated as a parse error
/// or substituted with `{}`.
#[test]
fn given_forward_body_without_match_when_shaped_then_result_is_null() {
    let body = json!({ "results": [{ "locations": [] }] });

    let shaped = shape_forward(&forward_request(), body).unwrap();

    assert_eq!(shaped.result, "null");
}

/// **VALUE**: Verifies `latLng` and `displayLatLng` are stripped from the reverse record.
///
/// **WHY THIS MATTERS**: The host already has the coordinates; the record it expects is
/// purely the address fields.
///
/// **BUG THIS CATCHES**: Would catch if stripping happened on a copy that is not the one
/// serialized, or if the other address fields were dropped too.
#[test]
fn given_reverse_body_when_shaped_then_coordinate_fields_are_removed() {
    let request = ReverseRequest { lat: 14.5547, lng: 121.0244 };

    let shaped = shape_reverse(&request, reverse_body()).unwrap();

    let result: Value = serde_json::from_str(&shaped.result).unwrap();
    let address = result.get("address").and_then(Value::as_object).unwrap();
    assert!(!address.contains_key("latLng"));
    assert!(!address.contains_key("displayLatLng"));
    assert_eq!(address.get("street"), Some(&json!("Jupiter Street")));
    assert_eq!(address.get("postalCode"), Some(&json!("1209")));

    assert_eq!(shaped.log.input, json!({ "lat": 14.5547, "lng": 121.0244 }));
    assert_eq!(&shaped.log.result, result.get("address").unwrap());
}

#[test]
fn given_reverse_body_without_location_when_shaped_then_response_parse_error() {
    let request = ReverseRequest { lat: 0.0, lng: 0.0 };

    let error = shape_reverse(&request, json!({ "results": [] })).unwrap_err();

    assert!(matches!(error, GeocodeError::ResponseParse { .. }));
    assert_eq!(error.name(), "ResponseParseError");
}

#[test]
fn given_reverse_location_that_is_not_an_object_when_shaped_then_response_parse_error() {
    let request = ReverseRequest { lat: 0.0, lng: 0.0 };
    let body = json!({ "results": [{ "locations": ["Makati"] }] });

    let error = shape_reverse(&request, body).unwrap_err();

    assert!(matches!(error, GeocodeError::ResponseParse { .. }));
}
