use crate::helpers::{
    GEOCODE_PATH, REVERSE_GEOCODE_PATH, TEST_API_KEY, TestHost, forward_body, kinds, of_type,
    result_payload, reverse_body, serve_status_line_once, settings_for,
};

use geocoder_core::config::GeocodingMode;
use geocoder_core::dispatcher::{GeocodingDispatcher, INITIALIZED_MESSAGE};

use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JUPITER_ADDRESS: &str = "10 Jupiter St, Bel-Air, Makati, PH 1209";

// ============================================================================
// Handshake
// ============================================================================

/// **VALUE**: Verifies the handshake produces the initialization log and exactly one
/// ready acknowledgement, in that order.
///
/// **WHY THIS MATTERS**: The host waits for `ready` before sending any data. A missing
/// acknowledgement stalls the pipeline; a duplicate confuses the host's state machine.
///
/// **BUG THIS CATCHES**: Would catch `notify_ready` being sent before configuration is
/// stored, or being sent again on a repeated handshake.
#[tokio::test]
async fn given_two_ready_envelopes_when_handled_then_acknowledged_once() {
    // GIVEN: A running adapter
    let server = MockServer::start().await;
    let mut host = TestHost::start_adapter(&server, GeocodingMode::Forward);

    // WHEN: The host sends the handshake twice
    host.send_ready("Forward").await;
    host.send_ready("Reverse").await;
    let (messages, outcome) = host.finish().await;

    // THEN: One log line, then one ready
    assert!(outcome.is_ok());
    assert_eq!(kinds(&messages), vec!["log", "ready"]);
    assert_eq!(messages[0]["data"], json!(INITIALIZED_MESSAGE));
}

// ============================================================================
// Forward geocoding
// ============================================================================

/// **VALUE**: End-to-end forward geocoding of a resolvable address.
///
/// **WHY THIS MATTERS**: This is the adapter's primary job. The host parses the result
/// text and reads numeric `lat`/`lng` from it.
///
/// **BUG THIS CATCHES**: Would catch:
/// - The API key or address missing from the query string
/// - The wrong path being extracted from the response
/// - The result being sent as a JSON object instead of JSON text
#[tokio::test]
async fn given_forward_mode_when_address_resolves_then_result_has_numeric_lat_lng() {
    // GIVEN: MapQuest answers for the address with our key
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .and(query_param("key", TEST_API_KEY))
        .and(query_param("location", JUPITER_ADDRESS))
        .respond_with(ResponseTemplate::new(200).set_body_json(forward_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut host = TestHost::start_adapter(&server, GeocodingMode::Forward);
    host.send_ready("Forward").await;

    // WHEN: The host sends one address
    host.send_data(json!({ "address": JUPITER_ADDRESS })).await;
    let (messages, outcome) = host.finish().await;

    // THEN: result followed by the log record, no error
    assert!(outcome.is_ok());
    assert_eq!(kinds(&messages), vec!["log", "ready", "result", "log"]);

    let result = result_payload(of_type(&messages, "result")[0]);
    assert!(result["lat"].is_number(), "Latitude data invalid.");
    assert!(result["lng"].is_number(), "Longitude data invalid.");

    let record: Value =
        serde_json::from_str(messages[3]["data"].as_str().unwrap()).unwrap();
    assert_eq!(record["title"], json!("Mapquest Geocoding Service Result"));
    assert_eq!(record["input"], json!({ "address": JUPITER_ADDRESS }));
    assert_eq!(record["result"], forward_body());
}

#[tokio::test]
async fn given_forward_mode_when_no_match_then_result_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "results": [{ "locations": [] }] })),
        )
        .mount(&server)
        .await;

    let mut host = TestHost::start_adapter(&server, GeocodingMode::Forward);
    host.send_ready("Forward").await;
    host.send_data(json!({ "address": "Nowhere" })).await;
    let (messages, _) = host.finish().await;

    let results = of_type(&messages, "result");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["data"], json!("null"));
    assert!(of_type(&messages, "error").is_empty());
}

#[tokio::test]
async fn given_forward_mode_when_address_is_not_a_string_then_invalid_input_and_no_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forward_body()))
        .expect(0)
        .mount(&server)
        .await;

    let mut host = TestHost::start_adapter(&server, GeocodingMode::Forward);
    host.send_ready("Forward").await;
    host.send_data(json!({ "address": 1209 })).await;
    let (messages, _) = host.finish().await;

    let errors = of_type(&messages, "error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["data"]["name"], json!("InvalidInput"));
    assert_eq!(errors[0]["data"]["message"], json!("Invalid address."));
    assert_eq!(of_type(&messages, "result")[0]["data"], json!("{}"));
}

// ============================================================================
// Reverse geocoding
// ============================================================================

/// **VALUE**: Verifies the reverse record reaches the host without coordinate fields.
///
/// **WHY THIS MATTERS**: The host merges the address record into the device's data;
/// leaked `latLng`/`displayLatLng` would overwrite its own coordinates.
///
/// **BUG THIS CATCHES**: Would catch the stripping step being skipped or applied to the
/// log record only.
#[tokio::test]
async fn given_reverse_mode_when_coordinates_resolve_then_record_is_stripped() {
    // GIVEN: MapQuest answers for the coordinate pair
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REVERSE_GEOCODE_PATH))
        .and(query_param("key", TEST_API_KEY))
        .and(query_param("location", "14.5606,121.0293"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reverse_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut host = TestHost::start_adapter(&server, GeocodingMode::Forward);
    host.send_ready("Reverse").await;

    // WHEN: The host sends coordinates
    host.send_data(json!({ "lat": 14.5606, "lng": 121.0293 })).await;
    let (messages, _) = host.finish().await;

    // THEN: The address record has no coordinate fields
    let result = result_payload(of_type(&messages, "result")[0]);
    let address = result["address"].as_object().expect("address must be an object");
    assert!(!address.contains_key("latLng"));
    assert!(!address.contains_key("displayLatLng"));
    assert_eq!(address["postalCode"], json!("1209"));
    assert!(of_type(&messages, "error").is_empty());

    let record: Value =
        serde_json::from_str(of_type(&messages, "log")[1]["data"].as_str().unwrap()).unwrap();
    assert_eq!(record["input"], json!({ "lat": 14.5606, "lng": 121.0293 }));
    assert!(record["result"].get("latLng").is_none());
}

/// **VALUE**: Scenario B. Out-of-range latitude yields an error and the empty result.
///
/// **WHY THIS MATTERS**: The host always expects a result per data message; invalid
/// input must not leave it waiting, nor spend an upstream call.
///
/// **BUG THIS CATCHES**: Would catch validation being skipped (an upstream call is
/// made) or the result being omitted on the error path.
#[tokio::test]
async fn given_reverse_mode_when_latitude_out_of_range_then_error_and_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reverse_body()))
        .expect(0)
        .mount(&server)
        .await;

    let mut host = TestHost::start_adapter(&server, GeocodingMode::Reverse);
    host.send_ready("Reverse").await;
    host.send_data(json!({ "lat": 95, "lng": 10 })).await;
    let (messages, _) = host.finish().await;

    let errors = of_type(&messages, "error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["data"]["name"], json!("InvalidInput"));
    let message = errors[0]["data"]["message"].as_str().unwrap();
    assert!(message.contains("Latitude (lat) and Longitude (lng) are not valid"));
    assert!(message.contains("lat: 95"));
    assert!(message.contains("lng:10"));
    assert!(errors[0]["data"]["stack"].is_string());

    let results = of_type(&messages, "result");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["data"], json!("{}"));
}

#[tokio::test]
async fn given_reverse_mode_when_body_has_no_location_then_response_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REVERSE_GEOCODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let mut host = TestHost::start_adapter(&server, GeocodingMode::Reverse);
    host.send_ready("Reverse").await;
    host.send_data(json!({ "lat": 0, "lng": 0 })).await;
    let (messages, _) = host.finish().await;

    assert_eq!(of_type(&messages, "error")[0]["data"]["name"], json!("ResponseParseError"));
    assert_eq!(of_type(&messages, "result")[0]["data"], json!("{}"));
}

// ============================================================================
// Upstream and transport failures
// ============================================================================

/// **VALUE**: Scenario C. A 500 from MapQuest is reported with the status line.
///
/// **WHY THIS MATTERS**: Operators diagnose upstream outages from this message.
///
/// **BUG THIS CATCHES**: Would catch non-200 bodies being parsed as if they succeeded,
/// or the message carrying the Display prefix instead of the status line.
#[tokio::test]
async fn given_upstream_500_when_dispatched_then_error_has_status_line_and_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let mut host = TestHost::start_adapter(&server, GeocodingMode::Forward);
    host.send_ready("Forward").await;
    host.send_data(json!({ "address": JUPITER_ADDRESS })).await;
    let (messages, _) = host.finish().await;

    let errors = of_type(&messages, "error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["data"]["name"], json!("UpstreamError"));
    assert_eq!(errors[0]["data"]["message"], json!("Internal Server Error"));

    let results = of_type(&messages, "result");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["data"], json!("{}"));
}

/// **VALUE**: Verifies the error message is the reason phrase the server actually sent.
///
/// **WHY THIS MATTERS**: Gateways in front of the geocoding service put the useful hint
/// in a custom reason phrase ("Key Quota Exceeded"), not in the numeric code.
///
/// **BUG THIS CATCHES**: Would catch the message falling back to the canonical phrase
/// for the code even though the server said something more specific.
#[tokio::test]
async fn given_custom_reason_phrase_when_dispatched_then_error_message_uses_it() {
    // GIVEN: An upstream answering 403 with its own reason phrase
    let base_url = serve_status_line_once("HTTP/1.1 403 Key Quota Exceeded");
    let mut host = TestHost::start(|channel| {
        GeocodingDispatcher::new(
            channel.sender(),
            &settings_for(&base_url, GeocodingMode::Forward),
        )
        .expect("Failed to build dispatcher")
    });

    // WHEN: One forward request
    host.send_ready("Forward").await;
    host.send_data(json!({ "address": JUPITER_ADDRESS })).await;
    let (messages, _) = host.finish().await;

    // THEN: UpstreamError carrying the sent phrase, then the empty result
    let errors = of_type(&messages, "error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["data"]["name"], json!("UpstreamError"));
    assert_eq!(errors[0]["data"]["message"], json!("Key Quota Exceeded"));
    assert_eq!(of_type(&messages, "result")[0]["data"], json!("{}"));
}

#[tokio::test]
async fn given_unknown_status_without_reason_when_dispatched_then_message_is_code() {
    let base_url = serve_status_line_once("HTTP/1.1 599 ");
    let mut host = TestHost::start(|channel| {
        GeocodingDispatcher::new(
            channel.sender(),
            &settings_for(&base_url, GeocodingMode::Forward),
        )
        .expect("Failed to build dispatcher")
    });

    host.send_ready("Forward").await;
    host.send_data(json!({ "address": JUPITER_ADDRESS })).await;
    let (messages, _) = host.finish().await;

    assert_eq!(of_type(&messages, "error")[0]["data"]["message"], json!("599"));
}

#[tokio::test]
async fn given_non_json_body_when_dispatched_then_response_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let mut host = TestHost::start_adapter(&server, GeocodingMode::Forward);
    host.send_ready("Forward").await;
    host.send_data(json!({ "address": JUPITER_ADDRESS })).await;
    let (messages, _) = host.finish().await;

    assert_eq!(of_type(&messages, "error")[0]["data"]["name"], json!("ResponseParseError"));
    assert_eq!(of_type(&messages, "result")[0]["data"], json!("{}"));
}

/// **VALUE**: Verifies an unreachable upstream becomes a TransportError, and the API key
/// does not leak into the message.
///
/// **WHY THIS MATTERS**: reqwest includes the request URL in its errors, and the URL
/// carries the key. Error reports fan out to every exception handler on the host.
///
/// **BUG THIS CATCHES**: Would catch `without_url()` being removed from the conversion.
#[tokio::test]
async fn given_unreachable_upstream_when_dispatched_then_transport_error_without_key() {
    // GIVEN: A port that was just released, so nothing listens on it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let settings =
        crate::helpers::settings_for(&format!("http://127.0.0.1:{port}"), GeocodingMode::Forward);
    let mut host = TestHost::start(|channel| {
        geocoder_core::dispatcher::GeocodingDispatcher::new(channel.sender(), &settings)
            .expect("Failed to build dispatcher")
    });
    host.send_ready("Forward").await;
    host.send_data(json!({ "address": JUPITER_ADDRESS })).await;
    let (messages, _) = host.finish().await;

    let errors = of_type(&messages, "error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["data"]["name"], json!("TransportError"));
    assert!(!errors[0].to_string().contains(TEST_API_KEY));
    assert_eq!(of_type(&messages, "result")[0]["data"], json!("{}"));
}

// ============================================================================
// Lifecycle and concurrency
// ============================================================================

#[tokio::test]
async fn given_data_before_ready_when_dispatched_then_error_and_empty_result() {
    let server = MockServer::start().await;
    let mut host = TestHost::start_adapter(&server, GeocodingMode::Forward);

    host.send_data(json!({ "address": JUPITER_ADDRESS })).await;
    let (messages, _) = host.finish().await;

    assert_eq!(kinds(&messages), vec!["error", "result"]);
    assert_eq!(messages[0]["data"]["name"], json!("InvalidInput"));
    assert_eq!(messages[1]["data"], json!("{}"));
}

/// **VALUE**: Verifies every data message gets exactly one result, even when upstream
/// calls overlap and complete out of order.
///
/// **WHY THIS MATTERS**: Dispatches are not queued; a slow request must not block or
/// swallow a fast one, and graceful shutdown must wait for all of them.
///
/// **BUG THIS CATCHES**: Would catch dispatches being serialized, lost on shutdown, or
/// answered twice.
#[tokio::test]
async fn given_overlapping_requests_when_dispatched_then_one_result_each() {
    // GIVEN: One slow and one fast address
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .and(query_param("location", "slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forward_body())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .and(query_param("location", "fast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut host = TestHost::start_adapter(&server, GeocodingMode::Forward);
    host.send_ready("Forward").await;

    // WHEN: Both go out back to back, plus one invalid request
    host.send_data(json!({ "address": "slow" })).await;
    host.send_data(json!({ "address": "fast" })).await;
    host.send_data(json!({ "address": false })).await;
    let (messages, outcome) = host.finish().await;

    // THEN: Three results, two errors, and the slow success lands last
    assert!(outcome.is_ok());
    let results = of_type(&messages, "result");
    assert_eq!(results.len(), 3);
    assert_eq!(of_type(&messages, "error").len(), 2);
    let last_result = results.last().unwrap();
    assert!(result_payload(last_result)["lat"].is_number());
}

/// **VALUE**: Verifies a line that is not valid UTF-8 is skipped without ending the
/// channel or dropping dispatches already in flight.
///
/// **WHY THIS MATTERS**: Every data message is owed exactly one result. A stray byte
/// sequence from the host must cost one ignored line, not every pending answer.
///
/// **BUG THIS CATCHES**: Would catch the decoder's `InvalidData` error being treated as
/// a broken input stream, which aborts the in-flight tasks and exits the read loop.
#[tokio::test]
async fn given_invalid_utf8_line_when_requests_in_flight_then_each_still_gets_result() {
    // GIVEN: A slow upstream so the first request is still pending
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forward_body())
                .set_delay(Duration::from_millis(300)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut host = TestHost::start_adapter(&server, GeocodingMode::Forward);
    host.send_ready("Forward").await;

    // WHEN: A request, a garbage line, then another request
    host.send_data(json!({ "address": "first" })).await;
    host.send_bytes(b"\xff\xfe not utf8\n").await;
    host.send_data(json!({ "address": "second" })).await;
    let (messages, outcome) = host.finish().await;

    // THEN: The channel ends cleanly and both requests are answered
    assert!(outcome.is_ok(), "got {outcome:?}");
    let results = of_type(&messages, "result");
    assert_eq!(results.len(), 2, "got {messages:?}");
    assert!(of_type(&messages, "error").is_empty(), "got {messages:?}");
    for result in results {
        assert!(result_payload(result)["lat"].is_number());
    }
}

#[tokio::test]
async fn given_close_envelopes_when_handled_then_acknowledged_once() {
    let server = MockServer::start().await;
    let mut host = TestHost::start_adapter(&server, GeocodingMode::Forward);

    host.send_ready("Forward").await;
    host.send(json!({ "type": "close" })).await;
    host.send(json!({ "type": "close" })).await;
    let (messages, outcome) = host.finish().await;

    assert!(outcome.is_ok());
    assert_eq!(kinds(&messages), vec!["log", "ready", "close"]);
}
