// Unit tests for envelope decoding and encoding
// These pin the wire format the host depends on

use crate::error::ErrorReport;
use crate::host_channel::{InboundEnvelope, OutboundEnvelope};

use serde_json::{Value, json};

/// **VALUE**: Verifies a full ready handshake decodes both options.
///
/// **WHY THIS MATTERS**: The handshake is the only source of the API key and mode.
///
/// **BUG THIS CATCHES**: Would catch a field rename (`geocoding_type` vs `geocodingType`).
#[test]
fn given_ready_line_when_decoded_then_options_are_extracted() {
    let line = r#"{"type":"ready","data":{"options":{"apikey":"K","geocoding_type":"Reverse"}}}"#;

    let envelope = InboundEnvelope::decode(line).unwrap();

    let InboundEnvelope::Ready(options) = envelope else {
        panic!("Expected Ready, got {envelope:?}");
    };
    assert_eq!(options.apikey.as_deref(), Some("K"));
    assert_eq!(options.geocoding_type.as_deref(), Some("Reverse"));
}

#[test]
fn given_ready_line_without_options_when_decoded_then_options_are_empty() {
    let envelope = InboundEnvelope::decode(r#"{"type":"ready"}"#).unwrap();

    let InboundEnvelope::Ready(options) = envelope else {
        panic!("Expected Ready");
    };
    assert!(options.apikey.is_none());
    assert!(options.geocoding_type.is_none());
}

/// **VALUE**: Verifies extra envelope fields such as `requestId` are tolerated.
///
/// **WHY THIS MATTERS**: The host's transport attaches correlation ids we do not use.
/// Rejecting them would drop every data message and leave the host waiting.
///
/// **BUG THIS CATCHES**: Would catch `deny_unknown_fields` being added to the envelope.
#[test]
fn given_data_line_with_request_id_when_decoded_then_payload_is_kept() {
    let line = r#"{"type":"data","requestId":"1700000000000","data":{"address":"Makati"}}"#;

    let envelope = InboundEnvelope::decode(line).unwrap();

    let InboundEnvelope::Data(payload) = envelope else {
        panic!("Expected Data");
    };
    assert_eq!(payload, json!({ "address": "Makati" }));
}

#[test]
fn given_data_line_without_payload_when_decoded_then_payload_is_null() {
    let envelope = InboundEnvelope::decode(r#"{"type":"data"}"#).unwrap();

    assert!(matches!(envelope, InboundEnvelope::Data(Value::Null)));
}

#[test]
fn given_close_line_when_decoded_then_close() {
    let envelope = InboundEnvelope::decode(r#"{"type":"close"}"#).unwrap();

    assert!(matches!(envelope, InboundEnvelope::Close));
}

#[test]
fn given_garbage_or_unknown_type_when_decoded_then_error() {
    assert!(InboundEnvelope::decode("not json").is_err());
    assert!(InboundEnvelope::decode(r#"{"data":{}}"#).is_err());
    assert!(InboundEnvelope::decode(r#"{"type":"restart"}"#).is_err());
}

/// **VALUE**: Verifies outbound envelopes serialize to the host's expected shapes.
///
/// **WHY THIS MATTERS**: The host matches on `type` and reads `data`; a serde tagging
/// change would silently break every message.
///
/// **BUG THIS CATCHES**: Would catch switching to external tagging or capitalized tags.
#[test]
fn given_outbound_envelopes_when_serialized_then_match_wire_format() {
    let ready = serde_json::to_value(OutboundEnvelope::Ready).unwrap();
    assert_eq!(ready, json!({ "type": "ready" }));

    let close = serde_json::to_value(OutboundEnvelope::Close).unwrap();
    assert_eq!(close, json!({ "type": "close" }));

    let result = serde_json::to_value(OutboundEnvelope::Result(String::from("{}"))).unwrap();
    assert_eq!(result, json!({ "type": "result", "data": "{}" }));

    let log = serde_json::to_value(OutboundEnvelope::Log(String::from("hello"))).unwrap();
    assert_eq!(log, json!({ "type": "log", "data": "hello" }));

    let error = serde_json::to_value(OutboundEnvelope::Error(ErrorReport {
        name: String::from("UpstreamError"),
        message: String::from("Internal Server Error"),
        stack: String::from("UpstreamError: Internal Server Error"),
    }))
    .unwrap();
    assert_eq!(
        error,
        json!({
            "type": "error",
            "data": {
                "name": "UpstreamError",
                "message": "Internal Server Error",
                "stack": "UpstreamError: Internal Server Error"
            }
        })
    );
}

#[test]
fn given_ready_options_when_debug_formatted_then_api_key_is_hidden() {
    let line = r#"{"type":"ready","data":{"options":{"apikey":"secret-key"}}}"#;
    let InboundEnvelope::Ready(options) = InboundEnvelope::decode(line).unwrap() else {
        panic!("Expected Ready");
    };

    let debug = format!("{options:?}");

    assert!(!debug.contains("secret-key"));
}
