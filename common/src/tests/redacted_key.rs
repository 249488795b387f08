use crate::RedactedApiKey;

/// **VALUE**: Verifies the key never appears in Debug or Display output.
///
/// **WHY THIS MATTERS**: Session configuration is logged at startup; a derived Debug
/// would leak the customer's MapQuest key to stderr and the log file.
///
/// **BUG THIS CATCHES**: Would catch if someone replaces the manual impls with derives.
#[test]
fn given_api_key_when_formatted_then_value_is_hidden() {
    // GIVEN: A key with a recognizable value
    let key = RedactedApiKey::new(String::from("super-secret-key"));

    // WHEN: Formatting it both ways
    let debug = format!("{key:?}");
    let display = format!("{key}");

    // THEN: Neither contains the value
    assert!(!debug.contains("super-secret-key"));
    assert!(!display.contains("super-secret-key"));
    assert_eq!(key.expose(), "super-secret-key");
}

/// **VALUE**: Verifies serialization fails instead of emitting the key.
///
/// **WHY THIS MATTERS**: Log records are built with serde_json; embedding the session
/// configuration by accident must fail loudly.
///
/// **BUG THIS CATCHES**: Would catch if `Serialize` were derived.
#[test]
fn given_api_key_when_serialized_then_returns_error() {
    let key = RedactedApiKey::new(String::from("s3cr3t-value"));

    let result = serde_json::to_string(&key);

    let err = result.expect_err("Serialization must be refused");
    assert!(err.to_string().contains("Serialization Refused"), "got {err}");
    assert!(!err.to_string().contains("s3cr3t"), "got {err}");
}

#[test]
fn given_missing_key_when_converted_then_is_empty() {
    let key = RedactedApiKey::from(None);

    assert!(key.is_empty());
}
