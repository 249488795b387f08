// Unit tests for session configuration resolution

use crate::config::GeocodingMode;
use crate::dispatcher::SessionConfig;
use crate::host_channel::ReadyOptions;

fn options(apikey: Option<&str>, geocoding_type: Option<&str>) -> ReadyOptions {
    ReadyOptions {
        apikey: apikey.map(str::to_string),
        geocoding_type: geocoding_type.map(str::to_string),
    }
}

#[test]
fn given_explicit_mode_when_resolved_then_mode_is_used() {
    let session =
        SessionConfig::from_options(options(Some("K"), Some("Reverse")), GeocodingMode::Forward);

    assert_eq!(session.mode, GeocodingMode::Reverse);
    assert_eq!(session.api_key.expose(), "K");
}

/// **VALUE**: Verifies an absent mode falls back to the configured default.
///
/// **WHY THIS MATTERS**: Older hosts omit `geocoding_type` entirely.
///
/// **BUG THIS CATCHES**: Would catch a hard-coded `Forward` ignoring configuration.
#[test]
fn given_missing_mode_when_resolved_then_default_is_used() {
    let session = SessionConfig::from_options(options(Some("K"), None), GeocodingMode::Reverse);

    assert_eq!(session.mode, GeocodingMode::Reverse);
}

#[test]
fn given_unknown_mode_when_resolved_then_default_is_used() {
    let session =
        SessionConfig::from_options(options(Some("K"), Some("forward")), GeocodingMode::Forward);

    assert_eq!(session.mode, GeocodingMode::Forward);
}

#[test]
fn given_missing_api_key_when_resolved_then_key_is_empty() {
    let session =
        SessionConfig::from_options(options(None, Some("Forward")), GeocodingMode::Forward);

    assert!(session.api_key.is_empty());
}

#[test]
fn given_empty_api_key_when_resolved_then_key_is_empty() {
    let session = SessionConfig::from_options(options(Some(""), None), GeocodingMode::Forward);

    assert!(session.api_key.is_empty());
}
