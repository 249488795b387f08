use crate::HttpStatusCode;

/// **VALUE**: Verifies that only 200 counts as a usable upstream response.
///
/// **WHY THIS MATTERS**: The dispatcher treats every other status, including other
/// 2xx codes, as an upstream failure.
///
/// **BUG THIS CATCHES**: Would catch if `is_ok` were widened to the whole 2xx range.
#[test]
fn given_status_codes_when_checked_for_ok_then_only_200_passes() {
    assert!(HttpStatusCode(200).is_ok());
    assert!(!HttpStatusCode(201).is_ok());
    assert!(!HttpStatusCode(204).is_ok());
    assert!(!HttpStatusCode(500).is_ok());
}

#[test]
fn given_status_codes_when_classified_then_ranges_are_respected() {
    assert!(HttpStatusCode(401).is_client_error());
    assert!(!HttpStatusCode(401).is_server_error());
    assert!(HttpStatusCode(503).is_server_error());
    assert!(!HttpStatusCode(503).is_client_error());
    assert!(!HttpStatusCode(302).is_client_error());
}

#[test]
fn given_status_code_when_displayed_then_prints_number() {
    assert_eq!(HttpStatusCode::from(404).to_string(), "404");
}
