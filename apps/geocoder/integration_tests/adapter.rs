use geocoder::adapter::run;
use geocoder::supervisor::{EXIT_FAILURE, EXIT_OK};

use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// End-to-end tests: config.json on disk, host envelopes over pipes, MapQuest
// served by wiremock
// ============================================================================

/// Test helper: Write a config.json pointing both endpoints at `base_url`.
fn write_config(dir: &Path, base_url: &str, default_type: &str) {
    let config = json!({
        "version": 1,
        "geocoding": {
            "default_type": default_type,
            "geocode_url": format!("{base_url}/geocoding/v1/address"),
            "reverse_geocode_url": format!("{base_url}/geocoding/v1/reverse"),
            "request_timeout_secs": 5
        },
        "logging": { "level": "debug" }
    });
    std::fs::write(dir.join("config.json"), config.to_string()).unwrap();
}

/// Test helper: Boot the adapter, feed it `lines`, close input and collect
/// everything it wrote.
async fn run_adapter(config_dir: &Path, lines: &[Value]) -> (i32, Vec<Value>) {
    let (mut host_input, adapter_input) = duplex(64 * 1024);
    let (adapter_output, host_output) = duplex(64 * 1024);

    let config_dir = config_dir.to_path_buf();
    let adapter =
        tokio::spawn(async move { run(adapter_input, adapter_output, &config_dir).await });

    let mut output = BufReader::new(host_output).lines();
    let mut messages = Vec::new();

    for line in lines {
        let is_data = line["type"] == "data";
        host_input
            .write_all(format!("{line}\n").as_bytes())
            .await
            .unwrap();

        // Wait for the result and its log so later envelopes are ordered after it
        if is_data {
            let mut seen_result = false;
            while let Some(next) = output.next_line().await.unwrap() {
                let message: Value = serde_json::from_str(&next).unwrap();
                let done = seen_result && message["type"] == "log";
                seen_result |= message["type"] == "result";
                messages.push(message);
                if done {
                    break;
                }
            }
        }
    }
    drop(host_input);

    let status = adapter.await.unwrap();
    while let Some(next) = output.next_line().await.unwrap() {
        messages.push(serde_json::from_str(&next).unwrap());
    }

    (status, messages)
}

fn kinds(messages: &[Value]) -> Vec<&str> {
    messages
        .iter()
        .map(|m| m["type"].as_str().unwrap_or("?"))
        .collect()
}

/// **VALUE**: Tests the full boot path from config.json to a geocoded result.
///
/// **WHY THIS MATTERS**: This is the only test that exercises config loading,
/// logger setup, dispatcher construction and supervision together, the way
/// the binary runs them.
///
/// **BUG THIS CATCHES**: Would catch if the configured endpoint is ignored,
/// or if a clean shutdown does not exit with status 0.
#[tokio::test]
async fn given_config_file_when_forward_request_sent_then_result_from_configured_endpoint() {
    // GIVEN: A mock MapQuest and a config pointing at it
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocoding/v1/address"))
        .and(query_param("key", "e2e-key"))
        .and(query_param("location", "1 Infinite Loop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "locations": [{ "latLng": { "lat": 37.33, "lng": -122.03 } }] }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config_dir = TempDir::new().unwrap();
    write_config(config_dir.path(), &server.uri(), "Forward");

    // WHEN: The host handshakes without a type, sends one request and closes
    let (status, messages) = run_adapter(
        config_dir.path(),
        &[
            json!({ "type": "ready", "data": { "options": { "apikey": "e2e-key" } } }),
            json!({ "type": "data", "data": { "address": "1 Infinite Loop", "requestId": "r1" } }),
            json!({ "type": "close" }),
        ],
    )
    .await;

    // THEN: Initialization log, ready, result, result log, close ack; exit 0
    assert_eq!(status, EXIT_OK);
    assert_eq!(
        kinds(&messages),
        vec!["log", "ready", "result", "log", "close"]
    );
    let result: Value = serde_json::from_str(messages[2]["data"].as_str().unwrap()).unwrap();
    assert_eq!(result, json!({ "lat": 37.33, "lng": -122.03 }));
}

/// **VALUE**: Tests that the configured default type applies when ready names none.
///
/// **WHY THIS MATTERS**: Deployments that only ever reverse-geocode set the
/// default once in config.json instead of in every host.
///
/// **BUG THIS CATCHES**: Would catch if the session ignores `default_type`
/// and always falls back to forward.
#[tokio::test]
async fn given_reverse_default_when_ready_has_no_type_then_reverse_endpoint_used() {
    // GIVEN: A mock reverse endpoint and a reverse default
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocoding/v1/reverse"))
        .and(query_param("location", "1.5,2.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "locations": [{
                "street": "Main St",
                "latLng": { "lat": 1.5, "lng": 2.5 },
                "displayLatLng": { "lat": 1.5, "lng": 2.5 }
            }] }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config_dir = TempDir::new().unwrap();
    write_config(config_dir.path(), &server.uri(), "Reverse");

    // WHEN: Ready without a type, then a lat/lng request
    let (status, messages) = run_adapter(
        config_dir.path(),
        &[
            json!({ "type": "ready", "data": { "options": { "apikey": "k" } } }),
            json!({ "type": "data", "data": { "lat": 1.5, "lng": 2.5 } }),
        ],
    )
    .await;

    // THEN: Stripped address record
    assert_eq!(status, EXIT_OK);
    let result_message = messages
        .iter()
        .find(|m| m["type"] == "result")
        .expect("No result envelope");
    let result: Value = serde_json::from_str(result_message["data"].as_str().unwrap()).unwrap();
    assert_eq!(result, json!({ "address": { "street": "Main St" } }));
}

/// **VALUE**: Tests that an invalid config.json is reported to the host before exiting.
///
/// **WHY THIS MATTERS**: A host waiting for `ready` would hang forever if the
/// adapter died on a typo in its config without saying anything.
///
/// **BUG THIS CATCHES**: Would catch if startup failures bypass the channel,
/// or if they exit with status 0.
#[tokio::test]
async fn given_invalid_config_when_started_then_reports_startup_error_and_fails() {
    // GIVEN: A config with an unsupported endpoint scheme
    let config_dir = TempDir::new().unwrap();
    std::fs::write(
        config_dir.path().join("config.json"),
        json!({ "version": 1, "geocoding": { "geocode_url": "ftp://example.com" } }).to_string(),
    )
    .unwrap();

    // WHEN: Starting the adapter
    let (status, messages) = run_adapter(config_dir.path(), &[]).await;

    // THEN: Exactly one StartupError envelope and a failure status
    assert_eq!(status, EXIT_FAILURE);
    assert_eq!(kinds(&messages), vec!["error"]);
    assert_eq!(messages[0]["data"]["name"], "StartupError");
    assert!(
        messages[0]["data"]["message"]
            .as_str()
            .unwrap()
            .contains("scheme"),
        "got {messages:?}"
    );
}
