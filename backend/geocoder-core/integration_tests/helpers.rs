//! Test helpers for driving the adapter the way the host does.
//!
//! - A `TestHost` owns the host ends of two in-memory pipes
//! - Upstream MapQuest endpoints are served by `wiremock`
//! - Output is collected until the adapter closes its side

use geocoder_core::config::{GeocodingMode, GeocodingSettings};
use geocoder_core::dispatcher::GeocodingDispatcher;
use geocoder_core::error::HostChannelError;
use geocoder_core::host_channel::{HostChannel, HostEventHandler};

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};
use tokio::task::JoinHandle;
use wiremock::MockServer;

pub const TEST_API_KEY: &str = "test-key-12345";
pub const GEOCODE_PATH: &str = "/geocoding/v1/address";
pub const REVERSE_GEOCODE_PATH: &str = "/geocoding/v1/reverse";

const PIPE_CAPACITY: usize = 64 * 1024;
const COLLECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestHost {
    input: Option<DuplexStream>,
    output: BufReader<DuplexStream>,
    run: JoinHandle<Result<(), HostChannelError>>,
}

impl TestHost {
    /// Test helper: Start a host channel around any handler.
    pub fn start<H, F>(make_handler: F) -> Self
    where
        H: HostEventHandler,
        F: FnOnce(&HostChannel<DuplexStream>) -> H,
    {
        let (host_input, adapter_input) = duplex(PIPE_CAPACITY);
        let (adapter_output, host_output) = duplex(PIPE_CAPACITY);

        let channel = HostChannel::new(adapter_input, adapter_output);
        let handler = Arc::new(make_handler(&channel));
        let run = tokio::spawn(channel.run(handler));

        Self {
            input: Some(host_input),
            output: BufReader::new(host_output),
            run,
        }
    }

    /// Test helper: Start the full adapter against a mock MapQuest server.
    pub fn start_adapter(server: &MockServer, default_mode: GeocodingMode) -> Self {
        let settings = settings_for(&server.uri(), default_mode);
        Self::start(|channel| {
            GeocodingDispatcher::new(channel.sender(), &settings)
                .expect("Failed to build dispatcher")
        })
    }

    /// Test helper: Write one raw line to the adapter.
    pub async fn send_line(&mut self, line: &str) {
        let input = self.input.as_mut().expect("Input already closed");
        input.write_all(line.as_bytes()).await.expect("Failed to write line");
        input.write_all(b"\n").await.expect("Failed to write newline");
    }

    /// Test helper: Write raw bytes to the adapter, newline included by the caller.
    pub async fn send_bytes(&mut self, bytes: &[u8]) {
        let input = self.input.as_mut().expect("Input already closed");
        input.write_all(bytes).await.expect("Failed to write bytes");
    }

    /// Test helper: Write one envelope to the adapter.
    pub async fn send(&mut self, envelope: Value) {
        self.send_line(&envelope.to_string()).await;
    }

    pub async fn send_ready(&mut self, geocoding_type: &str) {
        self.send(json!({
            "type": "ready",
            "data": { "options": { "apikey": TEST_API_KEY, "geocoding_type": geocoding_type } }
        }))
        .await;
    }

    pub async fn send_data(&mut self, data: Value) {
        self.send(json!({ "type": "data", "requestId": "1700000000000", "data": data }))
            .await;
    }

    /// Test helper: Read the next output line, if any arrives in time.
    pub async fn next_message(&mut self) -> Option<Value> {
        let mut line = String::new();
        let read = tokio::time::timeout(COLLECT_TIMEOUT, self.output.read_line(&mut line))
            .await
            .expect("Timed out waiting for adapter output")
            .expect("Failed to read adapter output");
        if read == 0 {
            return None;
        }
        Some(serde_json::from_str(&line).expect("Adapter wrote a non-JSON line"))
    }

    /// Test helper: Close host input, collect every remaining line until the
    /// adapter closes its output, and return the run outcome.
    pub async fn finish(mut self) -> (Vec<Value>, Result<(), HostChannelError>) {
        drop(self.input.take());

        let mut messages = Vec::new();
        while let Some(message) = self.next_message().await {
            messages.push(message);
        }

        let outcome = tokio::time::timeout(COLLECT_TIMEOUT, self.run)
            .await
            .expect("Timed out waiting for run to finish")
            .expect("Run task failed to join");

        (messages, outcome)
    }
}

/// Test helper: Serve exactly one request on a local port with a canned HTTP/1.1
/// status line and an empty body. Returns the base URL.
///
/// wiremock always writes canonical reason phrases, so custom ones need a raw socket.
pub fn serve_status_line_once(status_line: &'static str) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let address = listener.local_addr().expect("No local address");

    std::thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut chunk) {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&chunk[..n]),
            }
        }
        let response =
            format!("{status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let _ = stream.write_all(response.as_bytes());
    });

    format!("http://{address}")
}

pub fn settings_for(base_url: &str, default_mode: GeocodingMode) -> GeocodingSettings {
    GeocodingSettings {
        default_type: default_mode,
        geocode_url: format!("{base_url}{GEOCODE_PATH}"),
        reverse_geocode_url: format!("{base_url}{REVERSE_GEOCODE_PATH}"),
        request_timeout_secs: Some(5),
    }
}

/// Test helper: All messages of one `type`, in order.
pub fn of_type<'a>(messages: &'a [Value], kind: &str) -> Vec<&'a Value> {
    messages
        .iter()
        .filter(|m| m.get("type").and_then(Value::as_str) == Some(kind))
        .collect()
}

/// Test helper: The `type` of every message, in order.
pub fn kinds(messages: &[Value]) -> Vec<&str> {
    messages
        .iter()
        .filter_map(|m| m.get("type").and_then(Value::as_str))
        .collect()
}

/// Test helper: Parse the JSON text carried by a `result` envelope.
pub fn result_payload(message: &Value) -> Value {
    let text = message
        .get("data")
        .and_then(Value::as_str)
        .expect("result data must be a string");
    serde_json::from_str(text).expect("result data must be valid JSON text")
}

pub fn forward_body() -> Value {
    json!({
        "info": { "statuscode": 0 },
        "results": [{
            "providedLocation": { "location": "10 Jupiter St, Bel-Air, Makati, PH 1209" },
            "locations": [{
                "street": "10 Jupiter St",
                "adminArea5": "Makati",
                "latLng": { "lat": 14.5606, "lng": 121.0293 },
                "displayLatLng": { "lat": 14.5606, "lng": 121.0293 }
            }]
        }]
    })
}

pub fn reverse_body() -> Value {
    json!({
        "info": { "statuscode": 0 },
        "results": [{
            "providedLocation": { "latLng": { "lat": 14.5606, "lng": 121.0293 } },
            "locations": [{
                "street": "Jupiter Street",
                "adminArea5": "Makati",
                "adminArea1": "PH",
                "postalCode": "1209",
                "latLng": { "lat": 14.5606, "lng": 121.0293 },
                "displayLatLng": { "lat": 14.5606, "lng": 121.0293 }
            }]
        }]
    })
}
