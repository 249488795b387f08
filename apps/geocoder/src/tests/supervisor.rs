// Unit tests for the fatal-error supervisor
// Drives supervise() over in-memory pipes with minimal handlers

use crate::supervisor::{EXIT_FAILURE, EXIT_OK, supervise};

use geocoder_core::host_channel::{HostChannel, HostEventHandler, ReadyOptions};

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};

struct PanicOnReady;

impl HostEventHandler for PanicOnReady {
    async fn on_ready(&self, _options: ReadyOptions) {
        panic!("ready handler exploded");
    }

    async fn on_data(&self, _payload: Value) {}

    async fn on_close(&self) {}
}

struct PanicOnData;

impl HostEventHandler for PanicOnData {
    async fn on_ready(&self, _options: ReadyOptions) {}

    async fn on_data(&self, _payload: Value) {
        panic!("dispatch exploded");
    }

    async fn on_close(&self) {}
}

/// Test helper: Run supervise() with `lines` as the whole host input.
async fn supervise_lines<H: HostEventHandler>(handler: H, lines: &[&str]) -> (i32, Vec<Value>) {
    let (mut host_input, adapter_input) = duplex(16 * 1024);
    let (adapter_output, host_output) = duplex(16 * 1024);

    let channel: HostChannel<DuplexStream> = HostChannel::new(adapter_input, adapter_output);
    let supervised = tokio::spawn(supervise(channel, Arc::new(handler)));

    for line in lines {
        host_input.write_all(line.as_bytes()).await.unwrap();
        host_input.write_all(b"\n").await.unwrap();
    }
    drop(host_input);

    let status = supervised.await.unwrap();

    let mut messages = Vec::new();
    let mut output = BufReader::new(host_output).lines();
    while let Some(line) = output.next_line().await.unwrap() {
        messages.push(serde_json::from_str(&line).unwrap());
    }

    (status, messages)
}

/// **VALUE**: Verifies that a clean end of input exits with status 0 and no error.
///
/// **WHY THIS MATTERS**: Hosts close stdin to stop the adapter. Treating that
/// as a failure would spam the host with bogus fatal errors on every shutdown.
///
/// **BUG THIS CATCHES**: Would catch if EOF is mapped to the failure path.
#[tokio::test]
async fn given_host_closes_input_when_supervised_then_exits_ok() {
    // GIVEN: A handler that does nothing wrong

    // WHEN: The host sends nothing and closes its end
    let (status, messages) = supervise_lines(PanicOnData, &[]).await;

    // THEN: Exit 0, nothing written
    assert_eq!(status, EXIT_OK);
    assert!(messages.is_empty(), "got {messages:?}");
}

/// **VALUE**: Verifies that a panic inside a dispatch becomes a FatalError report.
///
/// **WHY THIS MATTERS**: The host must never be left waiting on an adapter
/// that died silently. The error envelope tells it why the process exits.
///
/// **BUG THIS CATCHES**: Would catch if TaskPanicked from the channel is not
/// reported, or if the process would exit with status 0.
#[tokio::test]
async fn given_dispatch_panics_when_supervised_then_reports_fatal_error() {
    // GIVEN: A handler that panics on data

    // WHEN: One data envelope arrives
    let (status, messages) =
        supervise_lines(PanicOnData, &[r#"{"type":"data","data":{"address":"x"}}"#]).await;

    // THEN: Exit 1 with a FatalError envelope
    assert_eq!(status, EXIT_FAILURE);
    assert_eq!(messages.len(), 1, "got {messages:?}");
    assert_eq!(messages[0]["type"], "error");
    assert_eq!(messages[0]["data"]["name"], "FatalError");
    assert!(
        messages[0]["data"]["message"]
            .as_str()
            .unwrap()
            .contains("dispatch exploded"),
        "got {messages:?}"
    );
}

/// **VALUE**: Verifies that a panic in the inline ready handler is also caught.
///
/// **WHY THIS MATTERS**: `on_ready` runs on the read loop itself, so its panic
/// takes the whole loop down rather than a single dispatch task.
///
/// **BUG THIS CATCHES**: Would catch if supervise() awaited the read loop
/// directly instead of through a task, letting the panic unwind past it.
#[tokio::test]
async fn given_ready_handler_panics_when_supervised_then_reports_fatal_error() {
    // GIVEN: A handler that panics on ready

    // WHEN: The host sends ready
    let (status, messages) = supervise_lines(
        PanicOnReady,
        &[r#"{"type":"ready","data":{"options":{}}}"#],
    )
    .await;

    // THEN: Exit 1 with a FatalError envelope
    assert_eq!(status, EXIT_FAILURE);
    assert_eq!(messages.len(), 1, "got {messages:?}");
    assert_eq!(messages[0]["data"]["name"], "FatalError");
    assert!(
        messages[0]["data"]["message"]
            .as_str()
            .unwrap()
            .contains("panicked"),
        "got {messages:?}"
    );
}
