use crate::helpers::{TestHost, kinds};

use geocoder_core::error::{ChannelError, ErrorReport, HostChannelError};
use geocoder_core::host_channel::{HostChannel, HostEventHandler, HostSender, ReadyOptions};

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncWrite, AsyncWriteExt, duplex};

/// Handler that counts events and optionally exercises the sender.
struct RecordingHandler {
    sender: HostSender,
    counts: Arc<EventCounts>,
    panic_on_data: bool,
}

#[derive(Default)]
struct EventCounts {
    ready: AtomicUsize,
    data: AtomicUsize,
    close: AtomicUsize,
}

impl HostEventHandler for RecordingHandler {
    async fn on_ready(&self, _options: ReadyOptions) {
        self.counts.ready.fetch_add(1, Ordering::SeqCst);
        self.sender.notify_ready().wait().await.unwrap();
    }

    async fn on_data(&self, payload: Value) {
        self.counts.data.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_data {
            panic!("handler exploded");
        }
        self.sender.send_result(Some(payload.to_string())).wait().await.unwrap();
    }

    async fn on_close(&self) {
        self.counts.close.fetch_add(1, Ordering::SeqCst);
    }
}

type SenderSlot = Arc<std::sync::Mutex<Option<HostSender>>>;

fn recording_host(panic_on_data: bool) -> (TestHost, Arc<EventCounts>, SenderSlot) {
    let counts = Arc::new(EventCounts::default());
    let sender_slot = Arc::new(std::sync::Mutex::new(None));

    let counts_clone = Arc::clone(&counts);
    let slot_clone = Arc::clone(&sender_slot);
    let host = TestHost::start(move |channel| {
        *slot_clone.lock().unwrap() = Some(channel.sender());
        RecordingHandler {
            sender: channel.sender(),
            counts: counts_clone,
            panic_on_data,
        }
    });

    (host, counts, sender_slot)
}

fn take_sender(slot: &std::sync::Mutex<Option<HostSender>>) -> HostSender {
    slot.lock().unwrap().take().expect("sender not captured")
}

// ============================================================================
// Event routing
// ============================================================================

/// **VALUE**: Verifies ready and close reach the handler at most once while data is
/// delivered every time.
///
/// **WHY THIS MATTERS**: The handshake configures the session exactly once per process
/// lifetime; data is the steady state.
///
/// **BUG THIS CATCHES**: Would catch the once-guards being dropped from the read loop.
#[tokio::test]
async fn given_repeated_envelopes_when_routed_then_ready_and_close_fire_once() {
    // GIVEN: A channel with a recording handler
    let (mut host, counts, _) = recording_host(false);

    // WHEN: Every kind is sent twice
    host.send(json!({ "type": "ready", "data": { "options": {} } })).await;
    host.send(json!({ "type": "ready", "data": { "options": {} } })).await;
    host.send(json!({ "type": "data", "data": { "n": 1 } })).await;
    host.send(json!({ "type": "data", "data": { "n": 2 } })).await;
    host.send(json!({ "type": "close" })).await;
    host.send(json!({ "type": "close" })).await;
    let (messages, outcome) = host.finish().await;

    // THEN: Counts reflect once/many semantics
    assert!(outcome.is_ok());
    assert_eq!(counts.ready.load(Ordering::SeqCst), 1);
    assert_eq!(counts.data.load(Ordering::SeqCst), 2);
    assert_eq!(counts.close.load(Ordering::SeqCst), 1);
    assert_eq!(kinds(&messages).iter().filter(|k| **k == "result").count(), 2);
}

/// **VALUE**: Verifies malformed lines are skipped without killing the channel.
///
/// **WHY THIS MATTERS**: A single corrupt line from the host must not take down the
/// adapter and every request queued behind it.
///
/// **BUG THIS CATCHES**: Would catch decode failures being propagated out of `run`.
#[tokio::test]
async fn given_malformed_lines_when_read_then_skipped_and_channel_survives() {
    let (mut host, counts, _) = recording_host(false);

    host.send_line("this is not json").await;
    host.send_line("").await;
    host.send_line(r#"{"type":"reboot"}"#).await;
    host.send(json!({ "type": "data", "data": { "ok": true } })).await;
    let (messages, outcome) = host.finish().await;

    assert!(outcome.is_ok());
    assert_eq!(counts.data.load(Ordering::SeqCst), 1);
    assert_eq!(messages, vec![json!({ "type": "result", "data": "{\"ok\":true}" })]);
}

/// **VALUE**: Verifies a panicking dispatch ends `run` with a fatal error.
///
/// **WHY THIS MATTERS**: Panics are the Rust equivalent of an uncaught exception. The
/// supervisor can only report and exit if `run` surfaces them.
///
/// **BUG THIS CATCHES**: Would catch join errors from dispatch tasks being ignored.
#[tokio::test]
async fn given_panicking_handler_when_data_arrives_then_run_returns_task_panicked() {
    let (mut host, _, _) = recording_host(true);

    host.send(json!({ "type": "data", "data": {} })).await;
    let (_, outcome) = host.finish().await;

    match outcome {
        Err(HostChannelError::TaskPanicked { message, .. }) => {
            assert!(message.contains("handler exploded"));
        }
        other => panic!("Expected TaskPanicked, got {other:?}"),
    }
}

/// Output stream whose first write panics, taking the writer task down with it.
struct ExplodingOutput;

impl AsyncWrite for ExplodingOutput {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        panic!("output exploded");
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Handler that acknowledges ready without caring whether it was delivered.
struct FireAndForget {
    sender: HostSender,
}

impl HostEventHandler for FireAndForget {
    async fn on_ready(&self, _options: ReadyOptions) {
        drop(self.sender.notify_ready());
    }

    async fn on_data(&self, _payload: Value) {}

    async fn on_close(&self) {}
}

/// **VALUE**: Verifies a dead output writer ends `run` while the host is still connected.
///
/// **WHY THIS MATTERS**: Once the writer is gone every send fails with `Closed`. Without
/// this the adapter would keep reading requests it can never answer.
///
/// **BUG THIS CATCHES**: Would catch the writer task being spawned detached, with its
/// panic never observed by the read loop.
#[tokio::test]
async fn given_writer_panics_when_input_still_open_then_run_returns_writer_stopped() {
    // GIVEN: A channel whose output panics on first write
    let (mut host_input, adapter_input) = duplex(4096);
    let channel = HostChannel::new(adapter_input, ExplodingOutput);
    let handler = Arc::new(FireAndForget {
        sender: channel.sender(),
    });
    let run = tokio::spawn(channel.run(handler));

    // WHEN: Ready triggers the first write, and the host keeps its end open
    host_input
        .write_all(b"{\"type\":\"ready\",\"data\":{\"options\":{}}}\n")
        .await
        .unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("run should end without waiting for EOF")
        .unwrap();

    // THEN: WriterStopped carrying the panic message
    match outcome {
        Err(HostChannelError::WriterStopped { message, .. }) => {
            assert!(message.contains("output exploded"), "got {message}");
        }
        other => panic!("Expected WriterStopped, got {other:?}"),
    }
    drop(host_input);
}

// ============================================================================
// Outbound validation
// ============================================================================

/// **VALUE**: Verifies invalid result text is rejected and never written.
///
/// **WHY THIS MATTERS**: The host parses every result; a half-valid envelope would crash
/// its parser. Fail closed.
///
/// **BUG THIS CATCHES**: Would catch validation happening after the enqueue.
#[tokio::test]
async fn given_invalid_result_text_when_sent_then_rejected_and_nothing_written() {
    let (host, _, slot) = recording_host(false);
    let sender = take_sender(&slot);

    let outcome = sender.send_result(Some(String::from("{\"lat\": 14.5"))).wait().await;
    let trailing = sender.send_result(Some(String::from("{} extra"))).wait().await;
    drop(sender);
    let (messages, _) = host.finish().await;

    assert!(matches!(outcome, Err(ChannelError::InvalidResult { .. })));
    assert!(matches!(trailing, Err(ChannelError::InvalidResult { .. })));
    assert!(messages.is_empty(), "Nothing may reach the host: {messages:?}");
}

#[tokio::test]
async fn given_missing_result_when_sent_then_empty_object_is_written() {
    let (host, _, slot) = recording_host(false);
    let sender = take_sender(&slot);

    sender.send_result(None).wait().await.unwrap();
    drop(sender);
    let (messages, _) = host.finish().await;

    assert_eq!(messages, vec![json!({ "type": "result", "data": "{}" })]);
}

#[tokio::test]
async fn given_empty_log_or_nameless_report_when_sent_then_rejected() {
    let (host, _, slot) = recording_host(false);
    let sender = take_sender(&slot);

    let log = sender.log("").wait().await;
    let report = sender
        .report(ErrorReport {
            name: String::new(),
            message: String::from("no name"),
            stack: String::new(),
        })
        .wait()
        .await;
    drop(sender);
    let (messages, _) = host.finish().await;

    assert!(matches!(log, Err(ChannelError::InvalidLog { .. })));
    assert!(matches!(report, Err(ChannelError::InvalidError { .. })));
    assert!(messages.is_empty());
}

/// **VALUE**: Verifies outbound envelopes keep their enqueue order.
///
/// **WHY THIS MATTERS**: The dispatcher relies on the log/ready and error/result pairs
/// arriving in the order it sent them.
///
/// **BUG THIS CATCHES**: Would catch each send being spawned as its own task.
#[tokio::test]
async fn given_several_sends_when_dropped_without_waiting_then_order_is_preserved() {
    let (host, _, slot) = recording_host(false);
    let sender = take_sender(&slot);

    drop(sender.log("first"));
    drop(sender.notify_ready());
    drop(sender.send_result(Some(String::from("[1,2]"))));
    drop(sender.notify_close());
    drop(sender);
    let (messages, _) = host.finish().await;

    assert_eq!(kinds(&messages), vec!["log", "ready", "result", "close"]);
}
