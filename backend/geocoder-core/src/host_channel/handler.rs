use crate::host_channel::envelope::ReadyOptions;

use std::future::Future;

use serde_json::Value;

/// Subscriber for host events.
///
/// `HostChannel::run` takes exactly one handler, which makes it the single
/// registered handler for each event kind. The channel guarantees:
///
/// - `on_ready` runs at most once, and is awaited before the next line is read
/// - `on_data` runs once per `data` envelope, each in its own task, possibly
///   interleaved with other in-flight dispatches
/// - `on_close` runs at most once
pub trait HostEventHandler: Send + Sync + 'static {
    fn on_ready(&self, options: ReadyOptions) -> impl Future<Output = ()> + Send;

    fn on_data(&self, payload: Value) -> impl Future<Output = ()> + Send;

    fn on_close(&self) -> impl Future<Output = ()> + Send;
}
