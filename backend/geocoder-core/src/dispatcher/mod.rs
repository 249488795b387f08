//! Geocoding dispatcher: turns each `data` event into exactly one terminal
//! outcome on the host channel.
//!
//! # State machine
//!
//! `Uninitialized → Ready → {Dispatching}* → Closed`
//!
//! - `ready` stores the [`SessionConfig`] once, logs an initialization line
//!   and acknowledges the handshake.
//! - `data` validates, calls the upstream once and shapes the response.
//!   Success sends the result then a log record; any failure sends an error
//!   report then the empty-object result. Never both, never neither.
//! - `close` acknowledges shutdown.
//!
//! Dispatches share nothing but the read-only session, so any number can be
//! in flight at once.

pub mod request;
pub mod session;
pub mod shape;

pub use request::{ForwardRequest, ReverseRequest};
pub use session::SessionConfig;
pub use shape::{LogRecord, Shaped};

use crate::config::{GeocodingMode, GeocodingSettings};
use crate::error::{CoreError, GeocodeError};
use crate::geocoding_client::GeocodingClient;
use crate::host_channel::{Delivery, HostEventHandler, HostSender, ReadyOptions};

use log::{debug, error, info, warn};
use once_cell::sync::OnceCell;
use serde_json::Value;
use uuid::Uuid;

pub const INITIALIZED_MESSAGE: &str = "MapQuest Geocoding Service Initialized.";
pub const NOT_INITIALIZED_MESSAGE: &str = "Geocoding service is not initialized.";

pub struct GeocodingDispatcher {
    host: HostSender,
    client: GeocodingClient,
    default_mode: GeocodingMode,
    session: OnceCell<SessionConfig>,
}

impl GeocodingDispatcher {
    /// # Errors
    ///
    /// Returns [`CoreError`] if the HTTP client cannot be built from
    /// `settings`.
    pub fn new(host: HostSender, settings: &GeocodingSettings) -> Result<Self, CoreError> {
        Ok(Self {
            host,
            client: GeocodingClient::new(settings)?,
            default_mode: settings.default_type,
            session: OnceCell::new(),
        })
    }

    async fn dispatch(&self, payload: &Value) -> Result<Shaped, GeocodeError> {
        let Some(session) = self.session.get() else {
            return Err(GeocodeError::invalid_input(NOT_INITIALIZED_MESSAGE));
        };

        match session.mode {
            GeocodingMode::Forward => {
                let request = ForwardRequest::parse(payload)?;
                let body = self.client.forward(&session.api_key, &request.address).await?;
                shape::shape_forward(&request, body)
            }
            GeocodingMode::Reverse => {
                let request = ReverseRequest::parse(payload)?;
                let body = self
                    .client
                    .reverse(&session.api_key, request.lat, request.lng)
                    .await?;
                shape::shape_reverse(&request, body)
            }
        }
    }

    async fn succeed(&self, dispatch_id: Uuid, shaped: Shaped) {
        debug!("Dispatch {dispatch_id} succeeded");

        let result = self.host.send_result(Some(shaped.result));
        let log = match serde_json::to_string(&shaped.log) {
            Ok(text) => Some(self.host.log(text)),
            Err(e) => {
                warn!("Dispatch {dispatch_id}: failed to encode log record: {e}");
                None
            }
        };

        confirm(dispatch_id, "result", result).await;
        if let Some(log) = log {
            confirm(dispatch_id, "log", log).await;
        }
    }

    /// The single error path: log, report, then send the empty result.
    async fn fail(&self, dispatch_id: Uuid, failure: GeocodeError) {
        error!("Dispatch {dispatch_id} failed: {failure}");

        let report = self.host.report_error(&failure);
        let result = self.host.send_result(None);

        confirm(dispatch_id, "error", report).await;
        confirm(dispatch_id, "result", result).await;
    }
}

impl HostEventHandler for GeocodingDispatcher {
    async fn on_ready(&self, options: ReadyOptions) {
        let session = SessionConfig::from_options(options, self.default_mode);
        let mode = session.mode;

        if self.session.set(session).is_err() {
            debug!("Session already configured, ignoring handshake");
            return;
        }

        info!("{INITIALIZED_MESSAGE} Mode: {mode}");

        let log = self.host.log(INITIALIZED_MESSAGE);
        let ready = self.host.notify_ready();

        if let Err(e) = log.wait().await {
            warn!("Failed to deliver initialization log: {e}");
        }
        if let Err(e) = ready.wait().await {
            error!("Failed to acknowledge ready handshake: {e}");
        }
    }

    async fn on_data(&self, payload: Value) {
        let dispatch_id = Uuid::new_v4();
        debug!("Dispatch {dispatch_id} started");

        match self.dispatch(&payload).await {
            Ok(shaped) => self.succeed(dispatch_id, shaped).await,
            Err(failure) => self.fail(dispatch_id, failure).await,
        }
    }

    async fn on_close(&self) {
        info!("Close requested by host");

        if let Err(e) = self.host.notify_close().wait().await {
            warn!("Failed to acknowledge close: {e}");
        }
    }
}

async fn confirm(dispatch_id: Uuid, kind: &str, delivery: Delivery) {
    if let Err(e) = delivery.wait().await {
        warn!("Dispatch {dispatch_id}: {kind} not delivered: {e}");
    }
}
