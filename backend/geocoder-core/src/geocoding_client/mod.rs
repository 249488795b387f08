//! HTTP client for the MapQuest geocoding endpoints.
//!
//! One GET per call, no retries. The caller decides what to pull out of the
//! parsed body.

use crate::config::GeocodingSettings;
use crate::error::{ConfigError, CoreError, GeocodeError};

use common::{ErrorLocation, HttpStatusCode, RedactedApiKey};

use std::panic::Location;

use hyper::ext::ReasonPhrase;
use log::{debug, warn};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use url::Url;

const KEY_QUERY_PARAM: &str = "key";
const LOCATION_QUERY_PARAM: &str = "location";

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    geocode_url: Url,
    reverse_geocode_url: Url,
}

impl GeocodingClient {
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if an endpoint URL does not parse and
    /// [`CoreError::Geocode`] if the HTTP client cannot be built.
    pub fn new(settings: &GeocodingSettings) -> Result<Self, CoreError> {
        let geocode_url = parse_endpoint(&settings.geocode_url)?;
        let reverse_geocode_url = parse_endpoint(&settings.reverse_geocode_url)?;

        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(GeocodeError::from)?;

        Ok(Self {
            client,
            geocode_url,
            reverse_geocode_url,
        })
    }

    /// Forward geocoding: `GET <geocode_url>?key=..&location=<address>`.
    pub async fn forward(
        &self,
        api_key: &RedactedApiKey,
        address: &str,
    ) -> Result<Value, GeocodeError> {
        self.get(&self.geocode_url, api_key, address).await
    }

    /// Reverse geocoding: `GET <reverse_geocode_url>?key=..&location=<lat>,<lng>`.
    pub async fn reverse(
        &self,
        api_key: &RedactedApiKey,
        lat: f64,
        lng: f64,
    ) -> Result<Value, GeocodeError> {
        self.get(&self.reverse_geocode_url, api_key, &format!("{lat},{lng}"))
            .await
    }

    async fn get(
        &self,
        endpoint: &Url,
        api_key: &RedactedApiKey,
        location: &str,
    ) -> Result<Value, GeocodeError> {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair(KEY_QUERY_PARAM, api_key.expose())
            .append_pair(LOCATION_QUERY_PARAM, location);

        // The query string carries the key; only the path is logged.
        debug!("GET {}", endpoint.path());

        let response = self.client.get(url).send().await?;
        let status = HttpStatusCode::from(response.status().as_u16());

        debug!("{} answered {status}", endpoint.path());

        if !status.is_ok() {
            if status.is_client_error() {
                warn!("{} rejected the request with {status}; check the API key", endpoint.path());
            } else if status.is_server_error() {
                warn!("{} failed with {status}", endpoint.path());
            }

            return Err(GeocodeError::Upstream {
                status,
                message: status_line(&response),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body)?;

        Ok(json)
    }
}

/// Reason phrase of the status line as the server sent it. Falls back to the
/// canonical phrase, then to the bare code.
pub fn status_line(response: &Response) -> String {
    let sent = response
        .extensions()
        .get::<ReasonPhrase>()
        .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
        .map(str::trim)
        .filter(|reason| !reason.is_empty());

    match sent {
        Some(reason) => reason.to_string(),
        None => canonical_status_line(response.status()),
    }
}

fn canonical_status_line(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

#[track_caller]
fn parse_endpoint(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: format!("Invalid endpoint URL '{value}': {e}"),
    })
}
