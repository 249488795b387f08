//! Validation of inbound `data` payloads. Nothing here touches the network.

use crate::error::GeocodeError;

use std::ops::RangeInclusive;

use serde_json::Value;

pub const INVALID_ADDRESS_MESSAGE: &str = "Invalid address.";

const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;
const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ForwardRequest {
    pub address: String,
}

impl ForwardRequest {
    /// Requires `address` to be a string. Empty strings are passed on; the
    /// upstream decides what they mean.
    #[track_caller]
    pub fn parse(payload: &Value) -> Result<Self, GeocodeError> {
        match payload.get("address") {
            Some(Value::String(address)) => Ok(Self {
                address: address.clone(),
            }),
            _ => Err(GeocodeError::invalid_input(INVALID_ADDRESS_MESSAGE)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverseRequest {
    pub lat: f64,
    pub lng: f64,
}

impl ReverseRequest {
    /// Requires finite numeric `lat` in [-90, 90] and `lng` in [-180, 180].
    #[track_caller]
    pub fn parse(payload: &Value) -> Result<Self, GeocodeError> {
        let lat = payload.get("lat");
        let lng = payload.get("lng");

        match (coordinate(lat, &LATITUDE_RANGE), coordinate(lng, &LONGITUDE_RANGE)) {
            (Some(lat), Some(lng)) => Ok(Self { lat, lng }),
            _ => Err(GeocodeError::invalid_input(format!(
                "Latitude (lat) and Longitude (lng) are not valid. lat: {} lng:{}",
                render(lat),
                render(lng)
            ))),
        }
    }
}

fn coordinate(value: Option<&Value>, range: &RangeInclusive<f64>) -> Option<f64> {
    value
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite() && range.contains(n))
}

/// Renders an offending value for the error message. Strings appear without
/// quotes; an absent field reads `undefined`.
fn render(value: Option<&Value>) -> String {
    match value {
        None => String::from("undefined"),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
