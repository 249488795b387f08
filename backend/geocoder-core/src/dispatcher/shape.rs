//! Turns upstream bodies into result text and log records.

use crate::dispatcher::request::{ForwardRequest, ReverseRequest};
use crate::error::GeocodeError;

use serde::Serialize;
use serde_json::{Value, json};

pub const LOG_TITLE: &str = "Mapquest Geocoding Service Result";

const FIRST_LOCATION_POINTER: &str = "/results/0/locations/0";
const FIRST_LAT_LNG_POINTER: &str = "/results/0/locations/0/latLng";
const STRIPPED_FIELDS: [&str; 2] = ["latLng", "displayLatLng"];

/// Diagnostic snapshot sent alongside a successful result.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub title: &'static str,
    pub input: Value,
    pub result: Value,
}

/// What a successful dispatch hands back to the host.
#[derive(Debug, Clone)]
pub struct Shaped {
    pub result: String,
    pub log: LogRecord,
}

/// Result is `results[0].locations[0].latLng`, or `null` when the path is
/// absent. The log carries the whole body.
pub fn shape_forward(request: &ForwardRequest, body: Value) -> Result<Shaped, GeocodeError> {
    let lat_lng = body
        .pointer(FIRST_LAT_LNG_POINTER)
        .cloned()
        .unwrap_or(Value::Null);

    Ok(Shaped {
        result: serde_json::to_string(&lat_lng)?,
        log: LogRecord {
            title: LOG_TITLE,
            input: json!({ "address": request.address }),
            result: body,
        },
    })
}

/// Result is `{"address": <first location>}` with its coordinate fields
/// removed. A missing or non-object location is a parse failure.
pub fn shape_reverse(request: &ReverseRequest, body: Value) -> Result<Shaped, GeocodeError> {
    let mut address = match body.pointer(FIRST_LOCATION_POINTER) {
        Some(Value::Object(record)) => record.clone(),
        Some(_) => {
            return Err(GeocodeError::response_parse(
                "results[0].locations[0] is not an object",
            ));
        }
        None => {
            return Err(GeocodeError::response_parse(
                "results[0].locations[0] is missing from the response",
            ));
        }
    };

    for field in STRIPPED_FIELDS {
        address.remove(field);
    }
    let address = Value::Object(address);

    Ok(Shaped {
        result: serde_json::to_string(&json!({ "address": address }))?,
        log: LogRecord {
            title: LOG_TITLE,
            input: json!({ "lat": request.lat, "lng": request.lng }),
            result: address,
        },
    })
}
