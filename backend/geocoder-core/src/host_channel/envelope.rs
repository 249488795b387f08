//! Wire envelopes exchanged with the host, one JSON document per line.

use crate::error::ErrorReport;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An inbound line before its kind is checked.
///
/// Anything beyond `type` and `data` (the host's `requestId`, for one) is
/// ignored.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// A decoded host-to-process envelope.
#[derive(Debug)]
pub enum InboundEnvelope {
    Ready(ReadyOptions),
    Data(Value),
    Close,
}

impl InboundEnvelope {
    /// Decodes one line of host input.
    ///
    /// Returns `Err` with a description for lines that are not JSON or carry
    /// an unknown `type`. A `ready` payload without usable options decodes to
    /// empty options rather than failing; the dispatcher applies defaults.
    pub fn decode(line: &str) -> Result<Self, String> {
        let raw: RawEnvelope =
            serde_json::from_str(line).map_err(|e| format!("not a host envelope: {e}"))?;

        match raw.kind.as_str() {
            "ready" => {
                let payload: ReadyPayload = serde_json::from_value(raw.data).unwrap_or_default();
                Ok(InboundEnvelope::Ready(payload.options))
            }
            "data" => Ok(InboundEnvelope::Data(raw.data)),
            "close" => Ok(InboundEnvelope::Close),
            other => Err(format!("unknown envelope type '{other}'")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReadyPayload {
    #[serde(default)]
    options: ReadyOptions,
}

/// Options carried by the `ready` handshake.
#[derive(Clone, Default, Deserialize)]
pub struct ReadyOptions {
    #[serde(default)]
    pub apikey: Option<String>,
    #[serde(default)]
    pub geocoding_type: Option<String>,
}

impl fmt::Debug for ReadyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyOptions")
            .field("apikey", &self.apikey.as_ref().map(|_| "[REDACTED]"))
            .field("geocoding_type", &self.geocoding_type)
            .finish()
    }
}

/// A process-to-host envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutboundEnvelope {
    Ready,
    Result(String),
    Log(String),
    Error(ErrorReport),
    Close,
}

impl OutboundEnvelope {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundEnvelope::Ready => "ready",
            OutboundEnvelope::Result(_) => "result",
            OutboundEnvelope::Log(_) => "log",
            OutboundEnvelope::Error(_) => "error",
            OutboundEnvelope::Close => "close",
        }
    }
}
