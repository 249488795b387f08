use crate::config::GeocodingMode;
use crate::host_channel::ReadyOptions;

use common::RedactedApiKey;

use log::warn;

/// Per-process configuration taken from the `ready` handshake. Built once,
/// never replaced.
#[derive(Debug)]
pub struct SessionConfig {
    pub api_key: RedactedApiKey,
    pub mode: GeocodingMode,
}

impl SessionConfig {
    /// Resolves handshake options against the configured default mode.
    pub fn from_options(options: ReadyOptions, default_mode: GeocodingMode) -> Self {
        let api_key = RedactedApiKey::from(options.apikey);
        if api_key.is_empty() {
            warn!("Ready handshake carried no apikey; upstream calls will be rejected");
        }

        let mode = match options.geocoding_type.as_deref() {
            None => default_mode,
            Some(value) => GeocodingMode::from_host_value(value).unwrap_or_else(|| {
                warn!("Unknown geocoding_type '{value}', falling back to {default_mode}");
                default_mode
            }),
        };

        Self { api_key, mode }
    }
}
