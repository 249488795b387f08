use std::fmt;

use serde::{Deserialize, Serialize};

/// Which upstream operation a session performs for every `data` event.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeocodingMode {
    /// Address in, coordinates out.
    #[default]
    Forward,
    /// Coordinates in, address record out.
    Reverse,
}

impl GeocodingMode {
    /// Parses the `geocoding_type` value sent by the host. Matching is exact,
    /// as the host sends the canonical spelling.
    pub fn from_host_value(value: &str) -> Option<Self> {
        match value {
            "Forward" => Some(GeocodingMode::Forward),
            "Reverse" => Some(GeocodingMode::Reverse),
            _ => None,
        }
    }
}

impl fmt::Display for GeocodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodingMode::Forward => write!(f, "Forward"),
            GeocodingMode::Reverse => write!(f, "Reverse"),
        }
    }
}
