//! Geocoding API key handling with redacted Debug output.

use crate::{ErrorLocation, RedactError};

use std::fmt;
use std::panic::Location;

use serde::ser::Error;
use zeroize::Zeroize;

/// The key handed over by the host in the `ready` handshake.
///
/// It only ever leaves the process as the `key` query parameter of an
/// upstream request. Debug/Display print a placeholder and serialization
/// fails outright, so the key cannot end up in a log line or a log envelope.
#[derive(Clone, Default)]
pub struct RedactedApiKey {
    inner: String,
}

impl RedactedApiKey {
    pub fn new(key: String) -> Self {
        Self { inner: key }
    }

    /// The raw key, for building the upstream query string only.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.inner
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<Option<String>> for RedactedApiKey {
    fn from(key: Option<String>) -> Self {
        Self::new(key.unwrap_or_default())
    }
}

impl fmt::Debug for RedactedApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedactedApiKey([REDACTED; {} chars])", self.inner.len())
    }
}

impl fmt::Display for RedactedApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED API KEY]")
    }
}

impl Drop for RedactedApiKey {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl serde::Serialize for RedactedApiKey {
    #[track_caller]
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(RedactError::SerializationRefused {
            secret: "RedactedApiKey",
            location: ErrorLocation::from(Location::caller()),
        }))
    }
}
