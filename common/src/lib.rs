//! Shared primitives for the geocoder adapter.
//!
//! Everything here is dependency-light and free of protocol logic, so both
//! the core library and the process entry point can lean on it:
//!
//! - [`ErrorLocation`]: call-site capture used by every error enum
//! - [`RedactedApiKey`]: the upstream API key, never printed or serialized
//! - [`HttpStatusCode`]: upstream status classification

pub mod error;
pub mod http_status;
pub mod redacted_key;

#[cfg(test)]
mod tests;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_key::RedactedApiKey;
