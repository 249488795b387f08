use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Refusals raised by secret-holding types.
#[derive(Debug, ThisError)]
pub enum RedactError {
    /// A secret reached a serializer. Call sites must `expose()` it explicitly.
    #[error("Secret Serialization Refused: {secret} {location}")]
    SerializationRefused {
        secret: &'static str,
        location: ErrorLocation,
    },
}
