//! Error types for Viaje.ro persistence.

use viajero_geo::GeoError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// PostgreSQL unique-violation code, reported when a row already exists.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service answered with an error.
    #[error("API error ({status}): {code}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Service error code (PostgreSQL SQLSTATE or storage error name).
        code: String,
        /// Error message.
        message: String,
    },

    /// A unique constraint rejected the write.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// Record not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The session is missing or was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Local file access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A geometry could not be decoded.
    #[error("geometry error: {0}")]
    Geo(#[from] GeoError),

    /// The client could not be configured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Classify an error reply from the remote service.
    #[must_use]
    pub fn from_reply(status: u16, code: Option<String>, message: String) -> Self {
        let code = code.unwrap_or_else(|| "unknown".to_string());
        if code == UNIQUE_VIOLATION || status == 409 {
            return Self::Duplicate(message);
        }
        match status {
            401 | 403 => Self::Unauthorized(message),
            _ => Self::Api {
                status,
                code,
                message,
            },
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
