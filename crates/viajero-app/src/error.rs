//! Application error types and user notices.

use serde::Serialize;
use viajero_core::ViajeroError;
use viajero_store::StoreError;

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Input rejected before any remote call.
    #[error(transparent)]
    Validation(#[from] ViajeroError),

    /// Storage backend failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotSignedIn,

    /// Sign-up with an email that already has an account.
    #[error("user already registered")]
    AlreadyRegistered,

    /// Wrong email or password.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// The session token has expired.
    #[error("session expired")]
    SessionExpired,

    /// The session token could not be decoded.
    #[error("invalid session token: {0}")]
    InvalidToken(String),

    /// The review or photo to act on does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A required service is not configured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// How prominent a notice is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The action worked.
    Success,
    /// Something the user should know, not a failure.
    Info,
    /// The action was refused.
    Warning,
    /// The action failed.
    Error,
}

/// A short message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub severity: Severity,
    /// Headline.
    pub title: String,
    /// Detail.
    pub message: String,
}

impl Notice {
    /// A notice with the given parts.
    #[must_use]
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
        }
    }

    /// A success notice.
    #[must_use]
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Success, title, message)
    }
}

impl AppError {
    /// The notice shown for this error.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Validation(ViajeroError::MissingRating) => Notice::new(
                Severity::Warning,
                "Rating required",
                "Please select a star rating.",
            ),
            Self::Validation(ViajeroError::Duplicate { city, list, .. }) => Notice::new(
                Severity::Info,
                "Already added",
                format!("{city} is already on your {list}."),
            ),
            Self::Validation(ViajeroError::CityNotFound { city, state }) => Notice::new(
                Severity::Info,
                "City not found",
                format!("{city} ({state}) is not in the municipality list."),
            ),
            Self::Validation(e) => Notice::new(Severity::Warning, "Check your input", e.to_string()),
            Self::Store(StoreError::Duplicate(_)) => Notice::new(
                Severity::Info,
                "Already added",
                "That record already exists.",
            ),
            Self::Store(StoreError::Unauthorized(_)) | Self::SessionExpired => Notice::new(
                Severity::Warning,
                "Session expired",
                "Please sign in again.",
            ),
            Self::Store(e) => Notice::new(Severity::Error, "Something went wrong", e.to_string()),
            Self::NotSignedIn => Notice::new(
                Severity::Warning,
                "Sign in required",
                "Sign in to save your cities.",
            ),
            Self::AlreadyRegistered => Notice::new(
                Severity::Warning,
                "Email already registered",
                "This email is already registered. Try signing in instead.",
            ),
            Self::InvalidCredentials => Notice::new(
                Severity::Warning,
                "Sign-in failed",
                "Incorrect email or password.",
            ),
            Self::InvalidToken(_) => Notice::new(
                Severity::Warning,
                "Session invalid",
                "Please sign in again.",
            ),
            Self::NotFound(what) => Notice::new(Severity::Info, "Not found", what.clone()),
            Self::Configuration(message) => {
                Notice::new(Severity::Error, "Not configured", message.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viajero_core::CityList;

    #[test]
    fn missing_rating_asks_for_a_rating() {
        let notice = AppError::from(ViajeroError::MissingRating).notice();
        assert_eq!(notice.severity, Severity::Warning);
        assert!(notice.message.contains("select a star rating"));
    }

    #[test]
    fn duplicates_are_informational() {
        let error = AppError::from(ViajeroError::Duplicate {
            city: "Belo Horizonte".into(),
            state: "Minas Gerais".into(),
            list: CityList::Visited,
        });
        let notice = error.notice();
        assert_eq!(notice.severity, Severity::Info);
        assert_eq!(notice.message, "Belo Horizonte is already on your visited list.");
    }

    #[test]
    fn backend_failures_are_errors() {
        let error = AppError::from(StoreError::Api {
            status: 500,
            code: "XX000".into(),
            message: "boom".into(),
        });
        assert_eq!(error.notice().severity, Severity::Error);
    }
}
