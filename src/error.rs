use crate::utils::i18n::Locale;
use miette::{Diagnostic, Result};
use thiserror::Error;

/// Local precondition failures. These never reach the network and leave
/// every piece of state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("acting user may not modify this session")]
    PermissionDenied,
    #[error("attendance can only be submitted while the session is active")]
    InactiveWindow,
    #[error("class sessions cannot be deleted from the calendar")]
    SessionNotDeletable,
    #[error("class session not found")]
    SessionNotFound,
    #[error("no bearer credential configured")]
    NotAuthenticated,
}

impl Rejection {
    /// Message shown to the user for this rejection
    pub fn user_message(&self, locale: Locale) -> String {
        let locale = locale.as_str();
        match self {
            Rejection::PermissionDenied => t!("rejection_permission_denied", locale = locale),
            Rejection::InactiveWindow => t!("rejection_inactive_window", locale = locale),
            Rejection::SessionNotDeletable => t!("rejection_not_deletable", locale = locale),
            Rejection::SessionNotFound => t!("rejection_not_found", locale = locale),
            Rejection::NotAuthenticated => t!("rejection_not_authenticated", locale = locale),
        }
        .to_string()
    }
}

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Rejected: {0}")]
    #[diagnostic(code(emargement::rejected))]
    Rejected(Rejection),

    #[error("Backend returned HTTP {status}: {message}")]
    #[diagnostic(code(emargement::api))]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    #[diagnostic(code(emargement::transport))]
    Transport(String),

    #[error("Malformed session {id}: {reason}")]
    #[diagnostic(code(emargement::malformed_session))]
    MalformedSession { id: String, reason: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(emargement::config))]
    Config(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(emargement::component))]
    Component(String),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(emargement::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(emargement::other))]
    Other(String),
}

impl Error {
    /// The rejection carried by this error, if it is one
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Error::Rejected(rejection) => Some(*rejection),
            _ => None,
        }
    }

    /// Whether the failure happened on the wire rather than locally
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Error::Api { .. } | Error::Transport(_))
    }
}

impl From<Rejection> for Error {
    fn from(rejection: Rejection) -> Self {
        Error::Rejected(rejection)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create API errors from a status and response body
pub fn api_error(status: u16, message: &str) -> Error {
    Error::Api {
        status,
        message: message.to_string(),
    }
}

/// Helper to create malformed session errors
pub fn malformed_session(id: &str, reason: &str) -> Error {
    Error::MalformedSession {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_not_transport_failures() {
        let err: Error = Rejection::InactiveWindow.into();
        assert_eq!(err.rejection(), Some(Rejection::InactiveWindow));
        assert!(!err.is_transport_failure());

        let err = api_error(502, "bad gateway");
        assert!(err.rejection().is_none());
        assert!(err.is_transport_failure());
    }

    #[test]
    fn test_rejection_messages_follow_locale() {
        assert_eq!(
            Rejection::InactiveWindow.user_message(Locale::En),
            "Attendance can only be submitted during active sessions."
        );
        assert_ne!(
            Rejection::InactiveWindow.user_message(Locale::Fr),
            Rejection::InactiveWindow.user_message(Locale::En)
        );
    }
}
