//! Error types for Warden

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Authentication Errors
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication backend unavailable: {0}")]
    BackendUnavailable(String),

    // Session Errors
    #[error("Session token failed integrity check")]
    SessionIntegrity,

    #[error("Session token has expired")]
    SessionExpired,

    #[error("Malformed session: {0}")]
    MalformedSession(String),

    // Persistence Errors
    #[error("Failed to encode session: {0}")]
    Encoding(String),

    #[error("Failed to persist session: {0}")]
    Persistence(String),

    // Configuration Errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidCredentials => "InvalidCredentials",
            Error::BackendUnavailable(_) => "BackendUnavailable",
            Error::SessionIntegrity => "SessionIntegrity",
            Error::SessionExpired => "SessionExpired",
            Error::MalformedSession(_) => "MalformedSession",
            Error::Encoding(_) => "InternalError",
            Error::Persistence(_) => "InternalError",
            Error::Configuration(_) => "ConfigurationError",
            Error::Io(_) => "InternalError",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidCredentials
            | Error::SessionIntegrity
            | Error::SessionExpired
            | Error::MalformedSession(_) => 401,

            Error::BackendUnavailable(_) => 503,

            _ => 500,
        }
    }

    /// True for every outcome that means "the login attempt did not succeed".
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Error::InvalidCredentials | Error::BackendUnavailable(_))
    }

    /// True for token problems that callers treat as "no valid session".
    pub fn is_session_rejection(&self) -> bool {
        matches!(
            self,
            Error::SessionIntegrity | Error::SessionExpired | Error::MalformedSession(_)
        )
    }
}
