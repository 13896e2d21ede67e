use es_core::{CoreError, ErrorKind};

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Errors raised talking to the remote store or identity provider
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP request error: {message} {location}")]
    Http {
        message: String,
        location: ErrorLocation,
        #[source]
        source: reqwest::Error,
    },

    #[error("Remote error: {message} (status: {status}, code: {code}) {location}")]
    Status {
        status: u16,
        code: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("JSON parse error: {message} {location}")]
    Json {
        message: String,
        location: ErrorLocation,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid row: {source} {location}")]
    Core {
        #[source]
        source: CoreError,
        location: ErrorLocation,
    },

    #[error("Invalid credentials {location}")]
    InvalidCredentials { location: ErrorLocation },

    #[error("Unexpected response: {message} {location}")]
    UnexpectedResponse {
        message: String,
        location: ErrorLocation,
    },
}

impl StoreError {
    /// Convert reqwest error with context
    #[track_caller]
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        StoreError::Http {
            message: err.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: err,
        }
    }

    /// Convert JSON error with context
    #[track_caller]
    pub fn from_json(err: serde_json::Error) -> Self {
        StoreError::Json {
            message: err.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: err,
        }
    }

    /// Non-success response with the remote's own code and message
    #[track_caller]
    pub fn status(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Status {
            status,
            code: code.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unexpected(message: impl Into<String>) -> Self {
        StoreError::UnexpectedResponse {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_credentials() -> Self {
        StoreError::InvalidCredentials {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http { .. } | Self::UnexpectedResponse { .. } => ErrorKind::RemoteUnavailable,
            Self::Status { status, .. } => match *status {
                401 | 403 => ErrorKind::Unauthorized,
                404 | 406 => ErrorKind::NotFound,
                409 => ErrorKind::Conflict,
                400 | 422 => ErrorKind::ValidationRejected,
                _ => ErrorKind::RemoteUnavailable,
            },
            Self::Json { .. } => ErrorKind::RemoteUnavailable,
            Self::Core { source, .. } => source.kind(),
            Self::InvalidCredentials { .. } => ErrorKind::Unauthorized,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        StoreError::from_reqwest(err)
    }
}

impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        StoreError::from_json(err)
    }
}

impl From<CoreError> for StoreError {
    #[track_caller]
    fn from(source: CoreError) -> Self {
        StoreError::Core {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
