use es_core::ErrorKind;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Connect failed: {message} {location}")]
    Connect {
        message: String,
        location: ErrorLocation,
    },

    #[error("Transport error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
    },

    #[error("Protocol error: {message} {location}")]
    Protocol {
        message: String,
        location: ErrorLocation,
    },

    #[error("Join rejected: {reason} {location}")]
    JoinRejected {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Change feed unavailable {location}")]
    Unavailable { location: ErrorLocation },

    #[error("Timed out after {timeout_secs}s waiting for {waiting_for} {location}")]
    Timeout {
        timeout_secs: u64,
        waiting_for: &'static str,
        location: ErrorLocation,
    },
}

impl FeedError {
    #[track_caller]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn join_rejected(reason: impl Into<String>) -> Self {
        Self::JoinRejected {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unavailable() -> Self {
        Self::Unavailable {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn timeout(timeout_secs: u64, waiting_for: &'static str) -> Self {
        Self::Timeout {
            timeout_secs,
            waiting_for,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::JoinRejected { .. } => ErrorKind::Unauthorized,
            _ => ErrorKind::RemoteUnavailable,
        }
    }
}

impl From<serde_json::Error> for FeedError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        FeedError::protocol(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    #[track_caller]
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        FeedError::transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
