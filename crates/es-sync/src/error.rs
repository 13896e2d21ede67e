use es_core::{CoreError, ErrorKind};
use es_realtime::FeedError;
use es_store::StoreError;

use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Unauthorized: {message} {location}")]
    Unauthorized {
        message: String,
        location: ErrorLocation,
    },

    #[error("{entity} {id} not found {location}")]
    NotFound {
        entity: &'static str,
        id: String,
        location: ErrorLocation,
    },

    #[error("Conflict: {message} {location}")]
    Conflict {
        message: String,
        location: ErrorLocation,
    },

    #[error("Timed out after {timeout_secs}s: {operation} {location}")]
    Timeout {
        timeout_secs: u64,
        operation: String,
        location: ErrorLocation,
    },

    #[error("Remote unavailable: {message} {location}")]
    Unavailable {
        message: String,
        location: ErrorLocation,
    },

    #[error("OAuth state missing or mismatched {location}")]
    CsrfMismatch { location: ErrorLocation },

    #[error("OAuth code exchange rejected: {message} {location}")]
    ExchangeRejected {
        message: String,
        location: ErrorLocation,
    },

    #[error("Store error: {source} {location}")]
    Store {
        #[source]
        source: StoreError,
        location: ErrorLocation,
    },

    #[error("Change feed error: {source} {location}")]
    Feed {
        #[source]
        source: FeedError,
        location: ErrorLocation,
    },

    #[error("{source} {location}")]
    Core {
        #[source]
        source: CoreError,
        location: ErrorLocation,
    },

    #[error("Not configured: {message} {location}")]
    NotConfigured {
        message: String,
        location: ErrorLocation,
    },

    #[error("Correlation store error: {source} {location}")]
    LinkStore {
        #[source]
        source: LinkStoreError,
        location: ErrorLocation,
    },

    /// Failure of a request shared with other callers.
    #[error("{kind}: {message} {location}")]
    Shared {
        kind: ErrorKind,
        message: String,
        location: ErrorLocation,
    },
}

/// Failures persisting the OAuth correlation token.
#[derive(Error, Debug)]
pub enum LinkStoreError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    #[track_caller]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn timeout(timeout_secs: u64, operation: impl Into<String>) -> Self {
        Self::Timeout {
            timeout_secs,
            operation: operation.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn csrf_mismatch() -> Self {
        Self::CsrfMismatch {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn exchange_rejected(message: impl Into<String>) -> Self {
        Self::ExchangeRejected {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::NotConfigured {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn shared(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Shared {
            kind,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Timeout { .. } | Self::Unavailable { .. } => ErrorKind::RemoteUnavailable,
            Self::CsrfMismatch { .. } => ErrorKind::CsrfMismatch,
            Self::ExchangeRejected { .. } => ErrorKind::ExchangeRejected,
            Self::Store { source, .. } => source.kind(),
            Self::Feed { source, .. } => source.kind(),
            Self::Core { source, .. } => source.kind(),
            Self::NotConfigured { .. } | Self::LinkStore { .. } => ErrorKind::Internal,
            Self::Shared { kind, .. } => *kind,
        }
    }
}

impl From<StoreError> for SyncError {
    #[track_caller]
    fn from(source: StoreError) -> Self {
        Self::Store {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<FeedError> for SyncError {
    #[track_caller]
    fn from(source: FeedError) -> Self {
        Self::Feed {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for SyncError {
    #[track_caller]
    fn from(source: CoreError) -> Self {
        Self::Core {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<LinkStoreError> for SyncError {
    #[track_caller]
    fn from(source: LinkStoreError) -> Self {
        Self::LinkStore {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::Core {
            source: CoreError::validation(err.to_string(), None),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl es_realtime::IsRetryable for SyncError {
    fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
