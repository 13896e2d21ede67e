pub mod error_kind;

// -------------------------------------------------------------------------- //

use crate::{ErrorKind, ErrorLocation};

use std::panic::Location;
use std::result::Result as StdResult;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {message} {location}")]
    Validation {
        message: String,
        field: Option<String>,
        location: ErrorLocation,
    },

    #[error("Invalid scan status: {value} {location}")]
    InvalidScanStatus {
        value: String,
        location: ErrorLocation,
    },

    #[error("Invalid target type: {value} {location}")]
    InvalidTargetType {
        value: String,
        location: ErrorLocation,
    },

    #[error("Invalid scan type: {value} {location}")]
    InvalidScanType {
        value: String,
        location: ErrorLocation,
    },

    #[error("Invalid plan: {value} {location}")]
    InvalidPlan {
        value: String,
        location: ErrorLocation,
    },

    #[error("Invalid log level: {value} {location}")]
    InvalidLogLevel {
        value: String,
        location: ErrorLocation,
    },

    #[error("Invalid provider: {value} {location}")]
    InvalidProvider {
        value: String,
        location: ErrorLocation,
    },

    #[error("Unknown table: {value} {location}")]
    UnknownTable {
        value: String,
        location: ErrorLocation,
    },

    #[error("Malformed {entity} row: {source} {location}")]
    MalformedRow {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },
}

impl CoreError {
    /// Create a validation error at the caller location
    #[track_caller]
    pub fn validation(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.map(String::from),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Wrap a serde failure while decoding a remote row
    #[track_caller]
    pub fn malformed_row(entity: &'static str, source: serde_json::Error) -> Self {
        Self::MalformedRow {
            entity,
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedRow { .. } | Self::UnknownTable { .. } => ErrorKind::Internal,
            _ => ErrorKind::ValidationRejected,
        }
    }
}

pub type Result<T> = StdResult<T, CoreError>;
