use serde::Serialize;

/// Failure taxonomy shared by every layer of the client.
///
/// Each crate keeps its own error enum with source and location detail; this
/// is the coarse classification presentation code branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// No session, or the session is not allowed to touch the resource
    Unauthorized,
    /// Entity id does not exist inside the caller's scope
    NotFound,
    /// State-progression violation (terminal scan written concurrently)
    Conflict,
    /// The remote store rejected the submitted fields
    ValidationRejected,
    /// Network failure, timeout or an unreachable provider
    RemoteUnavailable,
    /// OAuth correlation token missing or not matching
    CsrfMismatch,
    /// OAuth authorization code could not be exchanged
    ExchangeRejected,
    /// Local fault (configuration, filesystem, malformed payload)
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::ValidationRejected => "VALIDATION_REJECTED",
            Self::RemoteUnavailable => "REMOTE_UNAVAILABLE",
            Self::CsrfMismatch => "CSRF_MISMATCH",
            Self::ExchangeRejected => "EXCHANGE_REJECTED",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Only transient remote failures warrant a manual or automatic retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable)
    }

    /// OAuth failures cannot be resumed; the flow has to start over.
    pub fn requires_restart(&self) -> bool {
        matches!(self, Self::CsrfMismatch | Self::ExchangeRejected)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
