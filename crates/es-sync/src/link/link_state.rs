use es_core::ErrorKind;

/// Progress of one attempt to link a GitHub account.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkState {
    NotStarted,
    AwaitingRedirect,
    AwaitingCallback,
    ExchangingCode,
    Linked { username: String },
    Failed { kind: ErrorKind, message: String },
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::AwaitingRedirect => "awaiting_redirect",
            Self::AwaitingCallback => "awaiting_callback",
            Self::ExchangingCode => "exchanging_code",
            Self::Linked { .. } => "linked",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Linked { .. } | Self::Failed { .. })
    }
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linked { username } => write!(f, "linked as {username}"),
            Self::Failed { kind, message } => write!(f, "failed ({kind}): {message}"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}
