/// What a single reconciler step did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Inserted,
    Replaced,
    Removed,
    /// Incoming record would move the entity backwards; dropped.
    Rejected,
    /// Nothing to do (unknown id on delete, append-only entry already seen).
    Unchanged,
}

impl ApplyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Replaced => "replaced",
            Self::Removed => "removed",
            Self::Rejected => "rejected",
            Self::Unchanged => "unchanged",
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, Self::Inserted | Self::Replaced | Self::Removed)
    }
}

impl std::fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
