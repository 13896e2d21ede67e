use crate::ChangeRecord;

/// Receiver of committed row changes.
///
/// Stores that commit locally publish through this so an in-process feed
/// can fan the change out to subscribers.
pub trait ChangeSink: Send + Sync {
    fn publish(&self, record: ChangeRecord);
}
