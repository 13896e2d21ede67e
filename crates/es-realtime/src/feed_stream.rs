use es_core::ChangeRecord;

use tokio::sync::mpsc;

/// What a subscription receives from its feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSignal {
    Change(ChangeRecord),
    /// The transport went away; nothing more will arrive on this stream.
    Dropped { reason: String },
}

/// Receiving end of one open feed. Dropping it tears the transport down.
pub struct FeedStream {
    rx: mpsc::Receiver<FeedSignal>,
}

impl FeedStream {
    pub fn new(rx: mpsc::Receiver<FeedSignal>) -> Self {
        Self { rx }
    }

    /// Bounded channel pair; the sender side belongs to the feed.
    pub fn channel(buffer: usize) -> (mpsc::Sender<FeedSignal>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self::new(rx))
    }

    /// Next signal; `None` once the feed side has gone away.
    pub async fn next(&mut self) -> Option<FeedSignal> {
        self.rx.recv().await
    }

    /// Non-blocking variant used when draining.
    pub fn try_next(&mut self) -> Option<FeedSignal> {
        self.rx.try_recv().ok()
    }
}
