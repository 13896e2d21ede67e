use crate::{FeedResult, FeedScope, FeedStream};

use es_core::AccessToken;

use async_trait::async_trait;

/// Source of row change notifications.
///
/// Delivery is at-least-once and ordered per stream only.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Open a stream for `scope`. The returned stream is already joined:
    /// any change committed after this returns will be delivered.
    async fn open(&self, token: &AccessToken, scope: &FeedScope) -> FeedResult<FeedStream>;
}
