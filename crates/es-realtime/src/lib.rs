pub mod change_feed;
pub mod error;
pub mod feed_scope;
pub mod feed_stream;
pub mod memory_feed;
pub mod phoenix;
pub mod realtime_feed;
pub mod retry;

pub use change_feed::ChangeFeed;
pub use error::{FeedError, Result as FeedResult};
pub use feed_scope::FeedScope;
pub use feed_stream::{FeedSignal, FeedStream};
pub use memory_feed::MemoryFeed;
pub use phoenix::{Inbound, PhoenixMessage};
pub use realtime_feed::RealtimeFeed;
pub use retry::{IsRetryable, RetryPolicy, with_retry};

#[cfg(test)]
mod tests;
