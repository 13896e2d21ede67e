pub mod client;
pub mod coalesce;
pub mod error;
pub mod link;
pub mod live_view;
pub mod metrics;
pub mod query;
pub mod reconciler;
pub mod repos;
pub mod session;
pub mod stats;
pub mod usage;

mod subscriber;

pub use client::{SyncClient, WatchSpec};
pub use coalesce::Coalescer;
pub use error::{LinkStoreError, Result as SyncResult, SyncError};
pub use link::code_exchange::{CodeExchange, GithubGrant, HttpCodeExchange};
pub use link::correlation_store::{
    CorrelationStore, FileCorrelationStore, MemoryCorrelationStore,
};
pub use link::link_flow::{LinkFlow, OAuthCallback};
pub use link::link_state::LinkState;
pub use live_view::{LiveView, SubscriptionState, ViewError};
pub use metrics::SyncMetrics;
pub use query::QueryService;
pub use reconciler::apply_outcome::ApplyOutcome;
pub use reconciler::collection::Collection;
pub use reconciler::display_order::DisplayOrder;
pub use reconciler::reconciler::{MergeReport, Reconciler};
pub use reconciler::retention::Retention;
pub use repos::{GithubOwner, GithubRepo, RepoService};
pub use session::{Credentials, SessionContext, SessionState, SubscriptionId};
pub use stats::{DashboardStats, NoTrends, StatTrends, TrendSource};
pub use usage::{Quota, UsageService, UsageSummary, month_key};

#[cfg(test)]
mod tests;
