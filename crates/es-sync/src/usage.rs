use crate::{QueryService, SyncError, SyncResult};

use es_config::PlansConfig;
use es_core::{Filter, Plan, Query, Usage};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;

/// This month's consumption against the plan's allowance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSummary {
    pub scans_used: u64,
    pub scans_limit: u64,
    pub tokens_used: u64,
    pub tokens_limit: u64,
    /// `YYYY-MM`
    pub month: String,
    pub plan: Plan,
}

/// Whether another scan may be requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quota {
    pub has_quota: bool,
    pub scans_remaining: u64,
    pub tokens_remaining: u64,
    pub message: Option<String>,
}

impl UsageSummary {
    pub fn quota(&self) -> Quota {
        let scans_remaining = self.scans_limit.saturating_sub(self.scans_used);
        let tokens_remaining = self.tokens_limit.saturating_sub(self.tokens_used);
        let has_quota = scans_remaining > 0 && tokens_remaining > 0;

        let message = match (has_quota, scans_remaining) {
            (true, _) => None,
            (false, 0) => Some(format!(
                "You've reached your monthly scan limit ({} scans). Upgrade to Pro for more.",
                self.scans_limit
            )),
            (false, _) => Some(
                "You've reached your monthly token limit. Upgrade for more tokens.".to_string(),
            ),
        };

        Quota {
            has_quota,
            scans_remaining,
            tokens_remaining,
            message,
        }
    }
}

pub fn month_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

/// Reads the identity's usage counters. Counters are maintained by the
/// backend; a month without a row reads as zero.
pub struct UsageService {
    queries: Arc<QueryService>,
    plans: PlansConfig,
}

impl UsageService {
    pub fn new(queries: Arc<QueryService>, plans: PlansConfig) -> Self {
        Self { queries, plans }
    }

    pub async fn current(&self) -> SyncResult<UsageSummary> {
        self.for_month(&month_key(Utc::now())).await
    }

    pub async fn for_month(&self, month: &str) -> SyncResult<UsageSummary> {
        let profile = self
            .queries
            .session()
            .identity_now()
            .ok_or_else(|| SyncError::unauthorized("not signed in"))?;
        let limits = self.plans.limits(profile.plan);

        let row = self
            .queries
            .fetch_collection::<Usage>(Query::new().filter(Filter::eq("month", month)).limit(1))
            .await?
            .into_iter()
            .next();
        debug!("Usage for {} in {}: {:?}", profile.id, month, row);

        let (scans_used, tokens_used) = row
            .map(|usage| (usage.scans_count, usage.tokens_used))
            .unwrap_or_default();

        Ok(UsageSummary {
            scans_used,
            scans_limit: limits.scans,
            tokens_used,
            tokens_limit: limits.tokens,
            month: month.to_string(),
            plan: profile.plan,
        })
    }
}
