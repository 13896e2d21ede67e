use crate::models::serde_helpers::zero_if_null;
use crate::{CoreError, CoreResult, Entity, EntityKind, ScanStatus, ScanType, TargetType};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanJob {
    pub id: Uuid,
    pub user_id: Uuid,

    pub target: String,
    pub target_type: TargetType,
    pub scan_type: ScanType,
    pub status: ScanStatus,

    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub sandbox_id: Option<String>,
    #[serde(default)]
    pub report_url: Option<String>,

    // Repository targets
    #[serde(default)]
    pub repo_id: Option<Uuid>,
    #[serde(default)]
    pub repo_branch: Option<String>,
    #[serde(default)]
    pub repo_commit_sha: Option<String>,

    // Findings
    #[serde(default, deserialize_with = "zero_if_null")]
    pub vulnerabilities_found: u32,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub critical_count: u32,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub high_count: u32,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub medium_count: u32,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub low_count: u32,
}

/// Findings of one scan grouped by severity tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub total: u32,
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl ScanJob {
    pub fn severity_counts(&self) -> SeverityCounts {
        SeverityCounts {
            total: self.vulnerabilities_found,
            critical: self.critical_count,
            high: self.high_count,
            medium: self.medium_count,
            low: self.low_count,
        }
    }

    /// Wall-clock run time, once both ends are known
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) if end >= start => Some(end - start),
            _ => None,
        }
    }
}

impl Entity for ScanJob {
    const KIND: EntityKind = EntityKind::Scan;

    fn id(&self) -> Uuid {
        self.id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn owner_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    fn supersedes(&self, current: &Self) -> bool {
        self.status.can_follow(current.status)
    }
}

/// Fields submitted when requesting a scan; the store assigns id and timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct NewScan {
    pub target: String,
    pub target_type: TargetType,
    pub scan_type: ScanType,
    pub status: ScanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_branch: Option<String>,
}

impl NewScan {
    #[track_caller]
    pub fn new(
        target: impl Into<String>,
        target_type: TargetType,
        scan_type: ScanType,
    ) -> CoreResult<Self> {
        let target = target.into().trim().to_string();
        if target.is_empty() {
            return Err(CoreError::validation(
                "scan target cannot be empty",
                Some("target"),
            ));
        }

        Ok(Self {
            target,
            target_type,
            scan_type,
            status: ScanStatus::Pending,
            repo_id: None,
            repo_branch: None,
        })
    }

    pub fn with_repository(mut self, repo_id: Uuid, branch: Option<String>) -> Self {
        self.repo_id = Some(repo_id);
        self.repo_branch = branch;
        self
    }
}
