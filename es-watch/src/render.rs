//! JSON shapes printed by the commands.

use es_core::{LinkedRepository, Profile, ScanJob, ScanLogEntry};
use es_sync::{DashboardStats, GithubRepo, UsageSummary};

use serde_json::{Value, json};

pub fn scan(scan: &ScanJob) -> Value {
    let counts = scan.severity_counts();
    json!({
        "id": scan.id,
        "status": scan.status.as_str(),
        "scan_type": scan.scan_type.as_str(),
        "target": scan.target,
        "target_type": scan.target_type.as_str(),
        "findings": {
            "total": counts.total,
            "critical": counts.critical,
            "high": counts.high,
            "medium": counts.medium,
            "low": counts.low,
        },
        "created_at": scan.created_at.to_rfc3339(),
        "completed_at": scan.completed_at.map(|t| t.to_rfc3339()),
        "duration_secs": scan.duration().map(|d| d.num_seconds()),
        "report_url": scan.report_url,
    })
}

pub fn scans(scans: &[ScanJob]) -> Value {
    Value::Array(scans.iter().map(scan).collect())
}

pub fn log_entry(entry: &ScanLogEntry) -> Value {
    json!({
        "scan_id": entry.scan_id,
        "timestamp": entry.timestamp.to_rfc3339(),
        "level": entry.level.as_str(),
        "message": entry.message,
    })
}

pub fn usage(summary: &UsageSummary) -> Value {
    let quota = summary.quota();
    json!({
        "month": summary.month,
        "plan": summary.plan.as_str(),
        "scans": {
            "used": summary.scans_used,
            "limit": summary.scans_limit,
            "remaining": quota.scans_remaining,
        },
        "tokens": {
            "used": summary.tokens_used,
            "limit": summary.tokens_limit,
            "remaining": quota.tokens_remaining,
        },
        "has_quota": quota.has_quota,
        "message": quota.message,
    })
}

pub fn stats(stats: &DashboardStats) -> Value {
    json!({
        "active_scans": stats.active_scans,
        "completed_scans": stats.completed_scans,
        "total_findings": stats.total_findings,
        "critical_findings": stats.critical_findings,
        "trends": stats.trends.map(|t| json!({
            "findings_change": t.findings_change,
            "critical_change": t.critical_change,
            "completed_change": t.completed_change,
        })),
    })
}

pub fn profile(profile: &Profile) -> Value {
    json!({
        "id": profile.id,
        "email": profile.email,
        "name": profile.display_name(),
        "avatar_url": profile.avatar_url,
        "plan": profile.plan.as_str(),
        "github_connected": profile.is_github_connected(),
        "github_username": profile.github_username,
        "github_connected_at": profile.github_connected_at.map(|t| t.to_rfc3339()),
    })
}

pub fn linked_repo(repo: &LinkedRepository) -> Value {
    json!({
        "id": repo.id,
        "full_name": repo.repo_full_name,
        "url": repo.repo_url,
        "default_branch": repo.default_branch,
        "private": repo.is_private,
        "last_scanned_at": repo.last_scanned_at.map(|t| t.to_rfc3339()),
    })
}

pub fn remote_repo(repo: &GithubRepo) -> Value {
    json!({
        "id": repo.id,
        "full_name": repo.full_name,
        "url": repo.html_url,
        "default_branch": repo.default_branch,
        "private": repo.private,
    })
}
