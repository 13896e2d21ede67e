use crate::render;

use es_core::{Plan, ScanJob};
use es_sync::{DashboardStats, NoTrends, UsageSummary};

use googletest::prelude::*;
use serde_json::json;
use uuid::Uuid;

fn completed_scan() -> ScanJob {
    serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "user_id": Uuid::new_v4(),
        "target": "https://target.example",
        "target_type": "url",
        "scan_type": "deep",
        "status": "completed",
        "created_at": "2026-03-01T10:00:00Z",
        "started_at": "2026-03-01T10:00:05Z",
        "completed_at": "2026-03-01T10:02:05Z",
        "vulnerabilities_found": 4,
        "critical_count": 1,
        "high_count": 2,
        "medium_count": 1,
        "low_count": 0,
    }))
    .unwrap()
}

#[test]
fn given_completed_scan_when_rendered_then_findings_and_duration_shown() {
    let rendered = render::scan(&completed_scan());

    assert_that!(rendered["status"].as_str(), some(eq("completed")));
    assert_that!(rendered["findings"]["critical"].as_u64(), some(eq(1)));
    assert_that!(rendered["findings"]["total"].as_u64(), some(eq(4)));
    assert_that!(rendered["duration_secs"].as_i64(), some(eq(120)));
}

#[test]
fn given_exhausted_usage_when_rendered_then_message_included() {
    let summary = UsageSummary {
        scans_used: 5,
        scans_limit: 5,
        tokens_used: 10,
        tokens_limit: 100_000,
        month: "2026-03".to_string(),
        plan: Plan::Free,
    };

    let rendered = render::usage(&summary);

    assert_that!(rendered["has_quota"].as_bool(), some(eq(false)));
    assert_that!(rendered["scans"]["remaining"].as_u64(), some(eq(0)));
    assert_that!(rendered["plan"].as_str(), some(eq("free")));
    assert!(rendered["message"].as_str().is_some_and(|m| m.contains("5 scans")));
}

#[test]
fn given_stats_without_history_when_rendered_then_trends_null() {
    let stats = DashboardStats::from_scans(&[completed_scan()], &NoTrends);

    let rendered = render::stats(&stats);

    assert_that!(rendered["completed_scans"].as_u64(), some(eq(1)));
    assert!(rendered["trends"].is_null());
}
