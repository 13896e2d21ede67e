use crate::{Entity, NewScan, ScanJob, ScanStatus, ScanType, TargetType};

use chrono::{TimeZone, Utc};
use googletest::prelude::*;
use serde_json::json;
use uuid::Uuid;

fn row(status: &str) -> serde_json::Value {
    json!({
        "id": "5d1c6a8e-8f5f-4f5e-9a51-0a6a9b0c2e11",
        "user_id": "0f4e1f6e-3c11-4f0b-a8a4-7f6b2d9e8c10",
        "target": "https://example.com",
        "target_type": "url",
        "scan_type": "quick",
        "status": status,
        "created_at": "2025-03-01T10:00:00Z",
        "started_at": null,
        "completed_at": null,
        "vulnerabilities_found": null,
        "critical_count": 2
    })
}

#[test]
fn given_row_with_null_counts_when_decoded_then_counts_are_zero() {
    // Given
    let value = row("pending");

    // When
    let scan = ScanJob::from_row(value).unwrap();

    // Then
    assert_that!(scan.vulnerabilities_found, eq(0));
    assert_that!(scan.critical_count, eq(2));
    assert_that!(scan.high_count, eq(0));
    assert_that!(scan.status, eq(ScanStatus::Pending));
    assert_that!(
        scan.order_key(),
        eq(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap())
    );
}

#[test]
fn given_row_with_unknown_status_when_decoded_then_malformed_row() {
    // Given
    let value = row("exploded");

    // When
    let result = ScanJob::from_row(value);

    // Then
    let err = result.unwrap_err();
    assert_that!(err.to_string(), contains_substring("Malformed scans row"));
}

#[test]
fn given_terminal_scan_when_running_record_arrives_then_not_superseded() {
    // Given
    let completed = ScanJob::from_row(row("completed")).unwrap();
    let running = ScanJob::from_row(row("running")).unwrap();

    // When / Then
    assert_that!(running.supersedes(&completed), eq(false));
    assert_that!(completed.supersedes(&running), eq(true));
    assert_that!(completed.supersedes(&completed), eq(true));
}

#[test]
fn given_blank_target_when_new_scan_then_validation_error() {
    let result = NewScan::new("   ", TargetType::Url, ScanType::Deep);

    assert!(result.is_err());
}

#[test]
fn given_repository_target_when_new_scan_then_pending_with_repo() {
    // Given
    let repo_id = Uuid::new_v4();

    // When
    let scan = NewScan::new(" acme/api ", TargetType::Repository, ScanType::Deep)
        .unwrap()
        .with_repository(repo_id, Some("main".to_string()));

    // Then
    assert_that!(scan.target, eq("acme/api"));
    assert_that!(scan.status, eq(ScanStatus::Pending));
    assert_that!(scan.repo_id, some(eq(repo_id)));

    let body = serde_json::to_value(&scan).unwrap();
    assert_that!(body["status"], eq(&json!("pending")));
    assert_that!(body["repo_branch"], eq(&json!("main")));
}
