use super::fixtures::{Harness, at, settle};
use crate::SubscriptionState;

use es_core::{
    ChangeRecord, ChangeSink, EntityKind, ErrorKind, Filter, NewScan, ScanJob, ScanStatus,
    ScanType, TargetType,
};
use es_realtime::RetryPolicy;
use es_store::EntityStore;

use std::time::Duration;

use googletest::prelude::*;
use serde_json::json;

fn new_scan(target: &str) -> NewScan {
    NewScan::new(target, TargetType::Url, ScanType::Quick).unwrap()
}

fn patient_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 200,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(10),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

#[tokio::test]
async fn given_seeded_scans_when_watched_then_live_with_snapshot_newest_first() {
    // Given
    let harness = Harness::signed_in().await;
    let older = harness.seed_scan(ScanStatus::Completed, at(1));
    let newer = harness.seed_scan(ScanStatus::Running, at(2));

    // When
    let view = harness.client().watch_scans(None).unwrap();
    view.ready().await.unwrap();

    // Then
    let ids: Vec<_> = view.items().iter().map(|s| s.id).collect();
    assert_that!(ids, eq(&vec![newer, older]));
    assert_that!(view.state(), eq(SubscriptionState::Live));
}

#[tokio::test]
async fn given_live_view_when_scan_created_then_event_applied() {
    // Given
    let harness = Harness::signed_in().await;
    let client = harness.client();
    let view = client.watch_scans(None).unwrap();
    view.ready().await.unwrap();

    // When
    let created = client.create_scan(new_scan("https://a.example")).await.unwrap();

    // Then
    settle(&view, |v| v.len() == 1).await;
    assert_that!(view.get(created.id).map(|s| s.status), some(eq(ScanStatus::Pending)));
}

#[tokio::test]
async fn given_created_scan_when_engine_progresses_then_view_shows_final_counts() {
    // Given
    let harness = Harness::signed_in().await;
    let client = harness.client();
    let view = client.watch_scans(None).unwrap();
    view.ready().await.unwrap();
    let created = client
        .create_scan(new_scan("https://example.com"))
        .await
        .unwrap();
    assert_that!(created.status, eq(ScanStatus::Pending));

    // When
    let token = harness.session.access_token().await.unwrap();
    let by_id = [Filter::eq("id", created.id.to_string())];
    harness
        .store
        .update(&token, EntityKind::Scan, &by_id, json!({"status": "running"}))
        .await
        .unwrap();
    harness
        .store
        .update(
            &token,
            EntityKind::Scan,
            &by_id,
            json!({"status": "completed", "vulnerabilities_found": 3, "critical_count": 1}),
        )
        .await
        .unwrap();

    // Then
    settle(&view, |v| {
        v.get(created.id)
            .is_some_and(|s| s.status == ScanStatus::Completed)
    })
    .await;
    let items = view.items();
    assert_that!(items.len(), eq(1));
    assert_that!(items[0].id, eq(created.id));
    assert_that!(items[0].vulnerabilities_found, eq(3));
    assert_that!(items[0].critical_count, eq(1));
}

#[tokio::test]
async fn given_redelivered_older_update_when_applied_then_completed_kept() {
    // Given
    let harness = Harness::signed_in().await;
    let id = harness.seed_scan(ScanStatus::Pending, at(1));
    let view = harness.client().watch_scans(None).unwrap();
    view.ready().await.unwrap();
    let row = harness.store.rows(EntityKind::Scan).remove(0);
    let with_status = |status: &str| {
        let mut row = row.clone();
        row["status"] = json!(status);
        row
    };

    // When
    harness.feed.publish(ChangeRecord::update(
        EntityKind::Scan,
        with_status("completed"),
        with_status("running"),
    ));
    harness.feed.publish(ChangeRecord::update(
        EntityKind::Scan,
        with_status("running"),
        with_status("pending"),
    ));
    harness.feed.publish(ChangeRecord::update(
        EntityKind::Scan,
        json!({"id": id, "user_id": harness.user_id, "status": "broken"}),
        json!({}),
    ));

    // Then
    settle(&view, |v| {
        v.get(id).is_some_and(|s| s.status == ScanStatus::Completed)
    })
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_that!(view.get(id).map(|s| s.status), some(eq(ScanStatus::Completed)));
    assert_that!(view.state(), eq(SubscriptionState::Live));
}

#[tokio::test]
async fn given_disconnect_when_remote_changes_during_gap_then_view_matches_after_reconnect() {
    // Given
    let harness = Harness::signed_in().await;
    let kept = harness.seed_scan(ScanStatus::Running, at(1));
    let removed = harness.seed_scan(ScanStatus::Pending, at(2));
    let client = harness.client().with_retry_policy(patient_retry());
    let view = client.watch_scans(None).unwrap();
    view.ready().await.unwrap();

    // When
    harness.feed.set_available(false);
    harness.feed.drop_connections();
    settle(&view, |v| v.state() == SubscriptionState::Reconnecting).await;

    let added = client.create_scan(new_scan("https://b.example")).await.unwrap();
    client
        .queries()
        .delete_entity::<ScanJob>(removed)
        .await
        .unwrap();
    assert_that!(view.len(), eq(2));

    harness.feed.set_available(true);

    // Then
    settle(&view, |v| {
        v.state() == SubscriptionState::Live && v.get(added.id).is_some()
    })
    .await;
    let ids: Vec<_> = view.items().iter().map(|s| s.id).collect();
    assert_that!(ids, eq(&vec![added.id, kept]));
    assert_that!(view.last_error().map(|e| e.kind), some(eq(ErrorKind::RemoteUnavailable)));
}

#[tokio::test]
async fn given_feed_down_when_retries_exhausted_then_closed_with_unavailable() {
    // Given
    let harness = Harness::signed_in().await;
    harness.feed.set_available(false);

    // When
    let view = harness.client().watch_scans(None).unwrap();
    let err = view.ready().await.unwrap_err();

    // Then
    assert_that!(err.kind, eq(ErrorKind::RemoteUnavailable));
    assert_that!(view.state(), eq(SubscriptionState::Closed));
    assert_that!(harness.feed.open_calls(), eq(3));
}

#[tokio::test]
async fn given_live_view_when_gap_fill_keeps_failing_then_closed_with_unavailable() {
    // Given
    let harness = Harness::signed_in().await;
    harness.seed_scan(ScanStatus::Running, at(1));
    let view = harness.client().watch_scans(None).unwrap();
    view.ready().await.unwrap();

    // When
    harness.store.set_available(false);
    harness.feed.drop_connections();

    // Then
    settle(&view, |v| v.state() == SubscriptionState::Closed).await;
    assert_that!(view.last_error().map(|e| e.kind), some(eq(ErrorKind::RemoteUnavailable)));
    assert_that!(harness.feed.open_calls(), le(4));
    assert_that!(harness.feed.subscriber_count(), eq(0));
}

#[tokio::test]
async fn given_unsubscribed_view_when_scan_created_then_not_applied() {
    // Given
    let harness = Harness::signed_in().await;
    let client = harness.client();
    let view = client.watch_scans(None).unwrap();
    view.ready().await.unwrap();

    // When
    view.unsubscribe();
    client.create_scan(new_scan("https://c.example")).await.unwrap();

    // Then
    assert_that!(view.state(), eq(SubscriptionState::Closed));
    assert!(view.ready().await.is_ok());
    assert_that!(view.last_error(), none());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(view.is_empty());
    assert_that!(harness.feed.subscriber_count(), eq(0));
    assert_that!(harness.session.subscription_count(), eq(0));
}

#[tokio::test]
async fn given_live_views_when_signed_out_then_closed() {
    let harness = Harness::signed_in().await;
    let client = harness.client();
    let scans = client.watch_scans(None).unwrap();
    let repos = client.watch_linked_repos().unwrap();
    scans.ready().await.unwrap();
    repos.ready().await.unwrap();

    harness.session.sign_out().await;

    assert_that!(scans.state(), eq(SubscriptionState::Closed));
    assert_that!(repos.state(), eq(SubscriptionState::Closed));
    let err = scans.ready().await.unwrap_err();
    assert_that!(err.kind, eq(ErrorKind::Unauthorized));
}

#[tokio::test]
async fn given_signed_out_when_watching_then_unauthorized() {
    let harness = Harness::new();

    let err = harness.client().watch_scans(None).err().unwrap();

    assert_that!(err.kind(), eq(ErrorKind::Unauthorized));
}

#[tokio::test]
async fn given_scan_logs_when_watched_then_oldest_first_and_append_only() {
    // Given
    let harness = Harness::signed_in().await;
    let scan = harness.seed_scan(ScanStatus::Running, at(0));
    let view = harness.client().watch_scan_logs(scan).unwrap();
    view.ready().await.unwrap();
    let token = harness.session.access_token().await.unwrap();

    // When
    for (minute, message) in [(1, "starting"), (2, "probing")] {
        harness
            .store
            .insert(
                &token,
                EntityKind::ScanLog,
                json!({
                    "scan_id": scan,
                    "level": "info",
                    "message": message,
                    "timestamp": at(minute).to_rfc3339(),
                }),
            )
            .await
            .unwrap();
    }

    // Then
    settle(&view, |v| v.len() == 2).await;
    let messages: Vec<String> = view.items().into_iter().map(|l| l.message).collect();
    assert_that!(messages, eq(&vec!["starting".to_string(), "probing".to_string()]));
}

#[tokio::test]
async fn given_single_scan_view_when_cancelled_then_reflects_cancellation() {
    // Given
    let harness = Harness::signed_in().await;
    let id = harness.seed_scan(ScanStatus::Running, at(0));
    let client = harness.client();
    let view = client.watch_scan(id).unwrap();
    view.ready().await.unwrap();

    // When
    let cancelled = client.cancel_scan(id).await.unwrap();
    view.record_mutation(cancelled);

    // Then
    assert_that!(view.get(id).map(|s| s.status), some(eq(ScanStatus::Cancelled)));
    let err = client.cancel_scan(id).await.unwrap_err();
    assert_that!(err.kind(), eq(ErrorKind::Conflict));
}
