use crate::{ChangeEvent, ChangeKind, ChangeRecord, EntityKind, ScanJob, ScanLogEntry};

use googletest::prelude::*;
use serde_json::json;
use uuid::Uuid;

fn log_row(id: Uuid) -> serde_json::Value {
    json!({
        "id": id.to_string(),
        "scan_id": Uuid::new_v4().to_string(),
        "timestamp": "2025-03-01T10:00:00Z",
        "level": "info",
        "message": "Cloning repository",
        "metadata": null
    })
}

#[test]
fn given_insert_record_when_decoded_then_insert_event() {
    // Given
    let id = Uuid::new_v4();
    let record = ChangeRecord::insert(EntityKind::ScanLog, log_row(id));

    // When
    let event = record.decode::<ScanLogEntry>().unwrap();

    // Then
    assert_that!(event.id(), eq(id));
    assert_that!(event.kind(), eq(ChangeKind::Insert));
    match event {
        ChangeEvent::Insert(entry) => {
            assert_that!(entry.metadata, eq(&json!({})));
        }
        other => panic!("expected insert, got {other:?}"),
    }
}

#[test]
fn given_delete_record_when_decoded_then_delete_by_old_id() {
    // Given
    let id = Uuid::new_v4();
    let record = ChangeRecord::delete(EntityKind::ScanLog, json!({"id": id.to_string()}));

    // When
    let event = record.decode::<ScanLogEntry>().unwrap();

    // Then
    assert_that!(event, eq(&ChangeEvent::Delete(id)));
    assert_that!(record.row_id(), some(eq(id)));
}

#[test]
fn given_delete_without_id_when_decoded_then_error() {
    let record = ChangeRecord::delete(EntityKind::ScanLog, json!({}));

    assert!(record.decode::<ScanLogEntry>().is_err());
}

#[test]
fn given_record_for_other_table_when_decoded_then_error() {
    let record = ChangeRecord::insert(EntityKind::ScanLog, log_row(Uuid::new_v4()));

    assert!(record.decode::<ScanJob>().is_err());
}

#[test]
fn test_change_kind_wire_names() {
    assert_eq!(ChangeKind::Update.as_str(), "UPDATE");
    assert_eq!("DELETE".parse::<ChangeKind>().unwrap(), ChangeKind::Delete);
    assert!("TRUNCATE".parse::<ChangeKind>().is_err());
}
