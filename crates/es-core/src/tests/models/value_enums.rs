use crate::{EntityKind, ErrorKind, Plan, Provider, ScanLogLevel, ScanType, TargetType};

use std::str::FromStr;

#[test]
fn test_target_type_round_trips_through_str() {
    for value in [TargetType::Url, TargetType::Repository] {
        assert_eq!(TargetType::from_str(value.as_str()).unwrap(), value);
    }
    assert!(TargetType::from_str("ftp").is_err());
}

#[test]
fn test_scan_type_from_str() {
    assert_eq!(ScanType::from_str("deep").unwrap(), ScanType::Deep);
    assert_eq!(ScanType::from_str("quick").unwrap(), ScanType::Quick);
    assert_eq!(
        ScanType::from_str("compliance").unwrap(),
        ScanType::Compliance
    );
    assert!(ScanType::from_str("Deep").is_err());
}

#[test]
fn test_plan_default_is_free() {
    assert_eq!(Plan::default(), Plan::Free);
    assert_eq!(Plan::from_str("team").unwrap(), Plan::Team);
}

#[test]
fn test_provider_and_log_level_from_str() {
    assert_eq!(Provider::from_str("gitlab").unwrap(), Provider::Gitlab);
    assert_eq!(
        ScanLogLevel::from_str("warning").unwrap(),
        ScanLogLevel::Warning
    );
    assert!(ScanLogLevel::from_str("debug").is_err());
}

#[test]
fn test_entity_kind_tables() {
    assert_eq!(EntityKind::Scan.table(), "scans");
    assert_eq!(EntityKind::ScanLog.table(), "scan_logs");
    assert_eq!(EntityKind::from_str("linked_repos").unwrap(), EntityKind::LinkedRepo);
    assert_eq!(EntityKind::Profile.owner_column(), Some("id"));
    assert_eq!(EntityKind::ScanLog.owner_column(), None);

    let err = EntityKind::from_str("invoices").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[test]
fn test_invalid_enum_value_is_validation_rejected() {
    let err = ScanType::from_str("full").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationRejected);
    assert!(!err.kind().is_retryable());
}
