use crate::ScanStatus;

use std::str::FromStr;

#[test]
fn test_scan_status_as_str() {
    assert_eq!(ScanStatus::Pending.as_str(), "pending");
    assert_eq!(ScanStatus::Running.as_str(), "running");
    assert_eq!(ScanStatus::Completed.as_str(), "completed");
    assert_eq!(ScanStatus::Failed.as_str(), "failed");
    assert_eq!(ScanStatus::Cancelled.as_str(), "cancelled");
}

#[test]
fn test_scan_status_from_str() {
    assert_eq!(
        ScanStatus::from_str("running").unwrap(),
        ScanStatus::Running
    );
    assert_eq!(
        ScanStatus::from_str("cancelled").unwrap(),
        ScanStatus::Cancelled
    );
    assert!(ScanStatus::from_str("done").is_err());
}

#[test]
fn test_scan_status_default() {
    assert_eq!(ScanStatus::default(), ScanStatus::Pending);
}

#[test]
fn test_scan_status_terminal_states() {
    for status in ScanStatus::TERMINAL {
        assert!(status.is_terminal());
        assert!(!status.is_active());
    }
    assert!(ScanStatus::Pending.is_active());
    assert!(ScanStatus::Running.is_active());
}

#[test]
fn test_scan_status_forward_progression_accepted() {
    assert!(ScanStatus::Running.can_follow(ScanStatus::Pending));
    assert!(ScanStatus::Completed.can_follow(ScanStatus::Running));
    assert!(ScanStatus::Failed.can_follow(ScanStatus::Pending));
    assert!(ScanStatus::Running.can_follow(ScanStatus::Running));
}

#[test]
fn test_scan_status_backward_progression_rejected() {
    assert!(!ScanStatus::Pending.can_follow(ScanStatus::Running));
    assert!(!ScanStatus::Running.can_follow(ScanStatus::Completed));
    assert!(!ScanStatus::Pending.can_follow(ScanStatus::Cancelled));
}

#[test]
fn test_scan_status_terminal_is_final() {
    assert!(ScanStatus::Completed.can_follow(ScanStatus::Completed));
    assert!(!ScanStatus::Failed.can_follow(ScanStatus::Completed));
    assert!(!ScanStatus::Cancelled.can_follow(ScanStatus::Failed));
}
