use crate::{Entity, ErrorKind, Plan, Profile, ProfileUpdate};

use serde_json::json;

#[test]
fn test_profile_debug_redacts_github_token() {
    let profile = Profile::from_row(json!({
        "id": "0f4e1f6e-3c11-4f0b-a8a4-7f6b2d9e8c10",
        "email": "dev@example.com",
        "github_username": "octo",
        "github_access_token": "gho_secret_value",
        "created_at": "2025-01-01T00:00:00Z"
    }))
    .unwrap();

    let printed = format!("{profile:?}");

    assert!(!printed.contains("gho_secret_value"));
    assert!(printed.contains("octo"));
    assert!(profile.is_github_connected());
    assert_eq!(profile.plan, Plan::Free);
    assert_eq!(profile.display_name(), "dev@example.com");
    assert_eq!(profile.owner_id(), Some(profile.id));
}

#[test]
fn test_profile_without_token_is_not_connected() {
    let profile = Profile::from_row(json!({
        "id": "0f4e1f6e-3c11-4f0b-a8a4-7f6b2d9e8c10",
        "email": "dev@example.com",
        "full_name": "Dev Eloper",
        "plan": "pro",
        "github_access_token": "",
        "created_at": "2025-01-01T00:00:00Z"
    }))
    .unwrap();

    assert!(!profile.is_github_connected());
    assert_eq!(profile.plan, Plan::Pro);
    assert_eq!(profile.display_name(), "Dev Eloper");
}

#[test]
fn test_profile_update_trims_name_and_serializes_only_set_fields() {
    let update = ProfileUpdate::default().full_name("  Ada Lovelace ").unwrap();

    assert_eq!(update.full_name.as_deref(), Some("Ada Lovelace"));
    assert!(!update.is_empty());
    assert_eq!(
        serde_json::to_value(&update).unwrap(),
        json!({"full_name": "Ada Lovelace"})
    );
}

#[test]
fn test_profile_update_rejects_blank_name_and_non_http_avatar() {
    let blank = ProfileUpdate::default().full_name("   ").unwrap_err();
    let avatar = ProfileUpdate::default()
        .avatar_url("file:///etc/passwd")
        .unwrap_err();

    assert_eq!(blank.kind(), ErrorKind::ValidationRejected);
    assert_eq!(avatar.kind(), ErrorKind::ValidationRejected);
    assert!(ProfileUpdate::default().is_empty());
}
