//! Integration tests for the REST entity store using a wiremock server

use es_core::{AccessToken, EntityKind, ErrorKind, Filter, Order, Query};
use es_store::{EntityStore, RestStore};

use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
};

fn token() -> AccessToken {
    AccessToken::new("jwt-123")
}

#[tokio::test]
async fn test_select_sends_filters_order_limit_and_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/scans"))
        .and(query_param("select", "*"))
        .and(query_param("user_id", "eq.u1"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "10"))
        .and(header("apikey", "anon"))
        .and(header("authorization", "Bearer jwt-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "00000000-0000-0000-0000-000000000001", "target": "https://a.example"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = RestStore::new(&mock_server.uri(), "anon");
    let query = Query::new()
        .filter(Filter::eq("user_id", "u1"))
        .order_by(Order::desc("created_at"))
        .limit(10);
    let rows = store.select(&token(), EntityKind::Scan, &query).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["target"], "https://a.example");
}

#[tokio::test]
async fn test_select_empty_result_is_ok() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/linked_repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = RestStore::new(&mock_server.uri(), "anon");
    let rows = store
        .select(&token(), EntityKind::LinkedRepo, &Query::new())
        .await
        .unwrap();

    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_insert_returns_representation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/scans"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({"target": "https://a.example"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": "00000000-0000-0000-0000-000000000002", "target": "https://a.example"}
        ])))
        .mount(&mock_server)
        .await;

    let store = RestStore::new(&mock_server.uri(), "anon");
    let row = store
        .insert(&token(), EntityKind::Scan, json!({"target": "https://a.example"}))
        .await
        .unwrap();

    assert_eq!(row["id"], "00000000-0000-0000-0000-000000000002");
}

#[tokio::test]
async fn test_upsert_sends_on_conflict_and_merge_preference() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/linked_repos"))
        .and(query_param("on_conflict", "user_id,repo_full_name"))
        .and(header(
            "prefer",
            "resolution=merge-duplicates,return=representation",
        ))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": "00000000-0000-0000-0000-000000000003", "repo_full_name": "acme/api"}
        ])))
        .mount(&mock_server)
        .await;

    let store = RestStore::new(&mock_server.uri(), "anon");
    let row = store
        .upsert(
            &token(),
            EntityKind::LinkedRepo,
            json!({"repo_full_name": "acme/api"}),
            "user_id,repo_full_name",
        )
        .await
        .unwrap();

    assert_eq!(row["repo_full_name"], "acme/api");
}

#[tokio::test]
async fn test_update_with_guard_filter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/scans"))
        .and(query_param("id", "eq.abc"))
        .and(query_param("status", "not.in.(completed,failed,cancelled)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = RestStore::new(&mock_server.uri(), "anon");
    let rows = store
        .update(
            &token(),
            EntityKind::Scan,
            &[
                Filter::eq("id", "abc"),
                Filter::not_in("status", ["completed", "failed", "cancelled"]),
            ],
            json!({"status": "cancelled"}),
        )
        .await
        .unwrap();

    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_delete_returns_removed_rows() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/linked_repos"))
        .and(query_param("user_id", "eq.u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "r1"}, {"id": "r2"}])))
        .mount(&mock_server)
        .await;

    let store = RestStore::new(&mock_server.uri(), "anon");
    let rows = store
        .delete(&token(), EntityKind::LinkedRepo, &[Filter::eq("user_id", "u1")])
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_jwt_rejection_maps_to_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/scans"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "PGRST301",
            "message": "JWT expired"
        })))
        .mount(&mock_server)
        .await;

    let store = RestStore::new(&mock_server.uri(), "anon");
    let err = store
        .select(&token(), EntityKind::Scan, &Query::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(err.to_string().contains("PGRST301"));
}

#[tokio::test]
async fn test_constraint_violation_maps_to_validation_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/scans"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "23514",
            "message": "new row violates check constraint \"scans_target_type_check\""
        })))
        .mount(&mock_server)
        .await;

    let store = RestStore::new(&mock_server.uri(), "anon");
    let err = store
        .insert(&token(), EntityKind::Scan, json!({"target_type": "ftp"}))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationRejected);
}

#[tokio::test]
async fn test_server_error_without_body_is_remote_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/scans"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let store = RestStore::new(&mock_server.uri(), "anon");
    let err = store
        .select(&token(), EntityKind::Scan, &Query::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
    assert!(err.kind().is_retryable());
}

#[tokio::test]
async fn test_unreachable_server_is_remote_unavailable() {
    let store = RestStore::new("http://127.0.0.1:9", "anon");

    let err = store
        .select(&token(), EntityKind::Scan, &Query::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
}

#[test]
fn test_base_url_trailing_slash_trimmed() {
    let store = RestStore::new("http://localhost:54321/", "anon");
    assert_eq!(store.base_url, "http://localhost:54321");
}
