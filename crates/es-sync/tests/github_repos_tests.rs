//! Integration tests for the GitHub repository client using a wiremock server

use es_config::{GithubConfig, QueryConfig, SessionConfig};
use es_core::{ErrorKind, Profile, Provider};
use es_store::{MemoryIdentityProvider, MemoryStore};
use es_sync::{QueryService, RepoService, SessionContext};

use std::sync::Arc;

use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

/// Signed-in identity; `github_token` is stored on the profile when given.
async fn signed_in(github_token: Option<&str>) -> Arc<QueryService> {
    let provider = Arc::new(MemoryIdentityProvider::new());
    let store = Arc::new(MemoryStore::new());
    let user_id = provider.add_user("dev@example.com", "pw", json!({}));
    let session = SessionContext::new(provider, store.clone(), SessionConfig::default());
    session
        .sign_in_with_password("dev@example.com", "pw")
        .await
        .unwrap();

    let queries = Arc::new(QueryService::new(
        Arc::clone(&session),
        store,
        &QueryConfig::default(),
    ));
    if let Some(token) = github_token {
        queries
            .update_entity::<Profile>(
                user_id,
                json!({"github_access_token": token, "github_username": "octocat"}),
            )
            .await
            .unwrap();
        session.refresh_profile().await.unwrap();
    }
    queries
}

fn github(mock_server: &MockServer) -> GithubConfig {
    GithubConfig {
        api_url: mock_server.uri(),
        ..GithubConfig::default()
    }
}

fn repo_json(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "full_name": format!("octocat/{name}"),
        "owner": {"login": "octocat"},
        "html_url": format!("https://github.com/octocat/{name}"),
        "default_branch": "main",
        "private": id % 2 == 0,
        "stargazers_count": 3,
    })
}

#[tokio::test]
async fn test_list_remote_repos_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("per_page", "100"))
        .and(query_param("sort", "updated"))
        .and(header("authorization", "Bearer gho_secret"))
        .and(header("accept", "application/vnd.github.v3+json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([repo_json(1, "hello"), repo_json(2, "private-api")])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let repos = RepoService::new(signed_in(Some("gho_secret")).await, &github(&mock_server));
    let listed = repos.list_remote_repos().await.unwrap();

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].full_name, "octocat/hello");
    assert_eq!(listed[0].owner.login, "octocat");
    assert!(listed[1].private);
}

#[tokio::test]
async fn test_listed_repo_can_be_linked() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([repo_json(1, "hello")])))
        .mount(&mock_server)
        .await;

    let repos = RepoService::new(signed_in(Some("gho_secret")).await, &github(&mock_server));
    let listed = repos.list_remote_repos().await.unwrap();
    let linked = repos.link_repo(&listed[0]).await.unwrap();

    assert_eq!(linked.provider, Provider::Github);
    assert_eq!(linked.repo_full_name, "octocat/hello");
    assert_eq!(linked.default_branch, "main");
    assert_eq!(repos.linked_repos().await.unwrap().len(), 1);

    repos.unlink_repo(linked.id).await.unwrap();
    assert!(repos.linked_repos().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_expired_github_token_is_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
        .mount(&mock_server)
        .await;

    let repos = RepoService::new(signed_in(Some("gho_stale")).await, &github(&mock_server));
    let err = repos.list_remote_repos().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(err.to_string().contains("reconnect"));
}

#[tokio::test]
async fn test_github_outage_is_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let repos = RepoService::new(signed_in(Some("gho_secret")).await, &github(&mock_server));
    let err = repos.list_remote_repos().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
    assert!(err.to_string().contains("status 503"));
}

#[tokio::test]
async fn test_not_connected_never_calls_github() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let repos = RepoService::new(signed_in(None).await, &github(&mock_server));
    let err = repos.list_remote_repos().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}
