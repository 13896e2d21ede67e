use crate::{QueryService, SessionContext, SyncError, SyncResult};

use es_config::GithubConfig;
use es_core::{LinkedRepository, NewLinkedRepository, Order, Provider, Query};

use std::sync::Arc;

use log::{debug, info};
use reqwest::{Client as ReqwestClient, StatusCode, Url};
use serde::Deserialize;
use uuid::Uuid;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("esprit-sync/", env!("CARGO_PKG_VERSION"));
const LINKED_REPO_CONFLICT: &str = "user_id,repo_full_name";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GithubOwner {
    pub login: String,
}

/// A repository as listed by the GitHub REST API.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GithubRepo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: GithubOwner,
    pub html_url: String,
    pub default_branch: String,
    pub private: bool,
}

impl GithubRepo {
    fn to_linked(&self) -> NewLinkedRepository {
        NewLinkedRepository {
            provider: Provider::Github,
            repo_full_name: self.full_name.clone(),
            repo_name: self.name.clone(),
            repo_owner: self.owner.login.clone(),
            repo_url: self.html_url.clone(),
            default_branch: self.default_branch.clone(),
            is_private: self.private,
        }
    }
}

/// Repositories reachable through the linked GitHub account, and the subset
/// the identity has linked for scanning.
pub struct RepoService {
    session: Arc<SessionContext>,
    queries: Arc<QueryService>,
    api_url: String,
    client: ReqwestClient,
}

impl RepoService {
    pub fn new(queries: Arc<QueryService>, github: &GithubConfig) -> Self {
        Self::with_client(queries, github, ReqwestClient::new())
    }

    pub fn with_client(
        queries: Arc<QueryService>,
        github: &GithubConfig,
        client: ReqwestClient,
    ) -> Self {
        Self {
            session: Arc::clone(queries.session()),
            queries,
            api_url: github.api_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Up to 100 repositories, most recently updated first.
    pub async fn list_remote_repos(&self) -> SyncResult<Vec<GithubRepo>> {
        let profile = self
            .session
            .identity_now()
            .ok_or_else(|| SyncError::unauthorized("not signed in"))?;
        let token = profile
            .github_access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| SyncError::unauthorized("GitHub is not connected"))?;

        let url = Url::parse_with_params(
            &format!("{}/user/repos", self.api_url),
            &[("per_page", "100"), ("sort", "updated")],
        )
        .map_err(|e| SyncError::not_configured(format!("invalid github.api_url: {e}")))?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&token)
            .header("Accept", GITHUB_ACCEPT)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| SyncError::unavailable(format!("GitHub: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SyncError::unauthorized("GitHub token expired, reconnect"));
        }
        if !status.is_success() {
            return Err(SyncError::unavailable(format!(
                "Failed to fetch repos (status {})",
                status.as_u16()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| SyncError::unavailable(format!("GitHub: {e}")))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Link `repo` for scanning; linking it again refreshes its metadata.
    pub async fn link_repo(&self, repo: &GithubRepo) -> SyncResult<LinkedRepository> {
        let linked: LinkedRepository = self
            .queries
            .upsert_entity(repo.to_linked(), LINKED_REPO_CONFLICT)
            .await?;
        info!("Linked repository {}", linked.repo_full_name);
        Ok(linked)
    }

    pub async fn unlink_repo(&self, id: Uuid) -> SyncResult<()> {
        self.queries.delete_entity::<LinkedRepository>(id).await?;
        info!("Unlinked repository {}", id);
        Ok(())
    }

    pub async fn linked_repos(&self) -> SyncResult<Vec<LinkedRepository>> {
        self.queries
            .fetch_collection(Query::new().order_by(Order::desc("created_at")))
            .await
    }
}
