use crate::{EntityStore, StoreError, StoreResult};

use es_core::{AccessToken, EntityKind, Filter, Query};

use async_trait::async_trait;
use log::debug;
use reqwest::{Client as ReqwestClient, Method, Url};
use serde_json::Value;

const RETURN_REPRESENTATION: &str = "return=representation";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

/// Entity store backed by the hosted REST table interface
pub struct RestStore {
    pub base_url: String,
    anon_key: String,
    client: ReqwestClient,
}

impl RestStore {
    /// Create a new store client
    ///
    /// # Arguments
    /// * `base_url` - Project URL (e.g., "https://abc.supabase.co")
    /// * `anon_key` - Public project key sent as `apikey`
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self::with_client(base_url, anon_key, ReqwestClient::new())
    }

    pub fn with_client(base_url: &str, anon_key: &str, client: ReqwestClient) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client,
        }
    }

    /// `{base}/rest/v1/{table}` with the given query pairs
    fn table_url(&self, kind: EntityKind, pairs: &[(String, String)]) -> StoreResult<Url> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, kind.table()))
            .map_err(|e| StoreError::unexpected(format!("invalid store URL: {e}")))?;
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Build a request carrying the project key and the caller's bearer token
    fn request(&self, method: Method, url: Url, token: &AccessToken) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token.as_str())
    }

    /// Execute request and map non-success responses
    async fn execute(&self, req: reqwest::RequestBuilder) -> StoreResult<Value> {
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
            let code = body
                .get("code")
                .and_then(|v| v.as_str())
                .unwrap_or("UNKNOWN")
                .to_string();
            let message = body
                .get("message")
                .and_then(|v| v.as_str())
                .map(String::from)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(StoreError::status(status.as_u16(), code, message));
        }

        if text.trim().is_empty() {
            return Ok(Value::Array(Vec::new()));
        }

        Ok(serde_json::from_str(&text)?)
    }

    fn into_rows(body: Value) -> StoreResult<Vec<Value>> {
        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(StoreError::unexpected(format!(
                "expected an array of rows, got {other}"
            ))),
        }
    }

    fn first_row(body: Value) -> StoreResult<Value> {
        Self::into_rows(body)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::unexpected("write returned no representation"))
    }

    fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
        filters.iter().map(Filter::to_query_pair).collect()
    }
}

#[async_trait]
impl EntityStore for RestStore {
    async fn select(
        &self,
        token: &AccessToken,
        kind: EntityKind,
        query: &Query,
    ) -> StoreResult<Vec<Value>> {
        let url = self.table_url(kind, &query.to_query_pairs())?;
        debug!("GET {url}");
        let req = self.request(Method::GET, url, token);
        Self::into_rows(self.execute(req).await?)
    }

    async fn insert(&self, token: &AccessToken, kind: EntityKind, row: Value) -> StoreResult<Value> {
        let url = self.table_url(kind, &[])?;
        debug!("POST {url}");
        let req = self
            .request(Method::POST, url, token)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&row);
        Self::first_row(self.execute(req).await?)
    }

    async fn upsert(
        &self,
        token: &AccessToken,
        kind: EntityKind,
        row: Value,
        on_conflict: &str,
    ) -> StoreResult<Value> {
        let url = self.table_url(kind, &[("on_conflict".to_string(), on_conflict.to_string())])?;
        debug!("POST (upsert) {url}");
        let req = self
            .request(Method::POST, url, token)
            .header("Prefer", MERGE_DUPLICATES)
            .json(&row);
        Self::first_row(self.execute(req).await?)
    }

    async fn update(
        &self,
        token: &AccessToken,
        kind: EntityKind,
        filters: &[Filter],
        patch: Value,
    ) -> StoreResult<Vec<Value>> {
        let url = self.table_url(kind, &Self::filter_pairs(filters))?;
        debug!("PATCH {url}");
        let req = self
            .request(Method::PATCH, url, token)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&patch);
        Self::into_rows(self.execute(req).await?)
    }

    async fn delete(
        &self,
        token: &AccessToken,
        kind: EntityKind,
        filters: &[Filter],
    ) -> StoreResult<Vec<Value>> {
        let url = self.table_url(kind, &Self::filter_pairs(filters))?;
        debug!("DELETE {url}");
        let req = self
            .request(Method::DELETE, url, token)
            .header("Prefer", RETURN_REPRESENTATION);
        Self::into_rows(self.execute(req).await?)
    }
}
