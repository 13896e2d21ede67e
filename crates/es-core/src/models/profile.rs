use crate::{CoreError, CoreResult, Entity, EntityKind, Plan};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated identity and its mutable profile fields.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub stripe_customer_id: Option<String>,

    // Third-party linkage
    #[serde(default)]
    pub github_username: Option<String>,
    #[serde(default)]
    pub github_access_token: Option<String>,
    #[serde(default)]
    pub github_connected_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_github_connected(&self) -> bool {
        self.github_access_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("plan", &self.plan)
            .field("github_username", &self.github_username)
            .field(
                "github_access_token",
                &self.github_access_token.as_ref().map(|_| "***"),
            )
            .field("github_connected_at", &self.github_connected_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Entity for Profile {
    const KIND: EntityKind = EntityKind::Profile;

    fn id(&self) -> Uuid {
        self.id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn owner_id(&self) -> Option<Uuid> {
        Some(self.id)
    }
}

/// Row created on first authentication.
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub plan: Plan,
}

impl NewProfile {
    pub fn new(id: Uuid, email: String) -> Self {
        Self {
            id,
            email,
            full_name: None,
            avatar_url: None,
            plan: Plan::Free,
        }
    }
}

/// User-editable profile fields; unset fields are left as stored.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn full_name(mut self, name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CoreError::validation(
                "full name cannot be empty",
                Some("full_name"),
            ));
        }
        self.full_name = Some(name);
        Ok(self)
    }

    pub fn avatar_url(mut self, url: impl Into<String>) -> CoreResult<Self> {
        let url = url.into().trim().to_string();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(CoreError::validation(
                format!("avatar url must be http(s), got {url:?}"),
                Some("avatar_url"),
            ));
        }
        self.avatar_url = Some(url);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.avatar_url.is_none()
    }
}
