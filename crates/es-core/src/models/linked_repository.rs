use crate::{Entity, EntityKind, Provider};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkedRepository {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: Provider,

    pub repo_full_name: String,
    pub repo_name: String,
    pub repo_owner: String,
    pub repo_url: String,
    pub default_branch: String,
    pub is_private: bool,

    #[serde(default)]
    pub last_scanned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for LinkedRepository {
    const KIND: EntityKind = EntityKind::LinkedRepo;

    fn id(&self) -> Uuid {
        self.id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn owner_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    fn supersedes(&self, current: &Self) -> bool {
        self.updated_at >= current.updated_at
    }
}

/// Upsert payload; `(user_id, repo_full_name)` identifies the row.
#[derive(Debug, Clone, Serialize)]
pub struct NewLinkedRepository {
    pub provider: Provider,
    pub repo_full_name: String,
    pub repo_name: String,
    pub repo_owner: String,
    pub repo_url: String,
    pub default_branch: String,
    pub is_private: bool,
}
