use crate::{CoreError, CoreResult};

use std::fmt::Debug;
use std::panic::Location;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

/// Remote tables this client reads and reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Profile,
    Scan,
    ScanLog,
    LinkedRepo,
    Usage,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Profile => "profiles",
            Self::Scan => "scans",
            Self::ScanLog => "scan_logs",
            Self::LinkedRepo => "linked_repos",
            Self::Usage => "usage",
        }
    }

    /// Column holding the owning identity id, if rows are identity-scoped.
    ///
    /// Scan logs are scoped through their parent scan instead.
    pub fn owner_column(&self) -> Option<&'static str> {
        match self {
            Self::Profile => Some("id"),
            Self::Scan | Self::LinkedRepo | Self::Usage => Some("user_id"),
            Self::ScanLog => None,
        }
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "profiles" => Ok(Self::Profile),
            "scans" => Ok(Self::Scan),
            "scan_logs" => Ok(Self::ScanLog),
            "linked_repos" => Ok(Self::LinkedRepo),
            "usage" => Ok(Self::Usage),
            _ => Err(CoreError::UnknownTable {
                value: s.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table())
    }
}

/// A typed record owned by the remote store.
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> Uuid;

    /// Display ordering key; ties are broken by arrival order.
    fn order_key(&self) -> DateTime<Utc>;

    fn owner_id(&self) -> Option<Uuid> {
        None
    }

    /// Whether this record may replace `current` (same id) in a local cache.
    fn supersedes(&self, _current: &Self) -> bool {
        true
    }

    #[track_caller]
    fn from_row(row: Value) -> CoreResult<Self> {
        serde_json::from_value(row).map_err(|e| CoreError::malformed_row(Self::KIND.table(), e))
    }
}
