use crate::{Entity, EntityKind};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monthly usage counters for one identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Usage {
    pub id: Uuid,
    pub user_id: Uuid,
    /// `YYYY-MM`
    pub month: String,
    #[serde(default)]
    pub scans_count: u64,
    #[serde(default)]
    pub tokens_used: u64,
}

impl Usage {
    /// First instant of the month, if `month` is well formed
    pub fn month_start(&self) -> Option<DateTime<Utc>> {
        NaiveDate::parse_from_str(&format!("{}-01", self.month), "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

impl Entity for Usage {
    const KIND: EntityKind = EntityKind::Usage;

    fn id(&self) -> Uuid {
        self.id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.month_start().unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn owner_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}
