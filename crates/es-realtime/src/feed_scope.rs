use es_core::{ChangeKind, ChangeRecord, EntityKind, Filter};

/// What one subscription listens to: a table and an optional equality filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedScope {
    pub table: EntityKind,
    pub filter: Option<Filter>,
}

impl FeedScope {
    pub fn table(table: EntityKind) -> Self {
        Self {
            table,
            filter: None,
        }
    }

    pub fn filtered(table: EntityKind, filter: Filter) -> Self {
        Self {
            table,
            filter: Some(filter),
        }
    }

    /// Channel topic name
    pub fn topic(&self) -> String {
        match self.filter.as_ref().and_then(Filter::to_feed_filter) {
            Some(filter) => format!("realtime:{}:{}", self.table.table(), filter),
            None => format!("realtime:{}", self.table.table()),
        }
    }

    /// Whether `record` belongs to this scope.
    ///
    /// Delete images usually carry only the primary key, so a delete whose old
    /// row lacks the filter column is let through; consumers ignore deletes
    /// for ids they never held.
    pub fn matches(&self, record: &ChangeRecord) -> bool {
        if record.table != self.table {
            return false;
        }
        let Some(filter) = &self.filter else {
            return true;
        };
        let row = record.row();
        if record.kind == ChangeKind::Delete && row.get(&filter.column).is_none() {
            return true;
        }
        filter.matches(row)
    }
}
