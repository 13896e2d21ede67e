use crate::compare_values;

use std::cmp::Ordering;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    pub fn to_query_value(&self) -> String {
        let direction = if self.descending { "desc" } else { "asc" };
        format!("{}.{}", self.column, direction)
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let null = Value::Null;
        let ordering = compare_values(
            a.get(&self.column).unwrap_or(&null),
            b.get(&self.column).unwrap_or(&null),
        );
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}
