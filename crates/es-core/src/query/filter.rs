use crate::{compare_values, value_text};

use std::cmp::Ordering;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Gte(Value),
}

/// One column predicate of a collection query.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq(value.into()),
        }
    }

    pub fn in_list<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::In(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn not_in<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::NotIn(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Gte(value.into()),
        }
    }

    /// `(column, "op.value")` as sent on the REST query string.
    pub fn to_query_pair(&self) -> (String, String) {
        let rhs = match &self.op {
            FilterOp::Eq(v) => format!("eq.{}", value_text(v)),
            FilterOp::In(vs) => format!("in.({})", join(vs)),
            FilterOp::NotIn(vs) => format!("not.in.({})", join(vs)),
            FilterOp::Gte(v) => format!("gte.{}", value_text(v)),
        };
        (self.column.clone(), rhs)
    }

    /// Server-side change feed filter. The feed only understands equality.
    pub fn to_feed_filter(&self) -> Option<String> {
        match &self.op {
            FilterOp::Eq(v) => Some(format!("{}=eq.{}", self.column, value_text(v))),
            _ => None,
        }
    }

    /// Evaluate the predicate against a JSON row. A missing column is null.
    pub fn matches(&self, row: &Value) -> bool {
        let actual = row.get(&self.column).unwrap_or(&Value::Null);
        match &self.op {
            FilterOp::Eq(v) => compare_values(actual, v) == Ordering::Equal,
            FilterOp::In(vs) => vs
                .iter()
                .any(|v| compare_values(actual, v) == Ordering::Equal),
            FilterOp::NotIn(vs) => vs
                .iter()
                .all(|v| compare_values(actual, v) != Ordering::Equal),
            FilterOp::Gte(v) => !actual.is_null() && compare_values(actual, v) != Ordering::Less,
        }
    }

    /// The value this filter pins `column` to, if it is an equality on it.
    pub fn pinned_value(&self, column: &str) -> Option<&Value> {
        match &self.op {
            FilterOp::Eq(v) if self.column == column => Some(v),
            _ => None,
        }
    }
}

fn join(values: &[Value]) -> String {
    values.iter().map(value_text).collect::<Vec<_>>().join(",")
}
