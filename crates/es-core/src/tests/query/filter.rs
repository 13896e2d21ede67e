use crate::Filter;

use googletest::prelude::*;
use serde_json::json;

#[test]
fn given_eq_filter_when_rendered_then_rest_operator() {
    let filter = Filter::eq("user_id", "abc");

    assert_that!(
        filter.to_query_pair(),
        eq(&("user_id".to_string(), "eq.abc".to_string()))
    );
    assert_that!(filter.to_feed_filter(), some(eq("user_id=eq.abc")));
}

#[test]
fn given_list_filters_when_rendered_then_parenthesised() {
    let not_in = Filter::not_in("status", ["completed", "failed", "cancelled"]);
    let in_list = Filter::in_list("status", ["pending", "running"]);

    assert_that!(not_in.to_query_pair().1, eq("not.in.(completed,failed,cancelled)"));
    assert_that!(in_list.to_query_pair().1, eq("in.(pending,running)"));
    assert_that!(not_in.to_feed_filter(), none());
}

#[test]
fn given_rows_when_filters_evaluated_then_match_column_values() {
    // Given
    let row = json!({"status": "running", "created_at": "2025-03-01T10:00:00+00:00", "n": 3});

    // Then
    assert!(Filter::eq("status", "running").matches(&row));
    assert!(!Filter::eq("status", "pending").matches(&row));
    assert!(Filter::in_list("status", ["pending", "running"]).matches(&row));
    assert!(!Filter::not_in("status", ["running"]).matches(&row));
    assert!(Filter::gte("created_at", "2025-03-01T09:00:00Z").matches(&row));
    assert!(!Filter::gte("created_at", "2025-03-02T00:00:00Z").matches(&row));
    assert!(Filter::gte("n", 3).matches(&row));
    assert!(!Filter::gte("missing", 0).matches(&row));
}

#[test]
fn given_eq_filter_when_pinned_value_requested_then_only_for_its_column() {
    let filter = Filter::eq("user_id", "abc");

    assert_that!(filter.pinned_value("user_id"), some(eq(&json!("abc"))));
    assert_that!(filter.pinned_value("id"), none());
}
