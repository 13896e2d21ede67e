use crate::{Filter, Order, Query};

use std::cmp::Ordering;

use serde_json::json;

#[test]
fn test_query_pairs_include_select_filters_order_and_limit() {
    let query = Query::new()
        .filter(Filter::eq("user_id", "u1"))
        .order_by(Order::desc("created_at"))
        .limit(20);

    let pairs = query.to_query_pairs();

    assert_eq!(
        pairs,
        vec![
            ("select".to_string(), "*".to_string()),
            ("user_id".to_string(), "eq.u1".to_string()),
            ("order".to_string(), "created_at.desc".to_string()),
            ("limit".to_string(), "20".to_string()),
        ]
    );
}

#[test]
fn test_cache_key_distinguishes_queries() {
    let a = Query::new().filter(Filter::eq("status", "pending"));
    let b = Query::new().filter(Filter::eq("status", "running"));

    assert_eq!(a.cache_key(), a.clone().cache_key());
    assert_ne!(a.cache_key(), b.cache_key());
}

#[test]
fn test_order_compares_rows_by_column() {
    let older = json!({"created_at": "2025-01-01T00:00:00Z"});
    let newer = json!({"created_at": "2025-02-01T00:00:00Z"});

    assert_eq!(Order::asc("created_at").compare(&older, &newer), Ordering::Less);
    assert_eq!(Order::desc("created_at").compare(&older, &newer), Ordering::Greater);
}

#[test]
fn test_filters_on_column() {
    let query = Query::new()
        .filter(Filter::eq("user_id", "u1"))
        .filter(Filter::eq("status", "pending"));

    assert_eq!(query.filters_on("user_id").count(), 1);
    assert!(query.matches(&json!({"user_id": "u1", "status": "pending"})));
    assert!(!query.matches(&json!({"user_id": "u2", "status": "pending"})));
}
