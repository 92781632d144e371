use driftscope::document::Document;
use driftscope::error::EngineError;
use driftscope::filter::{matches_all, parse_filter, parse_filters, partition, Filter};
use serde_json::json;

fn doc() -> Document {
    Document::new()
        .with("status", "error")
        .with("code", 503i64)
        .with("latency", 12.5)
        .with("host", "web-12")
        .with("path", "/api/v1/login")
        .with("message", "Connection Timeout while calling auth")
        .with("at", "2024-03-01T10:00:00Z")
        .with("gone", driftscope::FieldValue::Null)
}

fn check(clause: serde_json::Value) -> bool {
    parse_filter(&clause).unwrap().matches(&doc())
}

#[test]
fn term_compares_stringified_values() {
    assert!(check(json!({"term": {"status": "error"}})));
    assert!(check(json!({"term": {"code": 503}})));
    assert!(check(json!({"term": {"code": {"value": 503}}})));
    assert!(!check(json!({"term": {"status": "ok"}})));
}

#[test]
fn range_compares_numbers_and_timestamps() {
    assert!(check(json!({"range": {"code": {"gte": 500, "lt": 600}}})));
    assert!(!check(json!({"range": {"code": {"gt": 503}}})));
    assert!(check(json!({"range": {"latency": {"lte": 12.5}}})));
    assert!(check(json!({"range": {"at": {"gte": "2024-03-01T09:00:00Z", "lt": "2024-03-01T11:00:00+00:00"}}})));
    assert!(!check(json!({"range": {"at": {"lt": "2024-02-01"}}})));
}

#[test]
fn match_is_case_insensitive_any_token() {
    assert!(check(json!({"match": {"message": "timeout"}})));
    assert!(check(json!({"match": {"message": {"query": "refused TIMEOUT"}}})));
    assert!(!check(json!({"match": {"message": "time"}})));
}

#[test]
fn wildcard_regexp_and_prefix() {
    assert!(check(json!({"wildcard": {"host": "web-*"}})));
    assert!(check(json!({"wildcard": {"host": "web-1?"}})));
    assert!(!check(json!({"wildcard": {"host": "db-*"}})));
    assert!(check(json!({"regexp": {"host": "web-[0-9]+"}})));
    assert!(!check(json!({"regexp": {"host": "web"}})));
    assert!(check(json!({"prefix": {"path": "/api"}})));
    assert!(!check(json!({"prefix": {"path": "/v1"}})));
}

#[test]
fn exists_ignores_nulls() {
    assert!(check(json!({"exists": {"field": "status"}})));
    assert!(!check(json!({"exists": {"field": "gone"}})));
    assert!(!check(json!({"exists": {"field": "nope"}})));
}

#[test]
fn unknown_operator_is_reported() {
    let err = parse_filter(&json!({"fuzzy": {"status": "eror"}})).unwrap_err();
    assert!(matches!(err, EngineError::UnknownFilterOperator { ref operator } if operator == "fuzzy"));
}

#[test]
fn malformed_clauses_are_rejected() {
    for clause in [
        json!("status:error"),
        json!({"term": {"status": "error"}, "prefix": {"path": "/"}}),
        json!({"term": {"a": 1, "b": 2}}),
        json!({"range": {"code": {}}}),
        json!({"exists": {}}),
        json!({"regexp": {"host": "("}}),
        json!({"prefix": {"path": 5}}),
    ] {
        let err = parse_filter(&clause).unwrap_err();
        assert!(matches!(err, EngineError::MalformedFilter { .. }), "{clause}: {err}");
    }
}

#[test]
fn parse_filters_accepts_array_single_and_null() {
    assert_eq!(parse_filters(&json!(null)).unwrap().len(), 0);
    assert_eq!(parse_filters(&json!({"term": {"status": "error"}})).unwrap().len(), 1);
    let filters = parse_filters(&json!([
        {"term": {"status": "error"}},
        {"exists": {"field": "host"}}
    ]))
    .unwrap();
    assert_eq!(filters.iter().map(Filter::operator).collect::<Vec<_>>(), vec!["term", "exists"]);
    assert_eq!(filters[1].field(), "host");
    assert!(matches_all(&filters, &doc()));
}

#[test]
fn partition_splits_matching_from_rest() {
    let docs: Vec<Document> = (0..10)
        .map(|i| Document::new().with("status", if i < 3 { "error" } else { "ok" }))
        .collect();
    let filters = parse_filters(&json!([{"term": {"status": "error"}}])).unwrap();
    let (matched, rest) = partition(&docs, &filters);
    assert_eq!(matched.len(), 3);
    assert_eq!(rest.len(), 7);
}
