use driftscope::distribution::{build_distribution, Distribution};
use driftscope::document::{Document, FieldValue};

#[test]
fn shares_exclude_nulls_and_missing_values() {
    let docs = vec![
        Document::new().with("level", "info"),
        Document::new().with("level", "info"),
        Document::new().with("level", "error"),
        Document::new().with("level", FieldValue::Null),
        Document::new().with("other", 1i64),
    ];
    let d = build_distribution(&docs, "level");
    assert_eq!(d.len(), 2);
    assert!((d.share("info") - 2.0 / 3.0).abs() < 1e-12);
    assert!((d.share("error") - 1.0 / 3.0).abs() < 1e-12);
    assert!((d.total() - 1.0).abs() < 1e-12);
}

#[test]
fn values_are_stringified_stably() {
    let docs = vec![
        Document::new().with("v", 200i64),
        Document::new().with("v", 200.0f64),
        Document::new().with("v", true),
        Document::new().with("v", 1.5f64),
    ];
    let d = build_distribution(&docs, "v");
    let keys: Vec<&String> = d.keys().collect();
    assert_eq!(keys, vec!["1.5", "200", "true"]);
    assert!((d.share("200") - 0.5).abs() < 1e-12);
}

#[test]
fn empty_batch_or_unknown_field_is_empty() {
    assert!(build_distribution(&[], "level").is_empty());
    let docs = vec![Document::new().with("level", "info")];
    assert!(build_distribution(&docs, "missing").is_empty());
    assert_eq!(Distribution::empty().total(), 0.0);
}
