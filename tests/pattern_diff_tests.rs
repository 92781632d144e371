use chrono::{TimeZone, Utc};
use driftscope::masking::PatternExtractor;
use driftscope::pattern_diff::{diff_pattern_maps, ChangeKind};
use driftscope::patterns::{count_patterns, log_insights, PatternFrequencyMap};
use driftscope::records::TextRecord;

fn map(pairs: &[(&str, usize)]) -> PatternFrequencyMap {
    pairs.iter().map(|(p, c)| (p.to_string(), *c)).collect()
}

fn rec(secs: i64, text: &str) -> TextRecord {
    TextRecord::new(Utc.timestamp_opt(1_704_067_200 + secs, 0).unwrap(), text)
}

#[test]
fn emerging_error_pattern_ranks_first() {
    let base = map(&[("User <*> logged in", 50), ("conn <*>", 5)]);
    let selection = map(&[("User <*> logged in", 40), ("conn <*>", 10), ("Error in authentication <*>", 80)]);
    let diff = diff_pattern_maps(&base, &selection);

    let order: Vec<(&str, i64)> = diff.entries().iter().map(|e| (e.pattern.as_str(), e.delta)).collect();
    assert_eq!(
        order,
        vec![("Error in authentication <*>", 80), ("User <*> logged in", -10), ("conn <*>", 5)]
    );

    let err = diff.get("Error in authentication <*>").unwrap();
    assert_eq!(err.kind, ChangeKind::Emerging);
    assert_eq!(err.base_count, 0);
    assert_eq!(err.base_ratio, 0.0);
    assert!((err.selection_ratio - 80.0 / 130.0).abs() < 1e-12);

    assert_eq!(diff.get("User <*> logged in").unwrap().kind, ChangeKind::Decreased);
    assert_eq!(diff.get("conn <*>").unwrap().kind, ChangeKind::Increased);
    assert_eq!(diff.emerging().count(), 1);
    assert_eq!(diff.disappeared().count(), 0);
}

#[test]
fn disappeared_and_unchanged_patterns() {
    let base = map(&[("a", 3), ("b", 2)]);
    let selection = map(&[("b", 2)]);
    let diff = diff_pattern_maps(&base, &selection);
    assert_eq!(diff.len(), 2);
    let a = diff.get("a").unwrap();
    assert_eq!(a.kind, ChangeKind::Disappeared);
    assert_eq!(a.delta, -3);
    assert_eq!(a.selection_ratio, 0.0);
    assert_eq!(diff.get("b").unwrap().kind, ChangeKind::Unchanged);
    assert_eq!(diff.entries()[1].pattern, "b");
}

#[test]
fn empty_maps_give_empty_diff() {
    let diff = diff_pattern_maps(&PatternFrequencyMap::new(), &PatternFrequencyMap::new());
    assert!(diff.is_empty());
    assert_eq!(serde_json::to_value(&diff).unwrap(), serde_json::json!([]));
}

#[test]
fn equal_deltas_order_by_pattern() {
    let diff = diff_pattern_maps(&map(&[("zeta", 1)]), &map(&[("alpha", 1)]));
    let order: Vec<&str> = diff.entries().iter().map(|e| e.pattern.as_str()).collect();
    assert_eq!(order, vec!["alpha", "zeta"]);
}

#[test]
fn delta_serializes_camel_case() {
    let diff = diff_pattern_maps(&map(&[("a", 1)]), &map(&[("a", 4)]));
    let v = serde_json::to_value(&diff).unwrap();
    assert_eq!(v[0]["baseCount"], 1);
    assert_eq!(v[0]["selectionCount"], 4);
    assert_eq!(v[0]["delta"], 3);
    assert_eq!(v[0]["kind"], "increased");
}

#[test]
fn records_collapse_onto_shared_signatures() {
    let records = vec![
        rec(0, "user 42 logged in"),
        rec(1, "user 7 logged in"),
        rec(2, "disk full: /var"),
        rec(3, "whatever").with_pattern("custom"),
    ];
    let counts = count_patterns(&records, &PatternExtractor::digits());
    assert_eq!(counts.get("user  logged in"), Some(&2));
    assert_eq!(counts.get("disk full: /var"), Some(&1));
    assert_eq!(counts.get("custom"), Some(&1));
}

#[test]
fn insights_cap_samples_and_order_by_count() {
    let records: Vec<TextRecord> = (0..5)
        .map(|i| rec(i, &format!("job {i} done")))
        .chain(std::iter::once(rec(9, "boot")))
        .collect();
    let insights = log_insights(&records, &PatternExtractor::digits(), 3);
    assert_eq!(insights.len(), 2);
    assert_eq!(insights[0].pattern, "job  done");
    assert_eq!(insights[0].count, 5);
    assert_eq!(insights[0].sample_logs, vec!["job 0 done", "job 1 done", "job 2 done"]);
    assert_eq!(insights[1].pattern, "boot");
    assert_eq!(insights[1].sample_logs, vec!["boot"]);

    let v = serde_json::to_value(&insights).unwrap();
    assert!(v[0].get("sampleLogs").is_some());
}

#[test]
fn insights_with_zero_sample_cap_keep_counts() {
    let insights = log_insights(&[rec(0, "a 1"), rec(1, "a 2")], &PatternExtractor::digits(), 0);
    assert_eq!(insights[0].count, 2);
    assert!(insights[0].sample_logs.is_empty());
}
