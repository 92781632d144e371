use crate::masking::PatternExtractor;
use crate::records::TextRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// Signature -> occurrences within one time window.
pub type PatternFrequencyMap = BTreeMap<String, usize>;

/// One pattern of a single-window summary (`logInsights` entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub pattern: String,
    pub count: usize,
    pub sample_logs: Vec<String>,
}

pub fn count_patterns(records: &[TextRecord], extractor: &PatternExtractor) -> PatternFrequencyMap {
    let mut map = PatternFrequencyMap::new();
    for rec in records {
        *map.entry(rec.signature(extractor)).or_insert(0) += 1;
    }
    map
}

/// Patterns ordered by count (desc) then signature, each with at most
/// `sample_cap` sample lines in input order.
pub fn log_insights(records: &[TextRecord], extractor: &PatternExtractor, sample_cap: usize) -> Vec<Pattern> {
    let mut grouped: BTreeMap<String, Pattern> = BTreeMap::new();
    for rec in records {
        let signature = rec.signature(extractor);
        let entry = grouped.entry(signature.clone()).or_insert_with(|| Pattern {
            pattern: signature,
            count: 0,
            sample_logs: Vec::new(),
        });
        entry.count += 1;
        if entry.sample_logs.len() < sample_cap {
            entry.sample_logs.push(rec.text.clone());
        }
    }
    let mut out: Vec<Pattern> = grouped.into_values().collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.pattern.cmp(&b.pattern)));
    out
}
