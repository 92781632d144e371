use crate::patterns::PatternFrequencyMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    /// Only seen in the selection window.
    Emerging,
    /// Only seen in the base window.
    Disappeared,
    Increased,
    Decreased,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternDelta {
    pub pattern: String,
    pub base_count: usize,
    pub selection_count: usize,
    pub delta: i64,
    /// Share of the base window's total that this pattern accounts for.
    pub base_ratio: f64,
    pub selection_ratio: f64,
    pub kind: ChangeKind,
}

/// Per-signature comparison of two windows, largest absolute delta first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PatternMapDifference {
    entries: Vec<PatternDelta>,
}

impl PatternMapDifference {
    pub fn entries(&self) -> &[PatternDelta] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, pattern: &str) -> Option<&PatternDelta> {
        self.entries.iter().find(|e| e.pattern == pattern)
    }

    pub fn emerging(&self) -> impl Iterator<Item = &PatternDelta> {
        self.entries.iter().filter(|e| e.kind == ChangeKind::Emerging)
    }

    pub fn disappeared(&self) -> impl Iterator<Item = &PatternDelta> {
        self.entries.iter().filter(|e| e.kind == ChangeKind::Disappeared)
    }
}

pub fn diff_pattern_maps(base: &PatternFrequencyMap, selection: &PatternFrequencyMap) -> PatternMapDifference {
    let base_total: usize = base.values().sum();
    let selection_total: usize = selection.values().sum();

    let mut patterns: Vec<&String> = base.keys().chain(selection.keys()).collect();
    patterns.sort();
    patterns.dedup();

    let mut entries: Vec<PatternDelta> = patterns
        .into_iter()
        .map(|pattern| {
            let base_count = base.get(pattern).copied().unwrap_or(0);
            let selection_count = selection.get(pattern).copied().unwrap_or(0);
            let delta = selection_count as i64 - base_count as i64;
            let kind = match (base_count, selection_count) {
                (0, _) => ChangeKind::Emerging,
                (_, 0) => ChangeKind::Disappeared,
                _ if delta > 0 => ChangeKind::Increased,
                _ if delta < 0 => ChangeKind::Decreased,
                _ => ChangeKind::Unchanged,
            };
            PatternDelta {
                pattern: pattern.clone(),
                base_count,
                selection_count,
                delta,
                base_ratio: ratio(base_count, base_total),
                selection_ratio: ratio(selection_count, selection_total),
                kind,
            }
        })
        .collect();
    entries.sort_by(|a, b| {
        b.delta
            .unsigned_abs()
            .cmp(&a.delta.unsigned_abs())
            .then_with(|| a.pattern.cmp(&b.pattern))
    });
    PatternMapDifference { entries }
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
