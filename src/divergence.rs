//! Baseline vs. selection scoring for one field.
//!
//! Comparison mode scores the base-2 Jensen-Shannon divergence of the two
//! distributions: symmetric, bounded to `[0, 1]`, exactly zero when both
//! sides agree on every key. Single-population mode has no baseline and
//! scores concentration instead (the Herfindahl index `sum(p^2)`), which is 1
//! for a constant field and approaches 0 for a flat one.

use crate::distribution::Distribution;
use crate::error::{EngineError, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::f64::consts::LN_2;

/// Shares are normalized by division, so sums drift only by rounding.
const SIMPLEX_TOL: f64 = 1e-9;
const SMOOTHING: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueChange {
    pub value: String,
    pub baseline_share: f64,
    pub selection_share: f64,
}

impl ValueChange {
    pub fn delta(&self) -> f64 {
        self.selection_share - self.baseline_share
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAnalysis {
    pub field: String,
    pub divergence: f64,
    pub top_changes: Vec<ValueChange>,
}

/// Jensen-Shannon divergence in bits over the union of keys.
///
/// When exactly one side is empty all of its mass has moved, which scores 1.
pub fn jensen_shannon(p: &Distribution, q: &Distribution) -> Result<f64> {
    match (p.is_empty(), q.is_empty()) {
        (true, true) => return Ok(0.0),
        (true, false) | (false, true) => return Ok(1.0),
        _ => {}
    }
    let mut keys: Vec<&String> = p.keys().chain(q.keys()).collect();
    keys.sort();
    keys.dedup();
    let a = smoothed(keys.iter().map(|k| p.share(k)));
    let b = smoothed(keys.iter().map(|k| q.share(k)));
    let nats = logp::jensen_shannon_divergence(&a, &b, SIMPLEX_TOL)
        .map_err(|e| EngineError::Divergence(format!("{e:?}")))?;
    Ok((nats / LN_2).clamp(0.0, 1.0))
}

/// Keeps every entry strictly positive for the log terms, then renormalizes.
fn smoothed(shares: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = shares.map(|x| x + SMOOTHING).collect();
    let total: f64 = v.iter().sum();
    for x in &mut v {
        *x /= total;
    }
    v
}

/// Herfindahl index of the distribution; 0 when empty.
pub fn concentration(p: &Distribution) -> f64 {
    p.iter().map(|(_, s)| s * s).sum()
}

/// Keys ordered by how much their share moved, largest first; ties by key.
pub fn top_changes(baseline: &Distribution, selection: &Distribution, limit: usize) -> Vec<ValueChange> {
    let mut keys: Vec<&String> = baseline.keys().chain(selection.keys()).collect();
    keys.sort();
    keys.dedup();
    let mut changes: Vec<ValueChange> = keys
        .into_iter()
        .map(|k| ValueChange {
            value: k.clone(),
            baseline_share: baseline.share(k),
            selection_share: selection.share(k),
        })
        .filter(|c| c.baseline_share > 0.0 || c.selection_share > 0.0)
        .collect();
    changes.sort_by(|a, b| {
        b.delta()
            .abs()
            .total_cmp(&a.delta().abs())
            .then_with(|| a.value.cmp(&b.value))
    });
    changes.truncate(limit);
    changes
}

/// `None` when neither side has any value for the field.
pub fn compare_field(
    field: &str,
    baseline: &Distribution,
    selection: &Distribution,
    limit: usize,
) -> Result<Option<FieldAnalysis>> {
    if baseline.is_empty() && selection.is_empty() {
        return Ok(None);
    }
    Ok(Some(FieldAnalysis {
        field: field.to_string(),
        divergence: jensen_shannon(baseline, selection)?,
        top_changes: top_changes(baseline, selection, limit),
    }))
}

pub fn single_field(field: &str, selection: &Distribution, limit: usize) -> Option<FieldAnalysis> {
    if selection.is_empty() {
        return None;
    }
    Some(FieldAnalysis {
        field: field.to_string(),
        divergence: concentration(selection),
        top_changes: top_changes(&Distribution::empty(), selection, limit),
    })
}

/// Highest divergence first, ties broken by field name.
pub fn rank(analyses: &mut [FieldAnalysis]) {
    analyses.sort_by(|a, b| match b.divergence.total_cmp(&a.divergence) {
        Ordering::Equal => a.field.cmp(&b.field),
        other => other,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(pairs: &[(&str, f64)]) -> Distribution {
        Distribution::from_counts(pairs.iter().map(|(k, c)| (*k, *c)))
    }

    #[test]
    fn disjoint_distributions_reach_one() {
        let p = dist(&[("a", 1.0)]);
        let q = dist(&[("b", 1.0)]);
        assert!((jensen_shannon(&p, &q).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn symmetric() {
        let p = dist(&[("a", 3.0), ("b", 1.0)]);
        let q = dist(&[("a", 1.0), ("b", 1.0), ("c", 2.0)]);
        assert!((jensen_shannon(&p, &q).unwrap() - jensen_shannon(&q, &p).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn one_empty_side_scores_one() {
        assert_eq!(jensen_shannon(&Distribution::empty(), &dist(&[("a", 1.0)])).unwrap(), 1.0);
        assert_eq!(jensen_shannon(&Distribution::empty(), &Distribution::empty()).unwrap(), 0.0);
    }

    #[test]
    fn concentration_of_constant_field_is_one() {
        assert!((concentration(&dist(&[("x", 4.0)])) - 1.0).abs() < 1e-12);
        assert!((concentration(&dist(&[("x", 1.0), ("y", 1.0)])) - 0.5).abs() < 1e-12);
    }
}
