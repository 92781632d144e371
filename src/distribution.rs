use crate::document::Document;
use ahash::AHashMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// Relative frequency of each stringified value of one field.
///
/// Probabilities are non-negative and sum to 1, or the distribution is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Distribution {
    shares: BTreeMap<String, f64>,
}

impl Distribution {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalizes raw counts. Zero-count keys are kept with share 0.
    pub fn from_counts<I, K>(counts: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let raw: Vec<(String, f64)> = counts
            .into_iter()
            .map(|(k, c)| (k.into(), c.max(0.0)))
            .collect();
        let total: f64 = raw.iter().map(|(_, c)| *c).sum();
        if total <= 0.0 {
            return Self::empty();
        }
        let shares = raw.into_iter().map(|(k, c)| (k, c / total)).fold(
            BTreeMap::new(),
            |mut acc: BTreeMap<String, f64>, (k, share)| {
                *acc.entry(k).or_insert(0.0) += share;
                acc
            },
        );
        Self { shares }
    }

    pub fn share(&self, key: &str) -> f64 {
        self.shares.get(key).copied().unwrap_or(0.0)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.shares.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, f64)> {
        self.shares.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.shares.values().sum()
    }
}

/// One pass over `docs`; null and missing values are left out of the denominator.
pub fn build_distribution(docs: &[Document], field: &str) -> Distribution {
    let mut counts: AHashMap<String, usize> = AHashMap::new();
    for key in docs.iter().filter_map(|d| d.get(field)).filter_map(|v| v.as_key()) {
        *counts.entry(key).or_insert(0) += 1;
    }
    Distribution::from_counts(counts.into_iter().map(|(k, c)| (k, c as f64)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_counts_merges_duplicate_keys() {
        let d = Distribution::from_counts(vec![("a", 1.0), ("a", 1.0), ("b", 2.0)]);
        assert_eq!(d.len(), 2);
        assert!((d.share("a") - 0.5).abs() < 1e-12);
        assert!((d.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_zero_counts_are_empty() {
        let d = Distribution::from_counts(vec![("a", 0.0)]);
        assert!(d.is_empty());
    }
}
