use crate::config::AnalysisOpts;
use crate::distribution::Distribution;
use tracing::debug;

/// Rebuckets a baseline/selection pair of purely numeric distributions.
///
/// Both sides are returned unchanged when either holds a non-numeric key, when
/// the union has at most `opts.bucket_threshold` distinct numeric values, or
/// when the range is too narrow to split.
/// Otherwise the combined `[min, max]` range is cut into `opts.bucket_count`
/// equal-width buckets labelled `"low-high"`, shared by both sides. An empty
/// side stays empty.
pub fn group_numeric_keys(
    baseline: &Distribution,
    selection: &Distribution,
    opts: &AnalysisOpts,
) -> (Distribution, Distribution) {
    let unchanged = || (baseline.clone(), selection.clone());

    let Some(base_vals) = numeric_keys(baseline) else { return unchanged() };
    let Some(sel_vals) = numeric_keys(selection) else { return unchanged() };

    // Cardinality counts numeric values, so "1" and "1.0" are one.
    let mut union: Vec<f64> = base_vals.iter().chain(sel_vals.iter()).map(|(v, _)| *v).collect();
    union.sort_by(f64::total_cmp);
    union.dedup();
    if union.len() <= opts.bucket_threshold || opts.bucket_count == 0 {
        return unchanged();
    }

    let (min, max) = (union[0], union[union.len() - 1]);
    if max <= min {
        return unchanged();
    }
    let buckets = NumericBuckets::new(min, max, opts.bucket_count);
    if !buckets.has_distinct_labels() {
        debug!(min, max, "numeric range too narrow to label; leaving field unbucketed");
        return unchanged();
    }
    debug!(distinct = union.len(), min, max, buckets = opts.bucket_count, "bucketing numeric field");

    (buckets.apply(&base_vals), buckets.apply(&sel_vals))
}

/// `None` if any key does not parse as a finite number.
fn numeric_keys(d: &Distribution) -> Option<Vec<(f64, f64)>> {
    d.iter()
        .map(|(k, share)| match k.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Some((v, share)),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct NumericBuckets {
    min: f64,
    width: f64,
    labels: Vec<String>,
}

impl NumericBuckets {
    pub fn new(min: f64, max: f64, count: usize) -> Self {
        let count = count.max(1);
        let width = (max - min) / count as f64;
        let decimals = label_decimals(width);
        let labels = (0..count)
            .map(|i| {
                let low = min + width * i as f64;
                let high = if i + 1 == count { max } else { min + width * (i + 1) as f64 };
                format!("{}-{}", format_bound(low, decimals), format_bound(high, decimals))
            })
            .collect();
        Self { min, width, labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn has_distinct_labels(&self) -> bool {
        let mut labels: Vec<&String> = self.labels.iter().collect();
        labels.sort();
        labels.dedup();
        labels.len() == self.labels.len()
    }

    pub fn index_of(&self, value: f64) -> usize {
        let last = self.labels.len() - 1;
        if self.width <= 0.0 {
            return 0;
        }
        let idx = ((value - self.min) / self.width).floor();
        if idx < 0.0 {
            0
        } else {
            (idx as usize).min(last)
        }
    }

    fn apply(&self, values: &[(f64, f64)]) -> Distribution {
        if values.is_empty() {
            return Distribution::empty();
        }
        let mut mass = vec![0.0; self.labels.len()];
        for (v, share) in values {
            mass[self.index_of(*v)] += share;
        }
        Distribution::from_counts(self.labels.iter().cloned().zip(mass))
    }
}

fn label_decimals(width: f64) -> usize {
    if width <= 0.0 || width >= 1.0 {
        return 2;
    }
    ((-width.log10()).ceil() as usize + 1).max(2)
}

fn format_bound(x: f64, decimals: usize) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        return format!("{}", x as i64);
    }
    let s = format!("{x:.decimals$}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_range_and_trim_zeros() {
        let b = NumericBuckets::new(1.0, 15.0, 5);
        assert_eq!(b.labels(), &["1-3.8", "3.8-6.6", "6.6-9.4", "9.4-12.2", "12.2-15"]);
        assert_eq!(b.index_of(1.0), 0);
        assert_eq!(b.index_of(15.0), 4);
        assert_eq!(b.index_of(7.0), 2);
    }

    #[test]
    fn narrow_ranges_keep_distinct_labels() {
        let b = NumericBuckets::new(0.001, 0.002, 5);
        let mut labels = b.labels().to_vec();
        labels.dedup();
        assert_eq!(labels.len(), 5);
    }
}
