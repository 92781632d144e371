//! Entry points tying the components together.
//!
//! Every function here is self-contained: inputs come in as arguments and the
//! result is built fresh, so concurrent calls never interact.

use crate::bucketing;
use crate::config::AnalysisOpts;
use crate::distribution::{build_distribution, Distribution};
use crate::divergence::{self, FieldAnalysis};
use crate::document::Document;
use crate::error::{EngineError, Result};
use crate::fields;
use crate::filter::{self, Filter};
use crate::masking::PatternExtractor;
use crate::pattern_diff::{diff_pattern_maps, PatternMapDifference};
use crate::patterns::{self, Pattern};
use crate::records::TextRecord;
use crate::schema::FieldTypeHints;
use crate::sequence::{self, SequenceClassification};
use crate::source::RecordSource;
use crate::temporal::TimeWindow;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DistributionReport {
    SingleAnalysis(Vec<FieldAnalysis>),
    ComparisonAnalysis(Vec<FieldAnalysis>),
}

impl DistributionReport {
    pub fn analyses(&self) -> &[FieldAnalysis] {
        match self {
            DistributionReport::SingleAnalysis(a) | DistributionReport::ComparisonAnalysis(a) => a,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldAnalysis> {
        self.analyses().iter().find(|a| a.field == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternReport {
    PatternMapDifference(PatternMapDifference),
    LogInsights(Vec<Pattern>),
}

/// Concentration of each useful field of one population.
pub fn single_analysis(
    selection: &[Document],
    hints: Option<&FieldTypeHints>,
    opts: &AnalysisOpts,
) -> Result<Vec<FieldAnalysis>> {
    opts.validate()?;
    let fields = fields::select_fields(selection, hints, opts);
    debug!(documents = selection.len(), fields = fields.len(), "single analysis");
    let mut out: Vec<FieldAnalysis> = fields
        .iter()
        .filter_map(|field| {
            let (_, dist) =
                bucketing::group_numeric_keys(&Distribution::empty(), &build_distribution(selection, field), opts);
            divergence::single_field(field, &dist, opts.top_changes)
        })
        .collect();
    divergence::rank(&mut out);
    Ok(out)
}

/// Divergence of each useful field between two populations.
pub fn comparison_analysis(
    baseline: &[Document],
    selection: &[Document],
    hints: Option<&FieldTypeHints>,
    opts: &AnalysisOpts,
) -> Result<Vec<FieldAnalysis>> {
    opts.validate()?;
    let combined: Vec<Document> = baseline.iter().chain(selection.iter()).cloned().collect();
    let fields = fields::select_fields(&combined, hints, opts);
    debug!(
        baseline = baseline.len(),
        selection = selection.len(),
        fields = fields.len(),
        "comparison analysis"
    );
    let mut out = Vec::with_capacity(fields.len());
    for field in &fields {
        let (base, sel) = bucketing::group_numeric_keys(
            &build_distribution(baseline, field),
            &build_distribution(selection, field),
            opts,
        );
        if let Some(analysis) = divergence::compare_field(field, &base, &sel, opts.top_changes)? {
            out.push(analysis);
        }
    }
    divergence::rank(&mut out);
    Ok(out)
}

/// Comparison when a non-empty baseline is given, single-population otherwise.
pub fn analyze_distributions(
    selection: &[Document],
    baseline: Option<&[Document]>,
    hints: Option<&FieldTypeHints>,
    opts: &AnalysisOpts,
) -> Result<DistributionReport> {
    match baseline {
        Some(base) if !base.is_empty() => {
            comparison_analysis(base, selection, hints, opts).map(DistributionReport::ComparisonAnalysis)
        }
        _ => single_analysis(selection, hints, opts).map(DistributionReport::SingleAnalysis),
    }
}

/// Carves the selection out of one batch with `filters`; the rest is the baseline.
pub fn analyze_with_filters(
    docs: &[Document],
    filters: &[Filter],
    hints: Option<&FieldTypeHints>,
    opts: &AnalysisOpts,
) -> Result<DistributionReport> {
    let (selection, baseline) = filter::partition(docs, filters);
    debug!(matched = selection.len(), rest = baseline.len(), "filters applied");
    analyze_distributions(&selection, Some(&baseline), hints, opts)
}

pub fn pattern_difference(
    base: &[TextRecord],
    selection: &[TextRecord],
    extractor: &PatternExtractor,
) -> PatternMapDifference {
    let base_map = patterns::count_patterns(base, extractor);
    let selection_map = patterns::count_patterns(selection, extractor);
    debug!(base = base_map.len(), selection = selection_map.len(), "pattern maps built");
    diff_pattern_maps(&base_map, &selection_map)
}

pub fn log_insights(records: &[TextRecord], extractor: &PatternExtractor, opts: &AnalysisOpts) -> Vec<Pattern> {
    patterns::log_insights(records, extractor, opts.sample_cap)
}

/// Diff when base records are present, single-window insights otherwise.
pub fn analyze_patterns(
    selection: &[TextRecord],
    base: Option<&[TextRecord]>,
    extractor: &PatternExtractor,
    opts: &AnalysisOpts,
) -> PatternReport {
    match base {
        Some(base) => PatternReport::PatternMapDifference(pattern_difference(base, selection, extractor)),
        None => PatternReport::LogInsights(log_insights(selection, extractor, opts)),
    }
}

/// Fetches both windows from `source` and diffs their pattern maps. A failed
/// fetch is returned as [`EngineError::Upstream`].
pub fn analyze_pattern_windows<S: RecordSource + ?Sized>(
    source: &S,
    base: &TimeWindow,
    selection: &TimeWindow,
    extractor: &PatternExtractor,
) -> Result<PatternMapDifference> {
    let (base_records, selection_records) = fetch_windows(source, base, selection)?;
    Ok(pattern_difference(&base_records, &selection_records, extractor))
}

pub fn classify_trace_sequences<S: RecordSource + ?Sized>(
    source: &S,
    base: &TimeWindow,
    selection: &TimeWindow,
    extractor: &PatternExtractor,
) -> Result<SequenceClassification> {
    let (base_records, selection_records) = fetch_windows(source, base, selection)?;
    Ok(sequence::classify_sequences(&base_records, &selection_records, extractor))
}

fn fetch_windows<S: RecordSource + ?Sized>(
    source: &S,
    base: &TimeWindow,
    selection: &TimeWindow,
) -> Result<(Vec<TextRecord>, Vec<TextRecord>)> {
    let base_records = source.fetch(base).map_err(EngineError::Upstream)?;
    let selection_records = source.fetch(selection).map_err(EngineError::Upstream)?;
    debug!(base = base_records.len(), selection = selection_records.len(), "windows fetched");
    Ok((base_records, selection_records))
}
