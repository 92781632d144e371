use crate::masking::PatternExtractor;
use crate::records::TextRecord;
use itertools::Itertools;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::debug;

/// Time-ordered signatures observed for one trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub trace_id: String,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterLabel {
    Base,
    Exceptional,
}

/// Traces sharing exactly the same sequence of signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceCluster {
    pub label: ClusterLabel,
    pub shape: Vec<String>,
    pub sequences: Vec<Sequence>,
}

impl SequenceCluster {
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

/// Clusters ordered BASE first, then EXCEPTIONAL by size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceClassification {
    clusters: Vec<SequenceCluster>,
}

impl SequenceClassification {
    pub fn clusters(&self) -> &[SequenceCluster] {
        &self.clusters
    }

    pub fn base(&self) -> Option<&SequenceCluster> {
        self.clusters.first().filter(|c| c.label == ClusterLabel::Base)
    }

    pub fn exceptional(&self) -> impl Iterator<Item = &SequenceCluster> {
        self.clusters.iter().filter(|c| c.label == ClusterLabel::Exceptional)
    }

    /// Label of the highest-ranked cluster holding one of the trace's sequences.
    pub fn label_of(&self, trace_id: &str) -> Option<ClusterLabel> {
        self.clusters
            .iter()
            .find(|c| c.sequences.iter().any(|s| s.trace_id == trace_id))
            .map(|c| c.label)
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Serialized as `{"BASE": [...], "EXCEPTIONAL": [...]}`.
impl Serialize for SequenceClassification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let base: Vec<&Sequence> = self.base().map(|c| c.sequences.iter().collect()).unwrap_or_default();
        let exceptional: Vec<&Sequence> = self.exceptional().flat_map(|c| c.sequences.iter()).collect();
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("BASE", &base)?;
        map.serialize_entry("EXCEPTIONAL", &exceptional)?;
        map.end()
    }
}

/// Builds per-trace sequences within each window, then groups both windows'
/// sequences together and labels the most common shape BASE. A trace active in
/// both windows contributes one sequence per window. Records without a trace
/// id are ignored.
pub fn classify_sequences(
    base: &[TextRecord],
    selection: &[TextRecord],
    extractor: &PatternExtractor,
) -> SequenceClassification {
    let mut sequences = build_sequences(base, extractor);
    sequences.extend(build_sequences(selection, extractor));
    classify(sequences)
}

pub fn build_sequences<'a, I>(records: I, extractor: &PatternExtractor) -> Vec<Sequence>
where
    I: IntoIterator<Item = &'a TextRecord>,
{
    let mut untraced = 0usize;
    let by_trace = records
        .into_iter()
        .enumerate()
        .filter_map(|(idx, rec)| match &rec.trace_id {
            Some(trace) => Some((trace.clone(), (rec.timestamp, idx, rec.signature(extractor)))),
            None => {
                untraced += 1;
                None
            }
        })
        .into_group_map();
    if untraced > 0 {
        debug!(untraced, "records without trace id ignored");
    }

    by_trace
        .into_iter()
        .map(|(trace_id, mut events)| {
            events.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
            Sequence {
                trace_id,
                patterns: events.into_iter().map(|(_, _, sig)| sig).collect(),
            }
        })
        .sorted_by(|a, b| a.trace_id.cmp(&b.trace_id))
        .collect()
}

pub fn classify(sequences: Vec<Sequence>) -> SequenceClassification {
    let mut groups: BTreeMap<Vec<String>, Vec<Sequence>> = BTreeMap::new();
    for seq in sequences {
        groups.entry(seq.patterns.clone()).or_default().push(seq);
    }

    let ordered = groups
        .into_iter()
        .map(|(shape, mut members)| {
            members.sort_by(|a, b| a.trace_id.cmp(&b.trace_id));
            (shape.concat(), shape, members)
        })
        .sorted_by(|a, b| {
            b.2.len()
                .cmp(&a.2.len())
                .then_with(|| a.0.cmp(&b.0))
                .then_with(|| a.1.cmp(&b.1))
        });

    let clusters = ordered
        .enumerate()
        .map(|(i, (_, shape, sequences))| SequenceCluster {
            label: if i == 0 { ClusterLabel::Base } else { ClusterLabel::Exceptional },
            shape,
            sequences,
        })
        .collect();
    SequenceClassification { clusters }
}
