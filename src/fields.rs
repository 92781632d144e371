use crate::config::AnalysisOpts;
use crate::document::{Document, FieldValue};
use crate::schema::{self, FieldKind, FieldTypeHints};
use ahash::AHashSet;
use tracing::{debug, warn};

/// Internal fields that never carry analyzable values.
pub const RESERVED_FIELDS: &[&str] = &["_id", "_index", "_type", "_score", "_routing", "_source", "@timestamp"];

/// Chooses the fields worth building distributions for.
///
/// `hints` is the declared mapping, when the caller managed to fetch it.
/// Without it the kinds are inferred from the sample. This never fails. When
/// nothing survives, fields rejected only for a declared structural type are
/// retried with their kind inferred from the sample; near-unique fields stay
/// out either way.
pub fn select_fields(docs: &[Document], hints: Option<&FieldTypeHints>, opts: &AnalysisOpts) -> Vec<String> {
    if docs.is_empty() {
        return Vec::new();
    }
    if hints.is_none() {
        warn!("field type metadata unavailable; inferring field kinds from {} documents", docs.len());
    }

    let mut names: Vec<&String> = docs.iter().flat_map(|d| d.field_names()).collect();
    names.sort();
    names.dedup();

    let mut declared_structural = Vec::new();
    let mut selected = Vec::new();
    for name in names {
        if is_reserved(name, opts) {
            continue;
        }
        match schema::resolve_kind(docs, hints, name) {
            Some(FieldKind::Date) => {
                debug!(field = %name, "skipping date field");
                continue;
            }
            Some(FieldKind::Structural) => {
                debug!(field = %name, "skipping structural field");
                if hints.map(|h| h.contains_key(name.as_str())).unwrap_or(false) {
                    declared_structural.push(name.clone());
                }
                continue;
            }
            _ => {}
        }
        if looks_like_identifier(docs, name, opts) {
            debug!(field = %name, "skipping near-unique field");
        } else {
            selected.push(name.clone());
        }
    }

    if selected.is_empty() && !declared_structural.is_empty() {
        let fallback: Vec<String> = declared_structural
            .into_iter()
            .filter(|name| {
                !matches!(
                    schema::infer_kind(docs, name),
                    None | Some(FieldKind::Date) | Some(FieldKind::Structural)
                ) && !looks_like_identifier(docs, name, opts)
            })
            .collect();
        debug!(fields = fallback.len(), "no field passed selection; retrying declared-structural fields");
        return fallback;
    }
    selected
}

fn is_reserved(name: &str, opts: &AnalysisOpts) -> bool {
    RESERVED_FIELDS.contains(&name) || opts.exclude_fields.iter().any(|f| f == name)
}

/// Distinct values nearly one-per-document, once enough documents carry the field.
pub fn looks_like_identifier(docs: &[Document], field: &str, opts: &AnalysisOpts) -> bool {
    let mut distinct: AHashSet<String> = AHashSet::new();
    let mut observed = 0usize;
    for key in docs.iter().filter_map(|d| d.get(field)).filter_map(FieldValue::as_key) {
        observed += 1;
        distinct.insert(key);
    }
    if observed < opts.min_cardinality_sample.max(2) {
        return false;
    }
    (distinct.len() as f64) / (observed as f64) > opts.unique_ratio
}
