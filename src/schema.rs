use crate::document::{Document, FieldValue};
use crate::parser;
use std::collections::BTreeMap;

/// Declared index mapping: field path -> backend type name (`keyword`, `date`, `long`, ...).
pub type FieldTypeHints = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Date,
    Text,
    Integer,
    Float,
    Bool,
    /// Objects, binary blobs, geo shapes: nothing to count.
    Structural,
    Other,
}

impl FieldKind {
    pub fn is_string(self) -> bool {
        matches!(self, FieldKind::Text)
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Date => "date",
            FieldKind::Text => "keyword",
            FieldKind::Integer => "long",
            FieldKind::Float => "double",
            FieldKind::Bool => "boolean",
            FieldKind::Structural => "object",
            FieldKind::Other => "mixed",
        }
    }
}

pub fn classify_declared(declared: &str) -> FieldKind {
    match declared.to_ascii_lowercase().as_str() {
        "date" | "date_nanos" | "timestamp" | "datetime" | "time" => FieldKind::Date,
        "text" | "keyword" | "string" | "match_only_text" | "wildcard" | "constant_keyword" => {
            FieldKind::Text
        }
        "long" | "integer" | "int" | "short" | "byte" | "unsigned_long" | "bigint" | "smallint"
        | "tinyint" => FieldKind::Integer,
        "float" | "double" | "half_float" | "scaled_float" | "real" => FieldKind::Float,
        "boolean" | "bool" => FieldKind::Bool,
        "binary" | "object" | "nested" | "geo_point" | "geo_shape" | "struct" | "array" => {
            FieldKind::Structural
        }
        _ => FieldKind::Other,
    }
}

/// Kind of `field` as observed in the sample; `None` when every value is null or missing.
pub fn infer_kind(docs: &[Document], field: &str) -> Option<FieldKind> {
    let mut kind: Option<FieldKind> = None;
    for value in docs.iter().filter_map(|d| d.get(field)) {
        let k = match value {
            FieldValue::Null => continue,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Text(s) => {
                if parser::parse_timestamp(s).is_some() {
                    FieldKind::Date
                } else {
                    FieldKind::Text
                }
            }
        };
        kind = Some(match (kind, k) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(FieldKind::Integer), FieldKind::Float) | (Some(FieldKind::Float), FieldKind::Integer) => {
                FieldKind::Float
            }
            // A text field where only some values look like dates is still text.
            (Some(FieldKind::Date), FieldKind::Text) | (Some(FieldKind::Text), FieldKind::Date) => {
                FieldKind::Text
            }
            _ => FieldKind::Other,
        });
    }
    kind
}

/// Kind of `field` from the declared hints, falling back to the sample.
pub fn resolve_kind(docs: &[Document], hints: Option<&FieldTypeHints>, field: &str) -> Option<FieldKind> {
    hints
        .and_then(|h| h.get(field))
        .map(|t| classify_declared(t))
        .or_else(|| infer_kind(docs, field))
}

/// Builds a hint map purely from the sample, for callers with no mapping at hand.
pub fn infer_field_types(docs: &[Document]) -> FieldTypeHints {
    let mut names: Vec<&String> = docs.iter().flat_map(|d| d.field_names()).collect();
    names.sort();
    names.dedup();
    names
        .into_iter()
        .filter_map(|name| infer_kind(docs, name).map(|k| (name.clone(), k.name().to_string())))
        .collect()
}
