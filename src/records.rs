use crate::document::{Document, FieldValue};
use crate::error::{EngineError, Result};
use crate::masking::PatternExtractor;
use crate::parser;
use crate::schema::{self, FieldKind, FieldTypeHints};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A log line prepared for pattern and sequence analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    /// Signature computed upstream; wins over extracting one from `text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl TextRecord {
    pub fn new(timestamp: DateTime<Utc>, text: impl Into<String>) -> Self {
        Self { trace_id: None, timestamp, text: text.into(), pattern: None }
    }

    pub fn with_trace(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn signature(&self, extractor: &PatternExtractor) -> String {
        match &self.pattern {
            Some(p) => p.clone(),
            None => extractor.extract(&self.text),
        }
    }
}

/// Which document fields feed a `TextRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    pub text_field: String,
    pub time_field: String,
    pub trace_field: Option<String>,
    pub pattern_field: Option<String>,
}

impl RecordFields {
    pub fn new(text_field: impl Into<String>, time_field: impl Into<String>) -> Self {
        Self {
            text_field: text_field.into(),
            time_field: time_field.into(),
            trace_field: None,
            pattern_field: None,
        }
    }

    pub fn with_trace(mut self, trace_field: impl Into<String>) -> Self {
        self.trace_field = Some(trace_field.into());
        self
    }

    pub fn with_pattern(mut self, pattern_field: impl Into<String>) -> Self {
        self.pattern_field = Some(pattern_field.into());
        self
    }
}

/// Extracts text records, rejecting a text or pattern field that is absent or
/// not string-typed, and a time field that is absent or cannot hold
/// timestamps. Documents lacking the text or a parseable timestamp are skipped.
pub fn text_records_from_documents(
    docs: &[Document],
    fields: &RecordFields,
    hints: Option<&FieldTypeHints>,
) -> Result<Vec<TextRecord>> {
    if docs.is_empty() {
        return Ok(Vec::new());
    }
    ensure_string_field(docs, hints, &fields.text_field)?;
    ensure_time_field(docs, hints, &fields.time_field)?;
    if let Some(pattern_field) = &fields.pattern_field {
        ensure_string_field(docs, hints, pattern_field)?;
    }

    let mut out = Vec::with_capacity(docs.len());
    let mut skipped = 0usize;
    for doc in docs {
        let text = doc.get(&fields.text_field).and_then(FieldValue::as_str);
        let timestamp = doc.get(&fields.time_field).and_then(timestamp_of);
        let (Some(text), Some(timestamp)) = (text, timestamp) else {
            skipped += 1;
            continue;
        };
        out.push(TextRecord {
            trace_id: fields
                .trace_field
                .as_deref()
                .and_then(|f| doc.get(f))
                .and_then(FieldValue::as_key),
            timestamp,
            text: text.to_string(),
            pattern: fields
                .pattern_field
                .as_deref()
                .and_then(|f| doc.get(f))
                .and_then(FieldValue::as_str)
                .map(str::to_string),
        });
    }
    if skipped > 0 {
        warn!(skipped, total = docs.len(), "documents without text or parseable timestamp skipped");
    }
    Ok(out)
}

fn timestamp_of(value: &FieldValue) -> Option<DateTime<Utc>> {
    match value {
        FieldValue::Text(s) => parser::parse_timestamp(s),
        FieldValue::Integer(i) => parser::parse_timestamp(&i.to_string()),
        _ => None,
    }
}

fn ensure_present(docs: &[Document], hints: Option<&FieldTypeHints>, field: &str) -> Result<()> {
    let declared = hints.map(|h| h.contains_key(field)).unwrap_or(false);
    if declared || docs.iter().any(|d| d.contains(field)) {
        Ok(())
    } else {
        Err(EngineError::FieldNotFound { field: field.to_string() })
    }
}

/// The time field must be declared as a date, or hold text or integer values
/// of which at least one parses as a timestamp.
fn ensure_time_field(docs: &[Document], hints: Option<&FieldTypeHints>, field: &str) -> Result<()> {
    ensure_present(docs, hints, field)?;
    let mismatch = |found: &str| EngineError::FieldTypeMismatch {
        field: field.to_string(),
        expected: "timestamp".into(),
        found: found.to_string(),
    };
    if let Some(declared) = hints.and_then(|h| h.get(field)) {
        if schema::classify_declared(declared) != FieldKind::Date {
            return Err(mismatch(declared));
        }
        return Ok(());
    }
    let values: Vec<&FieldValue> = docs
        .iter()
        .filter_map(|d| d.get(field))
        .filter(|v| !v.is_null())
        .collect();
    if let Some(v) = values
        .iter()
        .find(|v| !matches!(v, FieldValue::Text(_) | FieldValue::Integer(_)))
    {
        return Err(mismatch(v.type_name()));
    }
    match values.first() {
        Some(first) if !values.iter().any(|v| timestamp_of(v).is_some()) => Err(mismatch(first.type_name())),
        _ => Ok(()),
    }
}

fn ensure_string_field(docs: &[Document], hints: Option<&FieldTypeHints>, field: &str) -> Result<()> {
    ensure_present(docs, hints, field)?;
    if let Some(declared) = hints.and_then(|h| h.get(field)) {
        if !schema::classify_declared(declared).is_string() {
            return Err(EngineError::FieldTypeMismatch {
                field: field.to_string(),
                expected: "string".into(),
                found: declared.clone(),
            });
        }
        return Ok(());
    }
    let offending = docs
        .iter()
        .filter_map(|d| d.get(field))
        .find(|v| !v.is_null() && v.as_str().is_none());
    match offending {
        Some(v) => Err(EngineError::FieldTypeMismatch {
            field: field.to_string(),
            expected: "string".into(),
            found: v.type_name().to_string(),
        }),
        None => Ok(()),
    }
}
