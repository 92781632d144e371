use crate::document::{Document, FieldValue};
use crate::error::{EngineError, Result};
use crate::schema::FieldTypeHints;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// `{"hits": {"hits": [{"_source": {...}}]}}`
    SearchResponse,
    /// `{"schema": [{"name", "type"}], "datarows": [[...]]}`
    TabularResponse,
    /// `[{...}, {...}]`
    JsonArray,
    /// One JSON object per line.
    JsonLines,
}

pub fn detect_format(text: &str) -> InputFormat {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        return InputFormat::JsonArray;
    }
    // A wrapped response is a single document spanning the whole input.
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        if map.contains_key("hits") {
            return InputFormat::SearchResponse;
        }
        if map.contains_key("datarows") {
            return InputFormat::TabularResponse;
        }
    }
    InputFormat::JsonLines
}

/// Parses one JSON object into a document, flattening nested objects into dotted keys.
pub fn parse_document(line: &str) -> Result<Document> {
    let v: Value = serde_json::from_str(line)?;
    document_from_value(&v)
}

pub fn document_from_value(v: &Value) -> Result<Document> {
    match v {
        Value::Object(_) => {
            let mut flat = BTreeMap::new();
            flatten_json("", v, &mut flat);
            Ok(Document::from(flat))
        }
        other => Err(EngineError::InvalidResponse(format!(
            "expected a JSON object, found {}",
            json_type(other)
        ))),
    }
}

pub fn parse_jsonl(text: &str) -> Result<Vec<Document>> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            parse_document(l)
                .map_err(|e| EngineError::InvalidResponse(format!("line {}: {e}", i + 1)))
        })
        .collect()
}

pub fn documents_from_array(v: &Value) -> Result<Vec<Document>> {
    let items = v
        .as_array()
        .ok_or_else(|| EngineError::InvalidResponse("expected a JSON array of objects".into()))?;
    items.iter().map(document_from_value).collect()
}

/// Converts a search response into documents: each hit's `_source`, plus `_id` and `_index`.
pub fn documents_from_search_response(v: &Value) -> Result<Vec<Document>> {
    let hits = v
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::InvalidResponse("missing hits.hits array".into()))?;
    let mut out = Vec::with_capacity(hits.len());
    for hit in hits {
        let mut flat = BTreeMap::new();
        if let Some(source) = hit.get("_source") {
            flatten_json("", source, &mut flat);
        }
        for meta in ["_id", "_index"] {
            if let Some(Value::String(s)) = hit.get(meta) {
                flat.insert(meta.to_string(), FieldValue::Text(s.clone()));
            }
        }
        out.push(Document::from(flat));
    }
    Ok(out)
}

/// Converts a tabular (`schema` + `datarows`) response into documents and the
/// declared column types.
pub fn documents_from_tabular_response(v: &Value) -> Result<(Vec<Document>, FieldTypeHints)> {
    let schema = v
        .get("schema")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::InvalidResponse("missing schema array".into()))?;
    let rows = v
        .get("datarows")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::InvalidResponse("missing datarows array".into()))?;

    let mut columns = Vec::with_capacity(schema.len());
    let mut hints = FieldTypeHints::new();
    for col in schema {
        let name = col
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::InvalidResponse("schema column without a name".into()))?;
        if let Some(t) = col.get("type").and_then(Value::as_str) {
            hints.insert(name.to_string(), t.to_string());
        }
        columns.push(name.to_string());
    }

    let mut docs = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let cells = row
            .as_array()
            .ok_or_else(|| EngineError::InvalidResponse(format!("datarow {i} is not an array")))?;
        if cells.len() != columns.len() {
            return Err(EngineError::InvalidResponse(format!(
                "datarow {i} has {} cells, schema has {} columns",
                cells.len(),
                columns.len()
            )));
        }
        let mut flat = BTreeMap::new();
        for (name, cell) in columns.iter().zip(cells) {
            flatten_json(name, cell, &mut flat);
        }
        docs.push(Document::from(flat));
    }
    Ok((docs, hints))
}

fn flatten_json(prefix: &str, v: &Value, out: &mut BTreeMap<String, FieldValue>) {
    match v {
        Value::Object(map) => {
            for (k, v) in map.iter() {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten_json(&key, v, out);
            }
        }
        Value::Array(arr) => {
            for (idx, item) in arr.iter().enumerate() {
                let key = if prefix.is_empty() {
                    idx.to_string()
                } else {
                    format!("{prefix}.{idx}")
                };
                flatten_json(&key, item, out);
            }
        }
        Value::Null => {
            out.insert(prefix.to_string(), FieldValue::Null);
        }
        Value::Bool(b) => {
            out.insert(prefix.to_string(), FieldValue::Bool(*b));
        }
        Value::Number(n) => {
            let value = match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            };
            out.insert(prefix.to_string(), value);
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), FieldValue::Text(s.clone()));
        }
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parses RFC3339, the common `YYYY-MM-DD hh:mm:ss` layouts, bare dates and
/// epoch seconds/millis/micros given as digit strings.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    parse_ts_string(s).or_else(|| parse_ts_number_string(s))
}

fn parse_ts_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let zoned = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];
    for f in zoned.iter() {
        if let Ok(dt) = DateTime::parse_from_str(s, f) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    let naive = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ];
    for f in naive.iter() {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, f) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

fn parse_ts_number_string(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let n = s.parse::<i64>().ok()?;
    match s.len() {
        10 => DateTime::<Utc>::from_timestamp(n, 0),
        13 => DateTime::<Utc>::from_timestamp_millis(n),
        16 => DateTime::<Utc>::from_timestamp_micros(n),
        _ => None,
    }
}
