//! Typed filter operators parsed from their untyped JSON form.
//!
//! Accepted shapes mirror the query DSL clauses:
//! `{"term": {"status": "error"}}`, `{"range": {"latency": {"gte": 10}}}`,
//! `{"match": {"message": "timeout"}}`, `{"wildcard": {"host": "web-*"}}`,
//! `{"regexp": {"host": "web-[0-9]+"}}`, `{"prefix": {"path": "/api"}}`,
//! `{"exists": {"field": "user"}}`. Single-field clauses also take the
//! object form `{"term": {"status": {"value": "error"}}}`.

use crate::document::{Document, FieldValue};
use crate::error::{EngineError, Result};
use crate::parser;
use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub enum Filter {
    Term { field: String, value: FieldValue },
    Range { field: String, bounds: RangeBounds },
    Match { field: String, query: String },
    Wildcard { field: String, pattern: String, compiled: Regex },
    Regexp { field: String, pattern: String, compiled: Regex },
    Prefix { field: String, prefix: String },
    Exists { field: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeBounds {
    pub gt: Option<FieldValue>,
    pub gte: Option<FieldValue>,
    pub lt: Option<FieldValue>,
    pub lte: Option<FieldValue>,
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Filter::Term { field, .. }
            | Filter::Range { field, .. }
            | Filter::Match { field, .. }
            | Filter::Wildcard { field, .. }
            | Filter::Regexp { field, .. }
            | Filter::Prefix { field, .. }
            | Filter::Exists { field } => field,
        }
    }

    pub fn operator(&self) -> &'static str {
        match self {
            Filter::Term { .. } => "term",
            Filter::Range { .. } => "range",
            Filter::Match { .. } => "match",
            Filter::Wildcard { .. } => "wildcard",
            Filter::Regexp { .. } => "regexp",
            Filter::Prefix { .. } => "prefix",
            Filter::Exists { .. } => "exists",
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        let value = match doc.get(self.field()) {
            Some(v) if !v.is_null() => v,
            _ => return false,
        };
        match self {
            Filter::Exists { .. } => true,
            Filter::Term { value: expected, .. } => value.as_key() == expected.as_key(),
            Filter::Range { bounds, .. } => bounds.contains(value),
            Filter::Match { query, .. } => {
                let Some(key) = value.as_key() else { return false };
                let tokens = tokenize(&key);
                tokenize(query).iter().any(|q| tokens.contains(q))
            }
            Filter::Wildcard { compiled, .. } | Filter::Regexp { compiled, .. } => {
                value.as_key().map(|k| compiled.is_match(&k)).unwrap_or(false)
            }
            Filter::Prefix { prefix, .. } => value.as_key().map(|k| k.starts_with(prefix.as_str())).unwrap_or(false),
        }
    }
}

impl RangeBounds {
    pub fn contains(&self, value: &FieldValue) -> bool {
        let check = |bound: &Option<FieldValue>, ok: fn(Ordering) -> bool| match bound {
            Some(b) => compare_values(value, b).map(ok).unwrap_or(false),
            None => true,
        };
        check(&self.gt, |o| o == Ordering::Greater)
            && check(&self.gte, |o| o != Ordering::Less)
            && check(&self.lt, |o| o == Ordering::Less)
            && check(&self.lte, |o| o != Ordering::Greater)
    }

    fn is_empty(&self) -> bool {
        self.gt.is_none() && self.gte.is_none() && self.lt.is_none() && self.lte.is_none()
    }
}

/// Numbers compare numerically, timestamps chronologically, anything else as strings.
fn compare_values(a: &FieldValue, b: &FieldValue) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (numeric(a), numeric(b)) {
        return x.partial_cmp(&y);
    }
    let (ka, kb) = (a.as_key()?, b.as_key()?);
    if let (Some(ta), Some(tb)) = (parser::parse_timestamp(&ka), parser::parse_timestamp(&kb)) {
        return Some(ta.cmp(&tb));
    }
    Some(ka.cmp(&kb))
}

fn numeric(v: &FieldValue) -> Option<f64> {
    v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

fn tokenize(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Parses one clause or an array of clauses.
pub fn parse_filters(v: &Value) -> Result<Vec<Filter>> {
    match v {
        Value::Array(items) => items.iter().map(parse_filter).collect(),
        Value::Null => Ok(Vec::new()),
        other => Ok(vec![parse_filter(other)?]),
    }
}

pub fn parse_filter(v: &Value) -> Result<Filter> {
    let clause = v
        .as_object()
        .ok_or_else(|| malformed("filter", "clause must be a JSON object"))?;
    if clause.len() != 1 {
        return Err(malformed("filter", "clause must have exactly one operator"));
    }
    let (operator, body) = clause.iter().next().ok_or_else(|| malformed("filter", "empty clause"))?;
    let body = body
        .as_object()
        .ok_or_else(|| malformed(operator, "operator body must be an object"))?;

    match operator.as_str() {
        "exists" => {
            let field = body
                .get("field")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed("exists", "missing 'field'"))?;
            Ok(Filter::Exists { field: field.to_string() })
        }
        "term" => {
            let (field, value) = single_field(operator, body, "value")?;
            Ok(Filter::Term { field, value: scalar(operator, value)? })
        }
        "range" => {
            let (field, limits) = single_field(operator, body, "")?;
            let limits = limits
                .as_object()
                .ok_or_else(|| malformed("range", "bounds must be an object"))?;
            let bound = |name: &str| -> Result<Option<FieldValue>> {
                limits.get(name).map(|b| scalar("range", b)).transpose()
            };
            let bounds = RangeBounds { gt: bound("gt")?, gte: bound("gte")?, lt: bound("lt")?, lte: bound("lte")? };
            if bounds.is_empty() {
                return Err(malformed("range", "needs at least one of gt, gte, lt, lte"));
            }
            Ok(Filter::Range { field, bounds })
        }
        "match" => {
            let (field, query) = single_field(operator, body, "query")?;
            Ok(Filter::Match { field, query: text(operator, query)? })
        }
        "wildcard" => {
            let (field, pattern) = single_field(operator, body, "value")?;
            let pattern = text(operator, pattern)?;
            let compiled = compile(operator, &wildcard_to_regex(&pattern))?;
            Ok(Filter::Wildcard { field, pattern, compiled })
        }
        "regexp" => {
            let (field, pattern) = single_field(operator, body, "value")?;
            let pattern = text(operator, pattern)?;
            let compiled = compile(operator, &format!("^(?:{pattern})$"))?;
            Ok(Filter::Regexp { field, pattern, compiled })
        }
        "prefix" => {
            let (field, prefix) = single_field(operator, body, "value")?;
            Ok(Filter::Prefix { field, prefix: text(operator, prefix)? })
        }
        unknown => Err(EngineError::UnknownFilterOperator { operator: unknown.to_string() }),
    }
}

/// `{"field": x}` or `{"field": {"<inner>": x}}`; an empty `inner` returns the body as-is.
fn single_field<'a>(operator: &str, body: &'a Map<String, Value>, inner: &str) -> Result<(String, &'a Value)> {
    if body.len() != 1 {
        return Err(malformed(operator, "expects exactly one field"));
    }
    let (field, value) = body.iter().next().ok_or_else(|| malformed(operator, "missing field"))?;
    let value = match value {
        Value::Object(obj) if !inner.is_empty() => obj
            .get(inner)
            .ok_or_else(|| malformed(operator, &format!("missing '{inner}'")))?,
        other => other,
    };
    Ok((field.clone(), value))
}

fn scalar(operator: &str, v: &Value) -> Result<FieldValue> {
    match v {
        Value::String(s) => Ok(FieldValue::Text(s.clone())),
        Value::Bool(b) => Ok(FieldValue::Bool(*b)),
        Value::Number(n) => Ok(match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        }),
        _ => Err(malformed(operator, "value must be a string, number or boolean")),
    }
}

fn text(operator: &str, v: &Value) -> Result<String> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| malformed(operator, "value must be a string"))
}

fn compile(operator: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| malformed(operator, &e.to_string()))
}

fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    out
}

fn malformed(operator: &str, reason: &str) -> EngineError {
    EngineError::MalformedFilter { operator: operator.to_string(), reason: reason.to_string() }
}

pub fn matches_all(filters: &[Filter], doc: &Document) -> bool {
    filters.iter().all(|f| f.matches(doc))
}

/// Splits a batch into (matching, non-matching) documents.
pub fn partition(docs: &[Document], filters: &[Filter]) -> (Vec<Document>, Vec<Document>) {
    docs.iter().cloned().partition(|d| matches_all(filters, d))
}
