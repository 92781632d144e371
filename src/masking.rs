use crate::error::{EngineError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// Reduces a raw line to its structural signature.
///
/// Without `mask`, every ASCII letter and digit is dropped so only
/// punctuation, whitespace and symbols remain. With `mask`, only the
/// substrings it matches are removed.
pub fn extract_pattern(raw: &str, mask: Option<&Regex>) -> String {
    match mask {
        Some(re) => re.replace_all(raw, "").into_owned(),
        None => raw.chars().filter(|c| !c.is_ascii_alphanumeric()).collect(),
    }
}

/// Compiled masking rule reused across a batch of records.
#[derive(Debug, Clone, Default)]
pub struct PatternExtractor {
    mask: Option<Regex>,
}

impl PatternExtractor {
    pub fn new(mask: Option<&str>) -> Result<Self> {
        let mask = match mask {
            Some(pattern) => Some(Regex::new(pattern).map_err(|source| EngineError::InvalidRegex {
                pattern: pattern.to_string(),
                source,
            })?),
            None => None,
        };
        Ok(Self { mask })
    }

    pub fn skeleton() -> Self {
        Self { mask: None }
    }

    /// Masks digit runs only, keeping words and punctuation.
    pub fn digits() -> Self {
        Self { mask: Some(RE_DIGITS.clone()) }
    }

    pub fn extract(&self, raw: &str) -> String {
        extract_pattern(raw, self.mask.as_ref())
    }
}
