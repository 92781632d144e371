use thiserror::Error;

/// Boxed error handed back by a retrieval layer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("field '{field}' does not exist in the schema")]
    FieldNotFound { field: String },
    #[error("field '{field}' must be {expected}, found {found}")]
    FieldTypeMismatch {
        field: String,
        expected: String,
        found: String,
    },
    #[error("unknown filter operator '{operator}'")]
    UnknownFilterOperator { operator: String },
    #[error("malformed '{operator}' filter: {reason}")]
    MalformedFilter { operator: String, reason: String },
    #[error("invalid pattern regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("divergence computation failed: {0}")]
    Divergence(String),
    #[error("invalid analysis options: {0}")]
    InvalidOptions(String),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected response shape: {0}")]
    InvalidResponse(String),
    #[error("upstream retrieval failed: {0}")]
    Upstream(#[source] BoxError),
}

impl EngineError {
    pub fn upstream<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        EngineError::Upstream(err.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
