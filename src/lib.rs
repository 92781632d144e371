pub mod error;
pub mod config;
pub mod document;
pub mod schema;
pub mod parser;
pub mod fields;
pub mod distribution;
pub mod bucketing;
pub mod divergence;
pub mod masking;
pub mod records;
pub mod patterns;
pub mod pattern_diff;
pub mod sequence;
pub mod temporal;
pub mod source;
pub mod filter;
pub mod engine;

pub use config::AnalysisOpts;
pub use document::{Document, FieldValue};
pub use error::{EngineError, Result};
