use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Analyzer unavailable: {0}")]
    AnalyzerUnavailable(String),

    #[error("Source field '{path}' must be a string or an array of strings, found {found}")]
    SourceFieldTypeMismatch { path: String, found: &'static str },

    #[error("Background corpus is empty")]
    EmptyBackground,

    #[error("Aggregation cancelled")]
    Cancelled,

    #[error("Source retrieval error: {0}")]
    SourceRetrieval(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
