use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by index construction, persistence and scoring.
#[derive(Debug, Error)]
pub enum Error {
    #[error("corpus schema is missing required field(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("cannot fit an index on an empty corpus")]
    EmptyCorpus,

    #[error("no term survived tokenization and stop-word removal; vocabulary is empty")]
    EmptyVocabulary,

    #[error("query vector has {query_dims} dimension(s) but the index matrix has {index_dims} column(s)")]
    IndexMismatch { query_dims: usize, index_dims: usize },

    #[error("malformed query vector: {0}")]
    MalformedQuery(String),

    #[error("top_n must be at least 1")]
    InvalidTopN,

    #[error("invalid corpus record at {location}: {reason}")]
    Corpus { location: String, reason: String },

    #[error("index storage error at {}: {reason}", .path.display())]
    Storage { path: PathBuf, reason: String },
}

impl Error {
    pub(crate) fn storage(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Storage { path: path.into(), reason: reason.to_string() }
    }
}
