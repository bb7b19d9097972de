use thiserror::Error;

/// Errors surfaced by the classification, season and scoring services.
#[derive(Debug, Error)]
pub enum TuneCapsuleError {
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    #[error("Invalid classification: {0}")]
    InvalidClassification(String),

    #[error("Unexpected upstream data: {0}")]
    UpstreamData(String),

    #[error("No results: {0}")]
    NoResults(String),

    #[error("Artist name conflict: {0}")]
    NameConflict(String),
}

pub type TuneCapsuleResult<T> = std::result::Result<T, TuneCapsuleError>;
