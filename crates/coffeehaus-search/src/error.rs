use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Places API error: {0}")]
    Places(String),

    #[error("Query analysis failed: {0}")]
    Analyzer(String),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, SearchError>;
