use thiserror::Error;

#[derive(Error, Debug)]
pub enum RivalScoutError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not accessible: {0}")]
    Scope(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Search provider error: {0}")]
    Provider(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Enrichment error: {0}")]
    Enrichment(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
