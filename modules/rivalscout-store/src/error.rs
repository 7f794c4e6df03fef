use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Kinded storage errors. Callers retry `Transient` (at most twice, with
/// exponential backoff); `Fatal` fails the run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transient storage error: {0}")]
    Transient(String),

    #[error("Fatal storage error: {0}")]
    Fatal(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Transient(err.to_string()),
            sqlx::Error::Database(db) => {
                if db.is_unique_violation() {
                    return StoreError::Conflict(db.message().to_string());
                }
                // Class 40 = transaction rollback, 53 = insufficient resources,
                // 57 = operator intervention. All worth a retry.
                let code = db.code().unwrap_or_default();
                if code.starts_with("40") || code.starts_with("53") || code.starts_with("57") {
                    StoreError::Transient(db.message().to_string())
                } else {
                    StoreError::Fatal(db.message().to_string())
                }
            }
            _ => StoreError::Fatal(err.to_string()),
        }
    }
}
