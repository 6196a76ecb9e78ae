use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`BookStore`](crate::BookStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage-level rating guard rejected the write.
    #[error("rating {0} is out of range; expected 1-5")]
    RatingOutOfRange(i64),

    /// Any other constraint the store refused to honour.
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("record file is malformed: {0}")]
    Format(#[from] serde_json::Error),
}
