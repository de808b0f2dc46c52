use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("transaction conflicted with a concurrent commit")]
    Conflict,
    #[error("transaction read version {read_version} is older than the conflict window")]
    TransactionTooOld { read_version: u64 },
    #[error("transaction gave up after {attempts} attempts")]
    RetryLimitExceeded { attempts: u32 },
    #[error("key is not a valid tuple: {0}")]
    InvalidKey(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Whether re-running the whole transaction may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Conflict | StoreError::TransactionTooOld { .. }
        )
    }
}
