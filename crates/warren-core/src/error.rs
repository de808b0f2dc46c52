use thiserror::Error;

/// Result type for the core domain types.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("short code does not fit in 64 bits: {0}")]
    Overflow(String),
}
