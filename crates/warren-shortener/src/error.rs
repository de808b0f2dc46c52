use thiserror::Error;
use warren_core::CoreError;
use warren_store::StoreError;

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortenerError {
    #[error("invalid alias: {0}")]
    InvalidAlias(String),
    #[error("short code already in use: {0}")]
    DuplicateCode(String),
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<CoreError> for ShortenerError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidShortCode(message) | CoreError::Overflow(message) => {
                Self::InvalidAlias(message)
            }
        }
    }
}
