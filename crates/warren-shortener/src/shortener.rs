use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use warren_core::{Direction, RankedCode, Ranking, ShortCode};

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub original_url: String,
    /// Optional custom alias. `None` or an empty string generates a code.
    pub custom_alias: Option<String>,
}

impl ShortenParams {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            custom_alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.custom_alias = Some(alias.into());
        self
    }
}

/// The operations the web layer consumes.
///
/// Every method runs as exactly one transaction; transient conflicts are
/// retried internally and never show up as errors.
#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Maps a URL to a new short code and returns it.
    ///
    /// Fails with `InvalidAlias` or `DuplicateCode` for a bad or taken alias.
    async fn create(&self, params: ShortenParams) -> Result<ShortCode>;

    /// Returns the URL of `code` and counts the access atomically.
    ///
    /// Fails with `NotFound` for an unknown or reserved code.
    async fn resolve(&self, code: &ShortCode) -> Result<String>;

    /// The most or least accessed codes, with every tie included.
    async fn rank(&self, direction: Direction) -> Result<Ranking>;

    /// Up to `limit` codes from one end of the popularity order.
    async fn leaderboard(&self, direction: Direction, limit: usize) -> Result<Vec<RankedCode>>;

    /// Number of times `code` has been resolved.
    async fn count_of(&self, code: &ShortCode) -> Result<u64>;
}
