use typed_builder::TypedBuilder;
use warren_core::reserved::DEFAULT_RESERVED;
use warren_core::{ReservedCodes, ShortCode};

use crate::error::Result;

pub const DEFAULT_NAMESPACE: &str = "shortener";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/";

/// Configures a [`ShortenerService`](crate::service::ShortenerService).
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerSettings {
    /// Top-level directory holding every table of the service.
    #[builder(default = DEFAULT_NAMESPACE.to_string(), setter(into))]
    pub namespace: String,
    /// Codes that can never be assigned to a user mapping.
    #[builder(default = vec![DEFAULT_RESERVED.to_string()])]
    pub reserved: Vec<String>,
    /// Prefix used to render full short URLs.
    #[builder(default = DEFAULT_BASE_URL.to_string(), setter(into))]
    pub base_url: String,
}

impl ShortenerSettings {
    /// Validates the configured reserved codes.
    pub fn reserved_codes(&self) -> Result<ReservedCodes> {
        let codes = self
            .reserved
            .iter()
            .map(|code| ShortCode::new(code.as_str()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ReservedCodes::new(codes))
    }
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}
