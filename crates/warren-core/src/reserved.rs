use crate::shortcode::ShortCode;
use std::collections::BTreeSet;

/// The code the service reserves when nothing else is configured.
pub const DEFAULT_RESERVED: &str = "stats";

/// A fixed set of codes that can never be assigned to a user mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedCodes {
    codes: BTreeSet<ShortCode>,
}

impl ReservedCodes {
    pub fn new(codes: impl IntoIterator<Item = ShortCode>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
        }
    }

    pub fn contains(&self, code: &ShortCode) -> bool {
        self.codes.contains(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShortCode> {
        self.codes.iter()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for ReservedCodes {
    fn default() -> Self {
        Self::new([ShortCode::new_unchecked(DEFAULT_RESERVED)])
    }
}
