use crate::shortcode::ShortCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;

/// Which end of the popularity index a query reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Highest access count first.
    Most,
    /// Lowest access count first.
    Least,
}

impl Direction {
    /// Whether an ordered scan for this direction runs from the end of the index.
    pub fn is_reverse(self) -> bool {
        matches!(self, Direction::Most)
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Most => f.write_str("most"),
            Direction::Least => f.write_str("least"),
        }
    }
}

/// The extreme access count in one direction and every code tied at it.
///
/// An empty index yields `count == 0` with no codes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ranking {
    pub count: u64,
    pub codes: BTreeSet<ShortCode>,
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// A code together with its current access count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCode {
    pub code: ShortCode,
    pub count: u64,
}
