//! Access counters and the popularity index.
//!
//! Every registered code has a counter `("stats", code) -> n` and exactly one
//! index entry `("reverse", n, code)` carrying the same `n`. The index key
//! packs the count as a fixed-width big-endian integer, so key order is
//! count order and the extremes of the index are its first and last keys.
//! Both are only ever changed together inside one transaction.

use crate::error::{Result, ShortenerError};
use crate::keyspace::{decode_u64, encode_u64, Keyspace};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use warren_core::{Direction, RankedCode, Ranking, ReservedCodes, ShortCode};
use warren_store::{RangeOptions, StoreError, Transaction};

/// Starts `code` at zero accesses.
pub fn init<T: Transaction>(tr: &mut T, keyspace: &Keyspace, code: &ShortCode) {
    tr.set(&keyspace.count_key(code), &encode_u64(0));
    tr.set(&keyspace.popularity_key(0, code), b"");
}

/// Counts one access to `code`, moving its index entry from `n` to `n + 1`.
///
/// The caller must already have checked that `code` is registered; a
/// registered code without a counter means the tables are corrupt.
pub fn record_access<T: Transaction>(tr: &mut T, keyspace: &Keyspace, code: &ShortCode) -> Result<u64> {
    let count_key = keyspace.count_key(code);
    let current = match tr.get(&count_key)? {
        Some(raw) => decode_u64(&raw)?,
        None => {
            return Err(StoreError::InvalidData(format!(
                "registered code '{code}' has no access counter"
            ))
            .into())
        }
    };
    let next = current.checked_add(1).ok_or_else(|| {
        StoreError::InvalidData(format!("access counter of '{code}' overflowed"))
    })?;

    tr.set(&count_key, &encode_u64(next));
    tr.clear(&keyspace.popularity_key(current, code));
    tr.set(&keyspace.popularity_key(next, code), b"");
    Ok(next)
}

/// Current access count of `code`.
pub fn count_of<T: Transaction>(tr: &mut T, keyspace: &Keyspace, code: &ShortCode) -> Result<u64> {
    match tr.get(&keyspace.count_key(code))? {
        Some(raw) => Ok(decode_u64(&raw)?),
        None => Err(ShortenerError::NotFound(code.to_string())),
    }
}

/// Finds the extreme count in `direction` and every code tied at it.
///
/// One short scan from the chosen end of the index yields the extreme count;
/// a second scan over exactly that count collects the ties. Reserved codes
/// are skipped in both, so the first scan reads at most one entry past the
/// reserved ones.
pub fn extremal<T: Transaction>(
    tr: &mut T,
    keyspace: &Keyspace,
    reserved: &ReservedCodes,
    direction: Direction,
) -> Result<Ranking> {
    let edge = RangeOptions::builder()
        .limit(reserved.len().saturating_add(1))
        .reverse(direction.is_reverse())
        .build();
    let mut count = None;
    for kv in tr.get_range(&keyspace.popularity_range(), edge)? {
        let (n, code) = keyspace.popularity_entry(&kv.key)?;
        if !reserved.contains(&code) {
            count = Some(n);
            break;
        }
    }
    let Some(count) = count else {
        return Ok(Ranking::default());
    };

    let mut codes = BTreeSet::new();
    for kv in tr.get_range(&keyspace.popularity_range_at(count), RangeOptions::default())? {
        let (_, code) = keyspace.popularity_entry(&kv.key)?;
        if !reserved.contains(&code) {
            codes.insert(code);
        }
    }

    Ok(Ranking { count, codes })
}

/// Up to `limit` unreserved codes in index order from the chosen end.
pub fn leaderboard<T: Transaction>(
    tr: &mut T,
    keyspace: &Keyspace,
    reserved: &ReservedCodes,
    direction: Direction,
    limit: usize,
) -> Result<Vec<RankedCode>> {
    let options = RangeOptions::builder()
        .limit(limit.saturating_add(reserved.len()))
        .reverse(direction.is_reverse())
        .build();
    let mut page = Vec::new();
    for kv in tr.get_range(&keyspace.popularity_range(), options)? {
        if page.len() == limit {
            break;
        }
        let (count, code) = keyspace.popularity_entry(&kv.key)?;
        if !reserved.contains(&code) {
            page.push(RankedCode { code, count });
        }
    }
    Ok(page)
}

/// A break in the counter/index invariant found by [`audit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexViolation {
    /// A mapped code has no access counter.
    MissingCounter { code: ShortCode },
    /// A counter has no index entry at its count.
    MissingEntry { code: ShortCode, count: u64 },
    /// An index entry disagrees with its code's counter.
    StaleEntry { code: ShortCode, count: u64, actual: u64 },
    /// An index entry exists for a code without a counter.
    OrphanEntry { code: ShortCode, count: u64 },
}

/// Checks every counter against the popularity index.
pub fn audit<T: Transaction>(
    tr: &mut T,
    keyspace: &Keyspace,
    reserved: &ReservedCodes,
) -> Result<Vec<IndexViolation>> {
    let mut counters = BTreeMap::new();
    for kv in tr.get_range(&keyspace.counts_range(), RangeOptions::default())? {
        counters.insert(keyspace.count_code(&kv.key)?, decode_u64(&kv.value)?);
    }

    let mut violations = Vec::new();

    for kv in tr.get_range(&keyspace.urls_range(), RangeOptions::default())? {
        let code = keyspace.url_code(&kv.key)?;
        if !reserved.contains(&code) && !counters.contains_key(&code) {
            violations.push(IndexViolation::MissingCounter { code });
        }
    }

    let mut indexed = BTreeSet::new();
    for kv in tr.get_range(&keyspace.popularity_range(), RangeOptions::default())? {
        let (count, code) = keyspace.popularity_entry(&kv.key)?;
        match counters.get(&code) {
            None => violations.push(IndexViolation::OrphanEntry { code, count }),
            Some(&actual) if actual != count => {
                violations.push(IndexViolation::StaleEntry { code, count, actual })
            }
            Some(_) => {
                indexed.insert(code);
            }
        }
    }

    for (code, count) in counters {
        if !indexed.contains(&code) {
            violations.push(IndexViolation::MissingEntry { code, count });
        }
    }

    Ok(violations)
}
