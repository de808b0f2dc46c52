use crate::allocator::CodeAllocator;
use crate::error::Result;
use crate::keyspace::{decode_u64, Keyspace};
use serde::Serialize;
use warren_core::{RankedCode, ShortCode};
use warren_store::{RangeOptions, StoreError, Transaction};

/// One row of the mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRow {
    pub code: ShortCode,
    pub url: String,
}

/// Contents of every shortener table, read in one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyspaceDump {
    pub cursor: u64,
    pub mappings: Vec<MappingRow>,
    pub counters: Vec<RankedCode>,
    /// Index entries in key order (count ascending, then code).
    pub index: Vec<RankedCode>,
}

pub fn dump<T: Transaction>(
    tr: &mut T,
    keyspace: &Keyspace,
    allocator: &CodeAllocator,
) -> Result<KeyspaceDump> {
    let cursor = allocator.cursor(tr)?;

    let mut mappings = Vec::new();
    for kv in tr.get_range(&keyspace.urls_range(), RangeOptions::default())? {
        let url = String::from_utf8(kv.value)
            .map_err(|e| StoreError::InvalidData(format!("url is not UTF-8: {e}")))?;
        mappings.push(MappingRow {
            code: keyspace.url_code(&kv.key)?,
            url,
        });
    }

    let mut counters = Vec::new();
    for kv in tr.get_range(&keyspace.counts_range(), RangeOptions::default())? {
        counters.push(RankedCode {
            code: keyspace.count_code(&kv.key)?,
            count: decode_u64(&kv.value)?,
        });
    }

    let mut index = Vec::new();
    for kv in tr.get_range(&keyspace.popularity_range(), RangeOptions::default())? {
        let (count, code) = keyspace.popularity_entry(&kv.key)?;
        index.push(RankedCode { code, count });
    }

    Ok(KeyspaceDump {
        cursor,
        mappings,
        counters,
        index,
    })
}
