//! Key layout of the shortener tables.
//!
//! Everything lives under one namespace directory `(namespace,)`:
//!
//! | table      | key                           | value              |
//! |------------|-------------------------------|--------------------|
//! | mapping    | `("urls", code)`              | target URL (UTF-8) |
//! | counter    | `("stats", code)`             | count, u64 BE      |
//! | popularity | `("reverse", count, code)`    | empty              |
//! | cursor     | `("counter",)`                | cursor, u64 BE     |

use warren_core::ShortCode;
use warren_store::{Element, KeyRange, StoreError, Subspace};

#[derive(Debug, Clone)]
pub struct Keyspace {
    urls: Subspace,
    stats: Subspace,
    reverse: Subspace,
    cursor: Vec<u8>,
}

impl Keyspace {
    pub fn new(namespace: &str) -> Self {
        let root = Subspace::new(&[namespace.into()]);
        Self {
            urls: root.subspace(&["urls".into()]),
            stats: root.subspace(&["stats".into()]),
            reverse: root.subspace(&["reverse".into()]),
            cursor: root.pack(&["counter".into()]),
        }
    }

    pub fn url_key(&self, code: &ShortCode) -> Vec<u8> {
        self.urls.pack(&[code.as_str().into()])
    }

    pub fn count_key(&self, code: &ShortCode) -> Vec<u8> {
        self.stats.pack(&[code.as_str().into()])
    }

    pub fn popularity_key(&self, count: u64, code: &ShortCode) -> Vec<u8> {
        self.reverse.pack(&[count.into(), code.as_str().into()])
    }

    pub fn cursor_key(&self) -> &[u8] {
        &self.cursor
    }

    pub fn urls_range(&self) -> KeyRange {
        self.urls.range()
    }

    pub fn counts_range(&self) -> KeyRange {
        self.stats.range()
    }

    /// The whole popularity index.
    pub fn popularity_range(&self) -> KeyRange {
        self.reverse.range()
    }

    /// Popularity entries whose count is exactly `count`.
    pub fn popularity_range_at(&self, count: u64) -> KeyRange {
        self.reverse.range_of(&[count.into()])
    }

    /// Decodes a key from the mapping table.
    pub fn url_code(&self, key: &[u8]) -> Result<ShortCode, StoreError> {
        match self.urls.unpack(key)?.as_slice() {
            [Element::Str(code)] => Ok(ShortCode::new_unchecked(code.as_str())),
            other => Err(malformed("mapping", other)),
        }
    }

    /// Decodes a key from the counter table.
    pub fn count_code(&self, key: &[u8]) -> Result<ShortCode, StoreError> {
        match self.stats.unpack(key)?.as_slice() {
            [Element::Str(code)] => Ok(ShortCode::new_unchecked(code.as_str())),
            other => Err(malformed("counter", other)),
        }
    }

    /// Decodes a popularity index key into `(count, code)`.
    pub fn popularity_entry(&self, key: &[u8]) -> Result<(u64, ShortCode), StoreError> {
        match self.reverse.unpack(key)?.as_slice() {
            [Element::U64(count), Element::Str(code)] => {
                Ok((*count, ShortCode::new_unchecked(code.as_str())))
            }
            other => Err(malformed("popularity", other)),
        }
    }
}

fn malformed(table: &str, elements: &[Element]) -> StoreError {
    let rendered: Vec<String> = elements.iter().map(ToString::to_string).collect();
    StoreError::InvalidKey(format!(
        "unexpected {table} key ({})",
        rendered.join(", ")
    ))
}

/// Encodes a count or cursor value.
pub fn encode_u64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decodes a count or cursor value.
pub fn decode_u64(bytes: &[u8]) -> Result<u64, StoreError> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        StoreError::InvalidData(format!("expected 8 bytes, found {}", bytes.len()))
    })?;
    Ok(u64::from_be_bytes(raw))
}
