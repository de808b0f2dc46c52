use crate::error::{Result, StoreError};
use crate::tuple::{self, Element};

/// A half-open key range `[begin, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyRange {
    pub begin: Vec<u8>,
    pub end: Vec<u8>,
}

impl KeyRange {
    pub fn new(begin: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Self {
        Self {
            begin: begin.into(),
            end: end.into(),
        }
    }

    /// Every key that starts with `prefix` followed by a tuple element.
    pub fn under(prefix: &[u8]) -> Self {
        let mut begin = prefix.to_vec();
        begin.push(0x00);
        let mut end = prefix.to_vec();
        end.push(0xFF);
        Self { begin, end }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.begin.as_slice() <= key && key < self.end.as_slice()
    }

    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }
}

/// A key prefix formed from a packed tuple.
///
/// Keys inside a subspace are `prefix ++ pack(elements)`, so a subspace
/// nested in another is simply a longer prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subspace {
    prefix: Vec<u8>,
}

impl Subspace {
    pub fn new(elements: &[Element]) -> Self {
        Self {
            prefix: tuple::pack(elements),
        }
    }

    /// Opens a nested subspace.
    pub fn subspace(&self, elements: &[Element]) -> Subspace {
        Subspace {
            prefix: self.pack(elements),
        }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn pack(&self, elements: &[Element]) -> Vec<u8> {
        let mut key = self.prefix.clone();
        for element in elements {
            tuple::pack_into(&mut key, element);
        }
        key
    }

    /// Strips the prefix and decodes the remaining tuple.
    pub fn unpack(&self, key: &[u8]) -> Result<Vec<Element>> {
        let rest = key.strip_prefix(self.prefix.as_slice()).ok_or_else(|| {
            StoreError::InvalidKey("key does not belong to this subspace".to_string())
        })?;
        tuple::unpack(rest)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        key.starts_with(&self.prefix)
    }

    /// All keys in the subspace.
    pub fn range(&self) -> KeyRange {
        KeyRange::under(&self.prefix)
    }

    /// All keys in the subspace whose tuple starts with `elements`.
    pub fn range_of(&self, elements: &[Element]) -> KeyRange {
        KeyRange::under(&self.pack(elements))
    }
}
