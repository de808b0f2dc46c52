use crate::error::{Result, ShortenerError};
use crate::keyspace::{decode_u64, encode_u64, Keyspace};
use warren_core::{ReservedCodes, ShortCode};
use warren_store::{StoreError, Transaction};

/// Cursor value written when the service is first bootstrapped.
pub const INITIAL_CURSOR: u64 = 1;

/// Validates a caller-supplied alias against the short code alphabet.
pub fn validate_alias(alias: &str) -> Result<ShortCode> {
    ShortCode::new(alias).map_err(ShortenerError::from)
}

/// Hands out previously unused short codes.
///
/// Generated codes come from scanning a persisted cursor forward until the
/// encoded value is free. The cursor lives in the store, not in process
/// memory, so several service instances can allocate from the same
/// namespace; two allocations racing for the same value both read its
/// mapping key and only one of them can commit.
///
/// The scan has no upper bound: once every value up to `u64::MAX` is taken
/// allocation fails with a storage error.
#[derive(Debug, Clone)]
pub struct CodeAllocator {
    keyspace: Keyspace,
    reserved: ReservedCodes,
}

impl CodeAllocator {
    pub fn new(keyspace: Keyspace, reserved: ReservedCodes) -> Self {
        Self { keyspace, reserved }
    }

    /// Picks the code for a new mapping.
    ///
    /// A non-empty `alias` is validated and returned unchanged if it is
    /// free; an empty or missing alias generates a code.
    pub fn allocate<T: Transaction>(&self, tr: &mut T, alias: Option<&str>) -> Result<ShortCode> {
        match alias.filter(|alias| !alias.is_empty()) {
            Some(alias) => {
                let code = validate_alias(alias)?;
                if self.is_taken(tr, &code)? {
                    return Err(ShortenerError::DuplicateCode(code.to_string()));
                }
                Ok(code)
            }
            None => self.generate(tr),
        }
    }

    /// Whether `code` is reserved or already mapped.
    pub fn is_taken<T: Transaction>(&self, tr: &mut T, code: &ShortCode) -> Result<bool> {
        if self.reserved.contains(code) {
            return Ok(true);
        }
        Ok(tr.get(&self.keyspace.url_key(code))?.is_some())
    }

    /// Scans forward from the cursor to the first free value.
    ///
    /// The selected value itself (not its successor) becomes the new
    /// cursor, so the next scan re-checks it and moves past it.
    fn generate<T: Transaction>(&self, tr: &mut T) -> Result<ShortCode> {
        let mut value = self.cursor(tr)?.max(INITIAL_CURSOR);
        loop {
            let code = ShortCode::generated(value)?;
            if !self.is_taken(tr, &code)? {
                tr.set(self.keyspace.cursor_key(), &encode_u64(value));
                return Ok(code);
            }
            value = value.checked_add(1).ok_or_else(|| {
                StoreError::InvalidData("allocation cursor exhausted the u64 range".to_string())
            })?;
        }
    }

    /// Reads the persisted cursor, defaulting to [`INITIAL_CURSOR`].
    pub fn cursor<T: Transaction>(&self, tr: &mut T) -> Result<u64> {
        match tr.get(self.keyspace.cursor_key())? {
            Some(raw) => Ok(decode_u64(&raw)?),
            None => Ok(INITIAL_CURSOR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warren_store::{MemoryStore, OrderedStore};

    fn allocator() -> CodeAllocator {
        CodeAllocator::new(Keyspace::new("test"), ReservedCodes::default())
    }

    fn occupy(store: &MemoryStore, allocator: &CodeAllocator, codes: &[&str]) {
        let mut tr = store.begin();
        for code in codes {
            let code = ShortCode::new(*code).unwrap();
            tr.set(&allocator.keyspace.url_key(&code), b"https://taken.example");
        }
        tr.commit().unwrap();
    }

    #[test]
    fn generates_from_the_initial_cursor() {
        let store = MemoryStore::new();
        let allocator = allocator();

        let mut tr = store.begin();
        let code = allocator.allocate(&mut tr, None).unwrap();
        assert_eq!(code.as_str(), "B");
        assert_eq!(allocator.cursor(&mut tr).unwrap(), 1);
    }

    #[test]
    fn empty_alias_means_generate() {
        let store = MemoryStore::new();
        let mut tr = store.begin();
        let code = allocator().allocate(&mut tr, Some("")).unwrap();
        assert_eq!(code.as_str(), "B");
    }

    #[test]
    fn skips_taken_values_and_persists_the_selected_one() {
        let store = MemoryStore::new();
        let allocator = allocator();
        occupy(&store, &allocator, &["B", "C", "E"]);

        let mut tr = store.begin();
        let code = allocator.allocate(&mut tr, None).unwrap();
        assert_eq!(code.as_str(), "D");
        assert_eq!(allocator.cursor(&mut tr).unwrap(), 3);
    }

    #[test]
    fn never_generates_a_reserved_code() {
        let store = MemoryStore::new();
        let reserved = ReservedCodes::new([ShortCode::new("B").unwrap()]);
        let allocator = CodeAllocator::new(Keyspace::new("test"), reserved);

        let mut tr = store.begin();
        assert_eq!(allocator.allocate(&mut tr, None).unwrap().as_str(), "C");
    }

    #[test]
    fn alias_is_returned_unchanged() {
        let store = MemoryStore::new();
        let mut tr = store.begin();
        let code = allocator().allocate(&mut tr, Some("my-Alias_1")).unwrap();
        assert_eq!(code.as_str(), "my-Alias_1");
    }

    #[test]
    fn invalid_alias_is_rejected() {
        let store = MemoryStore::new();
        let mut tr = store.begin();
        let err = allocator().allocate(&mut tr, Some("no spaces")).unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidAlias(_)));
    }

    #[test]
    fn taken_or_reserved_alias_is_a_duplicate() {
        let store = MemoryStore::new();
        let allocator = allocator();
        occupy(&store, &allocator, &["short"]);

        let mut tr = store.begin();
        assert_eq!(
            allocator.allocate(&mut tr, Some("short")),
            Err(ShortenerError::DuplicateCode("short".to_string()))
        );
        assert_eq!(
            allocator.allocate(&mut tr, Some("stats")),
            Err(ShortenerError::DuplicateCode("stats".to_string()))
        );
    }
}
