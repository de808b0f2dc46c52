use crate::error::{Result, ShortenerError};
use crate::keyspace::Keyspace;
use crate::popularity;
use warren_core::ShortCode;
use warren_store::{StoreError, Transaction};

/// Writes a new mapping together with its zeroed counter and index entry.
///
/// Fails with [`ShortenerError::DuplicateCode`] if `code` is already mapped.
pub fn register<T: Transaction>(
    tr: &mut T,
    keyspace: &Keyspace,
    code: &ShortCode,
    url: &str,
) -> Result<()> {
    let key = keyspace.url_key(code);
    if tr.get(&key)?.is_some() {
        return Err(ShortenerError::DuplicateCode(code.to_string()));
    }
    tr.set(&key, url.as_bytes());
    popularity::init(tr, keyspace, code);
    Ok(())
}

/// Reads the target URL of `code` without counting an access.
///
/// An empty value is a reservation marker, never a target URL, so it reads
/// as unmapped.
pub fn lookup<T: Transaction>(
    tr: &mut T,
    keyspace: &Keyspace,
    code: &ShortCode,
) -> Result<Option<String>> {
    let Some(raw) = tr.get(&keyspace.url_key(code))? else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }
    let url = String::from_utf8(raw).map_err(|e| {
        StoreError::InvalidData(format!("url for '{code}' is not UTF-8: {e}"))
    })?;
    Ok(Some(url))
}

/// Resolves `code` to its URL and counts the access in the same transaction.
pub fn resolve<T: Transaction>(tr: &mut T, keyspace: &Keyspace, code: &ShortCode) -> Result<String> {
    let url = lookup(tr, keyspace, code)?
        .ok_or_else(|| ShortenerError::NotFound(code.to_string()))?;
    popularity::record_access(tr, keyspace, code)?;
    Ok(url)
}
