use crate::error::Result;
use crate::subspace::KeyRange;
use typed_builder::TypedBuilder;

/// A key-value pair returned by a range read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Options for an ordered range read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, TypedBuilder)]
pub struct RangeOptions {
    /// Maximum number of pairs to return. `None` reads the whole range.
    #[builder(default, setter(strip_option))]
    pub limit: Option<usize>,
    /// Return pairs from the end of the range backwards.
    #[builder(default)]
    pub reverse: bool,
}

/// A unit of work against an [`OrderedStore`].
///
/// Writes are buffered until [`commit`](Transaction::commit) and are visible
/// to the transaction's own reads. A transaction that is dropped without
/// committing has no effect.
pub trait Transaction: Send {
    /// Reads a single key.
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Buffers a write of `value` at `key`.
    fn set(&mut self, key: &[u8], value: &[u8]);

    /// Buffers the removal of `key`. Clearing a missing key is not an error.
    fn clear(&mut self, key: &[u8]);

    /// Reads the pairs in `range` in key order (or reverse key order).
    fn get_range(&mut self, range: &KeyRange, options: RangeOptions) -> Result<Vec<KeyValue>>;

    /// Atomically applies every buffered write.
    ///
    /// Fails with a retryable error if a concurrent commit touched anything
    /// this transaction read.
    fn commit(self) -> Result<()>;
}

/// An ordered key-value store with optimistic serializable transactions.
pub trait OrderedStore: Send + Sync + 'static {
    type Transaction: Transaction;

    /// Starts a new transaction at the current read version.
    fn begin(&self) -> Self::Transaction;
}
