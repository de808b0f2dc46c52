use crate::error::{Result, StoreError};
use crate::store::{KeyValue, OrderedStore, RangeOptions, Transaction};
use crate::subspace::KeyRange;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ops::Bound;
use std::sync::Arc;
use typed_builder::TypedBuilder;

/// Tuning knobs for [`MemoryStore`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct MemoryStoreSettings {
    /// Number of committed write sets kept for conflict checking.
    ///
    /// A transaction whose read version is older than the oldest retained
    /// commit can no longer be validated and fails with
    /// [`StoreError::TransactionTooOld`].
    #[builder(default = 65_536)]
    pub history_capacity: usize,
}

impl Default for MemoryStoreSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug)]
struct CommittedWrites {
    version: u64,
    keys: Vec<Vec<u8>>,
}

#[derive(Debug, Default)]
struct State {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    version: u64,
    history: VecDeque<CommittedWrites>,
    /// Every commit newer than this version is still in `history`.
    horizon: u64,
}

#[derive(Debug)]
struct Shared {
    state: RwLock<State>,
    settings: MemoryStoreSettings,
}

/// In-memory ordered store with optimistic concurrency control.
///
/// Data lives in a single `BTreeMap` guarded by a read-write lock. Readers
/// always see the latest committed data; serializability comes from commit
/// time validation: a transaction only commits if no commit made after its
/// read version wrote a key it read (or a key inside a range it scanned).
/// Commits apply their whole write set under the write lock, so a reader
/// never observes half of a transaction.
///
/// Cloning is cheap and clones share the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Creates an empty store with default settings.
    pub fn new() -> Self {
        Self::with_settings(MemoryStoreSettings::default())
    }

    pub fn with_settings(settings: MemoryStoreSettings) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(State::default()),
                settings,
            }),
        }
    }

    /// The version of the most recent commit.
    pub fn version(&self) -> u64 {
        self.shared.state.read().version
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.shared.state.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderedStore for MemoryStore {
    type Transaction = MemoryTransaction;

    fn begin(&self) -> MemoryTransaction {
        let read_version = self.shared.state.read().version;
        MemoryTransaction {
            shared: Arc::clone(&self.shared),
            read_version,
            writes: BTreeMap::new(),
            reads: ReadConflicts::default(),
        }
    }
}

#[derive(Debug, Default)]
struct ReadConflicts {
    keys: BTreeSet<Vec<u8>>,
    ranges: Vec<KeyRange>,
}

impl ReadConflicts {
    fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.ranges.is_empty()
    }

    fn intersects(&self, key: &[u8]) -> bool {
        self.keys.contains(key) || self.ranges.iter().any(|range| range.contains(key))
    }
}

/// A transaction against a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    read_version: u64,
    /// `None` marks a buffered clear.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    reads: ReadConflicts,
}

impl Transaction for MemoryTransaction {
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(buffered) = self.writes.get(key) {
            return Ok(buffered.clone());
        }
        self.reads.keys.insert(key.to_vec());
        Ok(self.shared.state.read().data.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
    }

    fn clear(&mut self, key: &[u8]) {
        self.writes.insert(key.to_vec(), None);
    }

    fn get_range(&mut self, range: &KeyRange, options: RangeOptions) -> Result<Vec<KeyValue>> {
        if range.is_empty() || options.limit == Some(0) {
            return Ok(Vec::new());
        }

        let bounds = (
            Bound::Included(range.begin.as_slice()),
            Bound::Excluded(range.end.as_slice()),
        );
        let pairs = {
            let state = self.shared.state.read();
            let committed = state.data.range::<[u8], _>(bounds);
            let buffered = self.writes.range::<[u8], _>(bounds);
            if options.reverse {
                merge(committed.rev(), buffered.rev(), true, options.limit)
            } else {
                merge(committed, buffered, false, options.limit)
            }
        };

        self.reads.ranges.push(observed_range(range, &pairs, options));
        Ok(pairs)
    }

    fn commit(self) -> Result<()> {
        let mut state = self.shared.state.write();

        if !self.reads.is_empty() {
            if self.read_version < state.horizon {
                return Err(StoreError::TransactionTooOld {
                    read_version: self.read_version,
                });
            }
            let conflicted = state
                .history
                .iter()
                .rev()
                .take_while(|commit| commit.version > self.read_version)
                .any(|commit| commit.keys.iter().any(|key| self.reads.intersects(key)));
            if conflicted {
                return Err(StoreError::Conflict);
            }
        }

        if self.writes.is_empty() {
            return Ok(());
        }

        state.version += 1;
        let version = state.version;
        let mut keys = Vec::with_capacity(self.writes.len());
        for (key, value) in self.writes {
            match value {
                Some(value) => {
                    state.data.insert(key.clone(), value);
                }
                None => {
                    state.data.remove(&key);
                }
            }
            keys.push(key);
        }
        state.history.push_back(CommittedWrites { version, keys });

        let capacity = self.shared.settings.history_capacity.max(1);
        while state.history.len() > capacity {
            if let Some(evicted) = state.history.pop_front() {
                state.horizon = evicted.version;
            }
        }

        Ok(())
    }
}

/// Merges committed pairs with the transaction's buffered writes, both
/// already in scan order. Buffered entries shadow committed ones with the
/// same key and buffered clears hide them.
fn merge<'a, C, B>(committed: C, buffered: B, reverse: bool, limit: Option<usize>) -> Vec<KeyValue>
where
    C: Iterator<Item = (&'a Vec<u8>, &'a Vec<u8>)>,
    B: Iterator<Item = (&'a Vec<u8>, &'a Option<Vec<u8>>)>,
{
    let mut committed = committed.peekable();
    let mut buffered = buffered.peekable();
    let mut out = Vec::new();

    loop {
        if limit.is_some_and(|limit| out.len() >= limit) {
            break;
        }

        // `Less` takes the committed pair next, `Greater` the buffered one.
        let next = match (committed.peek(), buffered.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((committed_key, _)), Some((buffered_key, _))) => {
                let order = committed_key.cmp(buffered_key);
                if reverse {
                    order.reverse()
                } else {
                    order
                }
            }
        };

        match next {
            Ordering::Less => {
                if let Some((key, value)) = committed.next() {
                    out.push(KeyValue {
                        key: key.clone(),
                        value: value.clone(),
                    });
                }
            }
            Ordering::Equal | Ordering::Greater => {
                if next == Ordering::Equal {
                    committed.next();
                }
                if let Some((key, Some(value))) = buffered.next() {
                    out.push(KeyValue {
                        key: key.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
    }

    out
}

/// The part of `range` whose contents determined the result.
///
/// When the limit cut the scan short, keys beyond the last returned pair
/// could not have changed the result and are left out of the conflict range.
fn observed_range(range: &KeyRange, pairs: &[KeyValue], options: RangeOptions) -> KeyRange {
    let truncated = options.limit.is_some_and(|limit| pairs.len() >= limit);
    match pairs.last() {
        Some(last) if truncated => {
            if options.reverse {
                KeyRange::new(last.key.clone(), range.end.clone())
            } else {
                let mut end = last.key.clone();
                end.push(0x00);
                KeyRange::new(range.begin.clone(), end)
            }
        }
        _ => range.clone(),
    }
}
