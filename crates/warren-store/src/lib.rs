//! Ordered transactional key-value storage for Warren.
//!
//! The shortener never talks to a backend directly: every operation is a
//! closure run by [`Database::transact`] against an [`OrderedStore`]
//! transaction, with keys built from the order-preserving [`tuple`] layer.

pub mod database;
pub mod error;
pub mod memory;
pub mod store;
pub mod subspace;
pub mod tuple;

pub use database::{Database, TransactSettings};
pub use error::StoreError;
pub use memory::{MemoryStore, MemoryStoreSettings, MemoryTransaction};
pub use store::{KeyValue, OrderedStore, RangeOptions, Transaction};
pub use subspace::{KeyRange, Subspace};
pub use tuple::Element;
