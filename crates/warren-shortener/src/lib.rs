//! URL shortener service implementation.
//!
//! This crate lays the shortener tables out in an ordered transactional
//! store and implements code allocation, resolution with access counting,
//! and popularity ranking on top of it. Core types are re-exported from
//! `warren_core`.

pub mod allocator;
pub mod error;
pub mod inspect;
pub mod keyspace;
pub mod popularity;
pub mod registry;
pub mod service;
pub mod settings;
pub mod shortener;

pub use error::ShortenerError;
pub use inspect::KeyspaceDump;
pub use popularity::IndexViolation;
pub use service::ShortenerService;
pub use settings::ShortenerSettings;
pub use shortener::{ShortenParams, Shortener};
pub use warren_core::{Direction, RankedCode, Ranking, ShortCode};
