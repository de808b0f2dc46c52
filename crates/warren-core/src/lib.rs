//! Core types for the Warren URL shortener.
//!
//! This crate holds the storage-agnostic domain vocabulary: short codes,
//! the allocator codec, reserved codes and ranking results.

pub mod codec;
pub mod error;
pub mod ranking;
pub mod reserved;
pub mod shortcode;

pub use error::CoreError;
pub use ranking::{Direction, RankedCode, Ranking};
pub use reserved::ReservedCodes;
pub use shortcode::ShortCode;
