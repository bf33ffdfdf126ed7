//! Storage abstraction for campool.
//!
//! Backend crates (e.g., campool-store-memory) implement these traits so the
//! service core doesn't depend on any specific database engine or schema
//! details. Rides live in a document store with a per-record version counter
//! for optimistic concurrency; chat threads are append-only documents with a
//! retention deadline.

use thiserror::Error;

mod store;
pub mod types;

pub use store::*;
pub use types::*;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    /// Version precondition failed on a conditional update; the caller should
    /// re-read and re-check its preconditions.
    #[error("conflict")]
    Conflict,
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
