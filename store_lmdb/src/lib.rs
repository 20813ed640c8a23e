//! LMDB persistence for the trusted-list cache.
//!
//! Implements [`eutl_store::CachePersistence`] on top of `heed`. A single
//! environment holds one named database keyed by the cache key string, with
//! bincode-encoded [`eutl_store::CacheRecord`] values.

pub mod environment;
pub mod error;
pub mod records;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use records::LmdbCachePersistence;
