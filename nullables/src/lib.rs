//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator the refresh pipeline and verifier chain consume sits
//! behind a trait. The implementations here:
//! - return scripted values
//! - record how often they were called
//! - never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod decoder;
pub mod loader;
pub mod persistence;
pub mod revocation;

pub use clock::NullClock;
pub use decoder::NullDecoder;
pub use loader::NullDataLoader;
pub use persistence::NullCachePersistence;
pub use revocation::NullRevocationSource;
