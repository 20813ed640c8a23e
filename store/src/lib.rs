//! Cache Store data model for trusted-list synchronisation.
//!
//! One [`CacheRecord`] exists per configured or discovered source. Each record
//! tracks the download, parsing and validation stages independently through the
//! [`StageRecord`] state machine. Storage backends (LMDB, in-memory for testing)
//! implement [`CachePersistence`]; the rest of the workspace depends only on the trait.

pub mod error;
pub mod key;
pub mod persistence;
pub mod record;
pub mod stage;

pub use error::StoreError;
pub use key::{CacheKey, SourceRole};
pub use persistence::CachePersistence;
pub use record::{CacheRecord, DownloadResult};
pub use stage::{CacheErrorKind, CachedError, Stage, StagePlan, StageRecord, StageState};
