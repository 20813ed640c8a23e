use crate::{CacheRecord, StoreError};

/// Durable storage for cache records.
///
/// Persistence is an optimisation: a cold start with nothing stored is valid,
/// and callers log rather than propagate failures from `save`.
pub trait CachePersistence: Send + Sync {
    fn load_all(&self) -> Result<Vec<CacheRecord>, StoreError>;

    /// Insert or replace the record stored under `record.key`.
    fn save(&self, record: &CacheRecord) -> Result<(), StoreError>;
}
