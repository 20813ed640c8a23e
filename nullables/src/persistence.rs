//! Nullable persistence: thread-safe in-memory record storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use eutl_store::{CacheKey, CachePersistence, CacheRecord, StoreError};

#[derive(Default)]
pub struct NullCachePersistence {
    records: Mutex<HashMap<CacheKey, CacheRecord>>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl NullCachePersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null persistence set to fail".into()));
        }
        Ok(())
    }
}

impl CachePersistence for NullCachePersistence {
    fn load_all(&self) -> Result<Vec<CacheRecord>, StoreError> {
        self.check()?;
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }

    fn save(&self, record: &CacheRecord) -> Result<(), StoreError> {
        self.check()?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .insert(record.key.clone(), record.clone());
        Ok(())
    }
}
