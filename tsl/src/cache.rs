//! In-memory cache of per-source records with one writer per key.
//!
//! Readers take [`TlCache::snapshot`] or [`TlCache::get`] and receive
//! immutable `Arc<CacheRecord>` values; they never wait on a writer. A writer
//! obtains a [`CacheLease`] for one key, mutates its private working copy and
//! publishes it with [`CacheLease::commit`]. Leases on different keys never
//! contend.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use eutl_store::{CacheKey, CachePersistence, CacheRecord, SourceRole};
use eutl_types::{Clock, Timestamp};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Published records keyed by source identity.
pub type CacheSnapshot = HashMap<CacheKey, Arc<CacheRecord>>;

pub struct TlCache {
    records: RwLock<CacheSnapshot>,
    writers: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
    persistence: Option<Arc<dyn CachePersistence>>,
}

impl TlCache {
    /// An empty cache without persistence. Cold start.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            writers: Mutex::new(HashMap::new()),
            persistence: None,
        }
    }

    /// A cache warm-started from `persistence`, saving every committed record back.
    ///
    /// Load failures are logged and leave the cache empty.
    pub fn with_persistence(persistence: Arc<dyn CachePersistence>, clock: &dyn Clock) -> Self {
        let mut records = HashMap::new();
        match persistence.load_all() {
            Ok(loaded) => {
                for mut record in loaded {
                    // A record persisted mid-stage belongs to a cycle that never finished.
                    record.expire_in_flight(clock.now());
                    records.insert(record.key.clone(), Arc::new(record));
                }
                info!(records = records.len(), "warm-started trusted-list cache");
            }
            Err(e) => warn!(error = %e, "failed to load persisted cache; starting cold"),
        }
        Self {
            records: RwLock::new(records),
            writers: Mutex::new(HashMap::new()),
            persistence: Some(persistence),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<CacheRecord>> {
        self.read().get(key).cloned()
    }

    /// Consistent copy of every published record.
    pub fn snapshot(&self) -> CacheSnapshot {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Register a source, creating an EMPTY record if none exists yet.
    pub fn register(&self, role: SourceRole, url: &str) -> CacheKey {
        let key = CacheKey::new(role, url);
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records
            .entry(key.clone())
            .or_insert_with(|| Arc::new(CacheRecord::new(role, url)));
        key
    }

    /// Wait for exclusive write access to `key`.
    pub async fn lease(&self, role: SourceRole, url: &str) -> CacheLease<'_> {
        let key = self.register(role, url);
        let lock = {
            let mut writers = self.writers.lock().await;
            writers
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let guard = lock.lock_owned().await;
        let working = self
            .get(&key)
            .map(|r| r.as_ref().clone())
            .unwrap_or_else(|| CacheRecord::new(role, url));
        debug!(key = %key, "acquired cache lease");
        CacheLease {
            cache: self,
            working,
            _guard: guard,
        }
    }

    /// Force any stage of `key` left in flight to ERROR(timeout).
    ///
    /// Returns the number of stages expired.
    pub async fn expire_in_flight(&self, role: SourceRole, url: &str, now: Timestamp) -> usize {
        let mut lease = self.lease(role, url).await;
        let expired = lease.record_mut().expire_in_flight(now);
        if expired > 0 {
            warn!(key = %lease.record().key, stages = expired, "expired in-flight stages after cycle timeout");
            lease.commit();
        }
        expired
    }

    /// Expire every record left in flight, e.g. after a cancelled cycle.
    pub async fn expire_all_in_flight(&self, now: Timestamp) -> usize {
        let stale: Vec<(SourceRole, String)> = self
            .read()
            .values()
            .filter(|r| r.is_in_flight())
            .filter_map(|r| r.role().map(|role| (role, r.url.clone())))
            .collect();
        let mut expired = 0;
        for (role, url) in stale {
            expired += self.expire_in_flight(role, &url, now).await;
        }
        expired
    }

    /// Drop writer locks nobody holds any more.
    pub async fn cleanup(&self) {
        let mut writers = self.writers.lock().await;
        writers.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    fn publish(&self, record: CacheRecord) {
        if let Some(persistence) = &self.persistence {
            if !record.is_in_flight() {
                if let Err(e) = persistence.save(&record) {
                    warn!(key = %record.key, error = %e, "failed to persist cache record");
                }
            }
        }
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(record.key.clone(), Arc::new(record));
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CacheSnapshot> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TlCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive write access to one cache record.
///
/// Changes become visible to readers only on [`commit`](Self::commit);
/// dropping the lease discards uncommitted changes.
pub struct CacheLease<'a> {
    cache: &'a TlCache,
    working: CacheRecord,
    _guard: OwnedMutexGuard<()>,
}

impl CacheLease<'_> {
    pub fn record(&self) -> &CacheRecord {
        &self.working
    }

    pub fn record_mut(&mut self) -> &mut CacheRecord {
        &mut self.working
    }

    /// Publish the working copy.
    pub fn commit(&self) {
        self.cache.publish(self.working.clone());
    }
}
