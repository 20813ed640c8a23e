//! LMDB implementation of `CachePersistence`.

use std::path::Path;
use std::sync::Arc;

use heed::types::{Bytes, Str};
use heed::{Database, Env};

use eutl_store::{CachePersistence, CacheRecord, StoreError};

use crate::environment::DEFAULT_MAP_SIZE;
use crate::{LmdbEnvironment, LmdbError};

const RECORDS_DB: &str = "cache_records";

pub struct LmdbCachePersistence {
    env: Arc<Env>,
    records_db: Database<Str, Bytes>,
}

impl LmdbCachePersistence {
    pub fn open(path: &Path) -> Result<Self, LmdbError> {
        Self::from_environment(&LmdbEnvironment::open(path, 1, DEFAULT_MAP_SIZE)?)
    }

    pub fn from_environment(environment: &LmdbEnvironment) -> Result<Self, LmdbError> {
        let env = environment.env().clone();
        let mut wtxn = env.write_txn()?;
        let records_db: Database<Str, Bytes> = env.create_database(&mut wtxn, Some(RECORDS_DB))?;
        wtxn.commit()?;
        Ok(Self { env, records_db })
    }
}

impl CachePersistence for LmdbCachePersistence {
    fn load_all(&self) -> Result<Vec<CacheRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.records_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut records = Vec::new();
        for entry in iter {
            let (key, bytes) = entry.map_err(LmdbError::from)?;
            match CacheRecord::decode(bytes) {
                Ok(record) => records.push(record),
                // An undecodable record is treated as absent; it is rebuilt on the next cycle.
                Err(e) => tracing::warn!(key, error = %e, "skipping corrupted cache record"),
            }
        }
        Ok(records)
    }

    fn save(&self, record: &CacheRecord) -> Result<(), StoreError> {
        let bytes = record.encode()?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.records_db
            .put(&mut wtxn, record.key.as_str(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
