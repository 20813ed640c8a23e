//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::{Env, EnvOpenOptions};

use crate::LmdbError;

/// Default map size: 256 MiB is far beyond what a full LOTL/TL set needs.
pub const DEFAULT_MAP_SIZE: usize = 256 * 1024 * 1024;

/// Owns the heed environment shared by all database handles.
#[derive(Clone)]
pub struct LmdbEnvironment {
    env: Arc<Env>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an environment at `path`, creating the directory if needed.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per directory by this process
        // and never memory-mapped elsewhere while open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)
        }?;
        tracing::debug!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(Self {
            env: Arc::new(env),
            path: path.to_path_buf(),
        })
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
