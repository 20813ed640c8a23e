//! Byte-fetch collaborator.

use async_trait::async_trait;
use eutl_types::Timestamp;

use crate::FetchError;

/// Raw bytes of one fetched document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedDocument {
    pub bytes: Vec<u8>,
    pub fetched_at: Timestamp,
}

/// Transport for trusted-list documents. Implementations own any timeouts,
/// retries or on-disk caching of their own.
#[async_trait]
pub trait DataLoader: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchedDocument, FetchError>;
}
