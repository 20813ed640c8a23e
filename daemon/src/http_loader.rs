//! Transport for trusted-list documents: HTTP(S) and local files.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eutl_tsl::{DataLoader, FetchError, FetchedDocument};
use eutl_types::Clock;
use tracing::debug;

use crate::error::DaemonError;

pub struct HttpDataLoader {
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl HttpDataLoader {
    pub fn new(timeout: Duration, clock: Arc<dyn Clock>) -> Result<Self, DaemonError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("eutl-daemon/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DaemonError::Http(e.to_string()))?;
        Ok(Self { client, clock })
    }

    async fn get_http(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await.map_err(map_reqwest)?;
        Ok(bytes.to_vec())
    }
}

/// Local path named by `url`, or `None` for network URLs.
fn local_path(url: &str) -> Option<PathBuf> {
    if let Some(path) = url.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return None;
    }
    Some(PathBuf::from(url))
}

fn map_reqwest(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e.to_string())
    }
}

#[async_trait]
impl DataLoader for HttpDataLoader {
    async fn get(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let bytes = match local_path(url) {
            Some(path) => tokio::fs::read(&path).await.map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => FetchError::NotFound(path.display().to_string()),
                _ => FetchError::Network(e.to_string()),
            })?,
            None => self.get_http(url).await?,
        };
        debug!(url, size = bytes.len(), "fetched document");
        Ok(FetchedDocument {
            bytes,
            fetched_at: self.clock.now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eutl_types::SystemClock;

    fn loader() -> HttpDataLoader {
        HttpDataLoader::new(Duration::from_secs(5), Arc::new(SystemClock)).unwrap()
    }

    #[test]
    fn classifies_urls() {
        assert_eq!(local_path("file:///etc/lotl.json"), Some(PathBuf::from("/etc/lotl.json")));
        assert_eq!(local_path("lists/be.json"), Some(PathBuf::from("lists/be.json")));
        assert_eq!(local_path("https://tl.example/be.xml"), None);
    }

    #[tokio::test]
    async fn reads_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("be.json");
        std::fs::write(&path, b"{}").unwrap();

        let url = format!("file://{}", path.display());
        let doc = loader().get(&url).await.unwrap();
        assert_eq!(doc.bytes, b"{}");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let url = dir.path().join("absent.json").display().to_string();
        assert!(matches!(loader().get(&url).await, Err(FetchError::NotFound(_))));
    }
}
