//! Nullable transport: scripted per-URL responses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use eutl_tsl::{DataLoader, FetchError, FetchedDocument};
use eutl_types::Clock;

use crate::NullClock;

#[derive(Clone)]
enum Scripted {
    Bytes(Vec<u8>),
    Failure(FetchError),
}

/// Serves bytes configured per URL. Unknown URLs fail with `NotFound`.
pub struct NullDataLoader {
    clock: Arc<NullClock>,
    responses: Mutex<HashMap<String, Scripted>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl NullDataLoader {
    pub fn new(clock: Arc<NullClock>) -> Self {
        Self {
            clock,
            responses: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn respond(&self, url: &str, bytes: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::Bytes(bytes.into()));
    }

    pub fn fail(&self, url: &str, error: FetchError) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::Failure(error));
    }

    /// Hold every request for `url` for `delay` before answering.
    pub fn delay(&self, url: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(url.to_string(), delay);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl DataLoader for NullDataLoader {
    async fn get(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        let delay = self.delays.lock().unwrap().get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.responses.lock().unwrap().get(url).cloned();
        match scripted {
            Some(Scripted::Bytes(bytes)) => Ok(FetchedDocument {
                bytes,
                fetched_at: self.clock.now(),
            }),
            Some(Scripted::Failure(e)) => Err(e),
            None => Err(FetchError::NotFound(url.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_scripted_bytes_and_counts() {
        let loader = NullDataLoader::new(Arc::new(NullClock::new(7)));
        loader.respond("https://tl.example/a", b"hello".to_vec());
        let doc = loader.get("https://tl.example/a").await.unwrap();
        assert_eq!(doc.bytes, b"hello");
        assert_eq!(doc.fetched_at.as_secs(), 7);
        assert_eq!(loader.calls("https://tl.example/a"), 1);
    }

    #[tokio::test]
    async fn unknown_url_is_not_found() {
        let loader = NullDataLoader::new(Arc::new(NullClock::new(0)));
        assert!(matches!(
            loader.get("https://nowhere").await,
            Err(FetchError::NotFound(_))
        ));
    }
}
