//! Per-source cache record.

use eutl_types::{ContentDigest, ParsingResult, Timestamp, ValidationResult};
use serde::{Deserialize, Serialize};

use crate::{CacheKey, SourceRole, Stage, StageRecord, StageState, StoreError};

/// Outcome of a successful download. The raw bytes are held by the processor
/// only for the duration of a cycle; the record keeps their digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub digest: ContentDigest,
    pub size: u64,
    pub downloaded_at: Timestamp,
}

/// Download, parsing and validation state of one source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub key: CacheKey,
    pub url: String,
    pub download: StageRecord<DownloadResult>,
    pub parsing: StageRecord<ParsingResult>,
    pub validation: StageRecord<ValidationResult>,
}

impl CacheRecord {
    /// A fresh record with every stage EMPTY.
    pub fn new(role: SourceRole, url: &str) -> Self {
        Self {
            key: CacheKey::new(role, url),
            url: url.trim().to_string(),
            download: StageRecord::new(Stage::Download),
            parsing: StageRecord::new(Stage::Parsing),
            validation: StageRecord::new(Stage::Validation),
        }
    }

    pub fn role(&self) -> Option<SourceRole> {
        self.key.role()
    }

    pub fn state(&self, stage: Stage) -> StageState {
        match stage {
            Stage::Download => self.download.state(),
            Stage::Parsing => self.parsing.state(),
            Stage::Validation => self.validation.state(),
        }
    }

    /// Move `stage` to PROCESSING. Its predecessor must be SUCCESS.
    pub fn begin(&mut self, stage: Stage, now: Timestamp) -> Result<(), StoreError> {
        if let Some(predecessor) = stage.predecessor() {
            let state = self.state(predecessor);
            if state != StageState::Success {
                return Err(StoreError::PredecessorNotReady {
                    stage,
                    predecessor,
                    state,
                });
            }
        }
        match stage {
            Stage::Download => self.download.begin_processing(now),
            Stage::Parsing => self.parsing.begin_processing(now),
            Stage::Validation => self.validation.begin_processing(now),
        }
    }

    /// Force every in-flight stage to ERROR(timeout). Returns how many stages were affected.
    pub fn expire_in_flight(&mut self, now: Timestamp) -> usize {
        [
            self.download.expire_in_flight(now),
            self.parsing.expire_in_flight(now),
            self.validation.expire_in_flight(now),
        ]
        .into_iter()
        .filter(|expired| *expired)
        .count()
    }

    pub fn is_in_flight(&self) -> bool {
        Stage::ALL.iter().any(|s| {
            matches!(
                self.state(*s),
                StageState::Processing | StageState::RefreshNeeded
            )
        })
    }

    /// Parsed content usable by dependents: the current or last-known-good result.
    pub fn parsed(&self) -> Option<&ParsingResult> {
        self.parsing.result()
    }

    /// Whether the source currently contributes trust.
    pub fn is_validated(&self) -> bool {
        self.validation.is_success() && self.parsing.result().is_some()
    }

    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Corruption(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheErrorKind, CachedError};

    fn t(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    fn downloaded(record: &mut CacheRecord) {
        record.download.mark_refresh_needed(t(1)).unwrap();
        record.begin(Stage::Download, t(1)).unwrap();
        let digest = ContentDigest::new([9; 32]);
        record
            .download
            .succeed(
                DownloadResult {
                    digest,
                    size: 10,
                    downloaded_at: t(1),
                },
                digest,
                t(1),
            )
            .unwrap();
    }

    #[test]
    fn parsing_waits_for_download() {
        let mut record = CacheRecord::new(SourceRole::Tl, "https://tl.example/at.xml");
        record.parsing.mark_refresh_needed(t(1)).unwrap();
        let err = record.begin(Stage::Parsing, t(1)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::PredecessorNotReady {
                predecessor: Stage::Download,
                state: StageState::Empty,
                ..
            }
        ));
    }

    #[test]
    fn parsing_starts_after_download_success() {
        let mut record = CacheRecord::new(SourceRole::Tl, "https://tl.example/at.xml");
        downloaded(&mut record);
        record.parsing.mark_refresh_needed(t(2)).unwrap();
        record.begin(Stage::Parsing, t(2)).unwrap();
        assert_eq!(record.state(Stage::Parsing), StageState::Processing);
        assert!(record.is_in_flight());
    }

    #[test]
    fn download_error_does_not_touch_dependents() {
        let mut record = CacheRecord::new(SourceRole::Lotl, "https://lotl.example/eu.xml");
        downloaded(&mut record);
        record.parsing.mark_refresh_needed(t(2)).unwrap();
        record.begin(Stage::Parsing, t(2)).unwrap();
        record
            .parsing
            .succeed(ParsingResult::default(), ContentDigest::new([9; 32]), t(2))
            .unwrap();

        record.download.mark_refresh_needed(t(3)).unwrap();
        record.begin(Stage::Download, t(3)).unwrap();
        record
            .download
            .fail(CachedError::new(CacheErrorKind::TransientFetch, "timeout", t(3)))
            .unwrap();

        assert_eq!(record.state(Stage::Parsing), StageState::Success);
        assert!(record.parsed().is_some());
    }

    #[test]
    fn record_survives_encoding() {
        let mut record = CacheRecord::new(SourceRole::Tl, "https://tl.example/at.xml");
        downloaded(&mut record);
        let decoded = CacheRecord::decode(&record.encode().unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn expiry_counts_in_flight_stages() {
        let mut record = CacheRecord::new(SourceRole::Tl, "https://tl.example/at.xml");
        downloaded(&mut record);
        record.parsing.mark_refresh_needed(t(2)).unwrap();
        record.begin(Stage::Parsing, t(2)).unwrap();
        record.validation.mark_refresh_needed(t(2)).unwrap();
        assert_eq!(record.expire_in_flight(t(5)), 2);
        assert!(!record.is_in_flight());
    }
}
