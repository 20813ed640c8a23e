//! Per-cycle report.

use std::time::Duration;

use eutl_store::{CacheKey, CacheRecord, CachedError, SourceRole, Stage, StageRecord, StageState};
use eutl_types::Timestamp;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageSummary {
    pub state: StageState,
    pub error: Option<CachedError>,
}

impl<T> From<&StageRecord<T>> for StageSummary {
    fn from(record: &StageRecord<T>) -> Self {
        Self {
            state: record.state(),
            error: record.error().cloned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceSummary {
    pub key: CacheKey,
    pub url: String,
    pub role: SourceRole,
    pub download: StageSummary,
    pub parsing: StageSummary,
    pub validation: StageSummary,
    /// LOTL: its pointers were used this cycle. TL: its certificates were published.
    pub contributed: bool,
}

impl SourceSummary {
    pub fn new(role: SourceRole, record: &CacheRecord, contributed: bool) -> Self {
        Self {
            key: record.key.clone(),
            url: record.url.clone(),
            role,
            download: (&record.download).into(),
            parsing: (&record.parsing).into(),
            validation: (&record.validation).into(),
            contributed,
        }
    }

    pub fn stage(&self, stage: Stage) -> &StageSummary {
        match stage {
            Stage::Download => &self.download,
            Stage::Parsing => &self.parsing,
            Stage::Validation => &self.validation,
        }
    }

    pub fn is_success(&self) -> bool {
        Stage::ALL
            .iter()
            .all(|s| self.stage(*s).state == StageState::Success)
    }

    pub fn has_error(&self) -> bool {
        Stage::ALL
            .iter()
            .any(|s| self.stage(*s).state == StageState::Error)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CycleSummary {
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub duration: Duration,
    pub timed_out: bool,
    /// LOTLs in configured order, then TLs in builder order.
    pub sources: Vec<SourceSummary>,
    pub trusted_certificates: usize,
}

impl CycleSummary {
    pub fn succeeded(&self) -> usize {
        self.sources.iter().filter(|s| s.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.sources.iter().filter(|s| s.has_error()).count()
    }

    pub fn source(&self, key: &CacheKey) -> Option<&SourceSummary> {
        self.sources.iter().find(|s| &s.key == key)
    }
}
