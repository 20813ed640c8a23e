//! Per-stage refresh state machine.
//!
//! ```text
//!   EMPTY ──┐
//!  SUCCESS ─┼─► REFRESH_NEEDED ──► PROCESSING ──► SUCCESS
//!   ERROR ──┘         │                  └──────► ERROR
//!                     └────────────(timeout)────► ERROR
//! ```
//!
//! A stage whose input digest matches the digest of its last success is not
//! re-run: [`StageRecord::plan`] returns [`StagePlan::Reuse`] and the record
//! stays SUCCESS. Integrity failures clear the stored result; transient and
//! timeout failures keep it as last-known-good.

use eutl_types::{ContentDigest, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::StoreError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Download,
    Parsing,
    Validation,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Download, Stage::Parsing, Stage::Validation];

    /// The stage whose success gates this one.
    pub fn predecessor(&self) -> Option<Stage> {
        match self {
            Self::Download => None,
            Self::Parsing => Some(Self::Download),
            Self::Validation => Some(Self::Parsing),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Parsing => "parsing",
            Self::Validation => "validation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageState {
    Empty,
    RefreshNeeded,
    Processing,
    Success,
    Error,
}

impl StageState {
    /// SUCCESS or ERROR.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::RefreshNeeded => "REFRESH_NEEDED",
            Self::Processing => "PROCESSING",
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure classes recorded against a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheErrorKind {
    /// Retryable network condition.
    TransientFetch,
    /// Malformed content or a missing/invalid mandatory signature.
    Integrity,
    /// The refresh cycle ended while the stage was still in flight.
    Timeout,
}

impl CacheErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransientFetch => "transient_fetch",
            Self::Integrity => "integrity",
            Self::Timeout => "timeout",
        }
    }

    /// Whether this failure discards the previously stored result.
    pub fn clears_result(&self) -> bool {
        matches!(self, Self::Integrity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedError {
    pub kind: CacheErrorKind,
    pub message: String,
    pub occurred_at: Timestamp,
}

impl CachedError {
    pub fn new(kind: CacheErrorKind, message: impl Into<String>, occurred_at: Timestamp) -> Self {
        Self {
            kind,
            message: message.into(),
            occurred_at,
        }
    }
}

impl fmt::Display for CachedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// What the processor should do with a stage once its input is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StagePlan {
    /// Input unchanged since the last success; keep the stored result.
    Reuse,
    /// Input changed or no prior success; the stage is now REFRESH_NEEDED.
    Process,
}

/// State, bookkeeping and last result of one stage of one source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageRecord<T> {
    stage: Stage,
    state: StageState,
    result: Option<T>,
    error: Option<CachedError>,
    input_digest: Option<ContentDigest>,
    last_success: Option<Timestamp>,
    last_state_change: Option<Timestamp>,
}

impl<T> StageRecord<T> {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            state: StageState::Empty,
            result: None,
            error: None,
            input_digest: None,
            last_success: None,
            last_state_change: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    /// Last successful result, including one retained after a non-integrity failure.
    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// The result dependents may rely on: the current SUCCESS, or the
    /// last-known-good kept through a transient or timeout failure.
    pub fn last_known_good(&self) -> Option<&T> {
        match self.state {
            StageState::Success => self.result.as_ref(),
            StageState::Error => self
                .error
                .as_ref()
                .filter(|e| !e.kind.clears_result())
                .and(self.result.as_ref()),
            _ => None,
        }
    }

    pub fn is_result_exist(&self) -> bool {
        self.result.is_some()
    }

    pub fn error(&self) -> Option<&CachedError> {
        self.error.as_ref()
    }

    pub fn input_digest(&self) -> Option<ContentDigest> {
        self.input_digest
    }

    pub fn last_success(&self) -> Option<Timestamp> {
        self.last_success
    }

    pub fn last_state_change(&self) -> Option<Timestamp> {
        self.last_state_change
    }

    pub fn is_success(&self) -> bool {
        self.state == StageState::Success
    }

    /// Whether `digest` is the input of the current successful result.
    pub fn is_up_to_date(&self, digest: &ContentDigest) -> bool {
        self.state == StageState::Success
            && self.result.is_some()
            && self.input_digest.as_ref() == Some(digest)
    }

    /// Decide whether the stage needs to run for `input`, marking it
    /// REFRESH_NEEDED when it does.
    pub fn plan(&mut self, input: &ContentDigest, now: Timestamp) -> Result<StagePlan, StoreError> {
        if self.is_up_to_date(input) {
            return Ok(StagePlan::Reuse);
        }
        self.mark_refresh_needed(now)?;
        Ok(StagePlan::Process)
    }

    pub fn mark_refresh_needed(&mut self, now: Timestamp) -> Result<(), StoreError> {
        if self.state == StageState::Processing {
            return Err(self.illegal("mark refresh needed"));
        }
        self.transition(StageState::RefreshNeeded, now);
        Ok(())
    }

    pub fn begin_processing(&mut self, now: Timestamp) -> Result<(), StoreError> {
        if self.state != StageState::RefreshNeeded {
            return Err(self.illegal("begin processing"));
        }
        self.transition(StageState::Processing, now);
        Ok(())
    }

    pub fn succeed(
        &mut self,
        result: T,
        input_digest: ContentDigest,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        if self.state != StageState::Processing {
            return Err(self.illegal("succeed"));
        }
        self.result = Some(result);
        self.input_digest = Some(input_digest);
        self.error = None;
        self.last_success = Some(now);
        self.transition(StageState::Success, now);
        Ok(())
    }

    pub fn fail(&mut self, error: CachedError) -> Result<(), StoreError> {
        if !matches!(
            self.state,
            StageState::Processing | StageState::RefreshNeeded
        ) {
            return Err(self.illegal("fail"));
        }
        if error.kind.clears_result() {
            self.result = None;
            self.input_digest = None;
        }
        let now = error.occurred_at;
        self.error = Some(error);
        self.transition(StageState::Error, now);
        Ok(())
    }

    /// Force an in-flight stage to ERROR(timeout), keeping its last-known-good result.
    ///
    /// Returns `true` when the stage was in flight.
    pub fn expire_in_flight(&mut self, now: Timestamp) -> bool {
        if !matches!(
            self.state,
            StageState::Processing | StageState::RefreshNeeded
        ) {
            return false;
        }
        self.error = Some(CachedError::new(
            CacheErrorKind::Timeout,
            "refresh cycle timed out",
            now,
        ));
        self.transition(StageState::Error, now);
        true
    }

    fn transition(&mut self, to: StageState, now: Timestamp) {
        self.state = to;
        self.last_state_change = Some(now);
    }

    fn illegal(&self, action: &'static str) -> StoreError {
        StoreError::IllegalTransition {
            stage: self.stage,
            from: self.state,
            action,
        }
    }
}
