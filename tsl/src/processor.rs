//! Three-stage pipeline for a single source.

use std::sync::Arc;

use eutl_crypto::content_digest;
use eutl_store::{CacheErrorKind, CachedError, DownloadResult, SourceRole, Stage, StagePlan};
use eutl_types::{Clock, CommonCertificateSource, ContentDigest};
use tracing::{debug, warn};

use crate::cache::CacheLease;
use crate::metrics::RefreshMetrics;
use crate::validator::{validation_input, TrustedListValidator};
use crate::{DataLoader, DocumentDecoder, TlCache, TslError};

/// One unit of refresh work.
#[derive(Clone, Debug)]
pub struct SourceJob {
    pub role: SourceRole,
    pub url: String,
    /// Certificates the document must be signed with.
    pub certificates: CommonCertificateSource,
}

/// Runs download, parsing and validation for one source while holding its
/// cache lease.
///
/// Stage failures are recorded in the source's record and never returned;
/// `Err` means the record refused a transition.
pub struct SourceProcessor {
    cache: Arc<TlCache>,
    loader: Arc<dyn DataLoader>,
    decoder: Arc<dyn DocumentDecoder>,
    validator: TrustedListValidator,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<RefreshMetrics>>,
}

impl SourceProcessor {
    pub fn new(
        cache: Arc<TlCache>,
        loader: Arc<dyn DataLoader>,
        decoder: Arc<dyn DocumentDecoder>,
        validator: TrustedListValidator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache,
            loader,
            decoder,
            validator,
            clock,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<RefreshMetrics>) -> Self {
        self.set_metrics(metrics);
        self
    }

    pub(crate) fn set_metrics(&mut self, metrics: Arc<RefreshMetrics>) {
        self.metrics = Some(metrics);
    }

    pub fn cache(&self) -> &Arc<TlCache> {
        &self.cache
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub async fn process(&self, job: &SourceJob) -> Result<(), TslError> {
        let mut lease = self.cache.lease(job.role, &job.url).await;
        // Holding the lease means no other writer is active; anything still
        // in flight was abandoned by an earlier cycle.
        lease.record_mut().expire_in_flight(self.clock.now());

        let Some((bytes, digest)) = self.download(&mut lease, job).await? else {
            return Ok(());
        };
        if !self.parse(&mut lease, job, bytes, digest).await? {
            return Ok(());
        }
        self.validate(&mut lease, job, digest)
    }

    async fn download(
        &self,
        lease: &mut CacheLease<'_>,
        job: &SourceJob,
    ) -> Result<Option<(Vec<u8>, ContentDigest)>, TslError> {
        let now = self.clock.now();
        let record = lease.record_mut();
        record.download.mark_refresh_needed(now)?;
        record.begin(Stage::Download, now)?;
        lease.commit();

        match self.loader.get(&job.url).await {
            Ok(document) => {
                let digest = content_digest(&document.bytes);
                let result = DownloadResult {
                    digest,
                    size: document.bytes.len() as u64,
                    downloaded_at: document.fetched_at,
                };
                lease
                    .record_mut()
                    .download
                    .succeed(result, digest, self.clock.now())?;
                lease.commit();
                debug!(url = %job.url, digest = %digest, size = document.bytes.len(), "downloaded");
                Ok(Some((document.bytes, digest)))
            }
            Err(e) => {
                self.fail(lease, Stage::Download, CacheErrorKind::TransientFetch, e.to_string())?;
                Ok(None)
            }
        }
    }

    async fn parse(
        &self,
        lease: &mut CacheLease<'_>,
        job: &SourceJob,
        bytes: Vec<u8>,
        digest: ContentDigest,
    ) -> Result<bool, TslError> {
        let now = self.clock.now();
        if lease.record_mut().parsing.plan(&digest, now)? == StagePlan::Reuse {
            debug!(url = %job.url, "content unchanged; reusing parsed result");
            return Ok(true);
        }
        lease.record_mut().begin(Stage::Parsing, now)?;
        lease.commit();

        let decoder = Arc::clone(&self.decoder);
        let role = job.role;
        let decoded = tokio::task::spawn_blocking(move || decoder.decode(role, &bytes)).await;

        match decoded {
            Ok(Ok(parsed)) => {
                lease
                    .record_mut()
                    .parsing
                    .succeed(parsed, digest, self.clock.now())?;
                lease.commit();
                Ok(true)
            }
            Ok(Err(e)) => {
                self.fail(lease, Stage::Parsing, CacheErrorKind::Integrity, e.to_string())?;
                Ok(false)
            }
            Err(e) => {
                self.fail(
                    lease,
                    Stage::Parsing,
                    CacheErrorKind::Integrity,
                    format!("decoder aborted: {e}"),
                )?;
                Ok(false)
            }
        }
    }

    fn validate(
        &self,
        lease: &mut CacheLease<'_>,
        job: &SourceJob,
        digest: ContentDigest,
    ) -> Result<(), TslError> {
        let now = self.clock.now();
        let input = validation_input(&digest, &job.certificates);
        if lease.record_mut().validation.plan(&input, now)? == StagePlan::Reuse {
            debug!(url = %job.url, "content and signers unchanged; reusing validation");
            return Ok(());
        }
        lease.record_mut().begin(Stage::Validation, now)?;
        lease.commit();

        let outcome = match lease.record().parsing.result() {
            Some(parsed) => self
                .validator
                .validate(&job.url, parsed, &job.certificates, now),
            None => Err(TslError::InvalidSource("no parsed content to validate".into())),
        };
        match outcome {
            Ok(result) => {
                lease.record_mut().validation.succeed(result, input, now)?;
                lease.commit();
                Ok(())
            }
            Err(e) => self.fail(lease, Stage::Validation, CacheErrorKind::Integrity, e.to_string()),
        }
    }

    fn fail(
        &self,
        lease: &mut CacheLease<'_>,
        stage: Stage,
        kind: CacheErrorKind,
        message: String,
    ) -> Result<(), TslError> {
        warn!(key = %lease.record().key, %stage, kind = kind.as_str(), error = %message, "stage failed");
        let error = CachedError::new(kind, message, self.clock.now());
        let record = lease.record_mut();
        match stage {
            Stage::Download => record.download.fail(error)?,
            Stage::Parsing => record.parsing.fail(error)?,
            Stage::Validation => record.validation.fail(error)?,
        }
        lease.commit();
        if let Some(metrics) = &self.metrics {
            metrics
                .source_failures
                .with_label_values(&[stage.as_str(), kind.as_str()])
                .inc();
        }
        Ok(())
    }
}
