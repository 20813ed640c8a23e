//! Refresh cycles over every configured LOTL and the trusted lists it points to.
//!
//! A cycle runs in phases:
//! 1. every LOTL through download, parsing and validation;
//! 2. [`TlSourceBuilder`] derives child sources from the LOTL parses now cached;
//! 3. every child TL through the same three stages;
//! 4. the trust store is rebuilt and published.
//!
//! Sources within a phase run concurrently on a bounded pool. The whole cycle
//! shares one deadline; work still running when it passes is abandoned and
//! the affected records are expired to ERROR(timeout).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eutl_store::SourceRole;
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::aggregator::{validated_content, validated_providers};
use crate::metrics::RefreshMetrics;
use crate::processor::{SourceJob, SourceProcessor};
use crate::summary::{CycleSummary, SourceSummary};
use crate::{
    LotlSource, RefreshConfig, TlCache, TlSource, TlSourceBuilder, TrustedListsCertificateSource,
    TslError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshMode {
    OneShot,
    Periodic { interval: Duration },
}

pub struct RefreshOrchestrator {
    lotl_sources: Vec<LotlSource>,
    processor: Arc<SourceProcessor>,
    trust_store: Arc<TrustedListsCertificateSource>,
    config: RefreshConfig,
    workers: Arc<Semaphore>,
    metrics: Option<Arc<RefreshMetrics>>,
}

impl RefreshOrchestrator {
    pub fn new(
        lotl_sources: Vec<LotlSource>,
        processor: SourceProcessor,
        trust_store: Arc<TrustedListsCertificateSource>,
        config: RefreshConfig,
    ) -> Result<Self, TslError> {
        config.validate()?;
        Ok(Self {
            lotl_sources,
            processor: Arc::new(processor),
            trust_store,
            workers: Arc::new(Semaphore::new(config.max_workers)),
            config,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<RefreshMetrics>) -> Self {
        if let Some(processor) = Arc::get_mut(&mut self.processor) {
            processor.set_metrics(Arc::clone(&metrics));
        }
        self.metrics = Some(metrics);
        self
    }

    pub fn cache(&self) -> &Arc<TlCache> {
        self.processor.cache()
    }

    pub fn trust_store(&self) -> &Arc<TrustedListsCertificateSource> {
        &self.trust_store
    }

    pub fn lotl_sources(&self) -> &[LotlSource] {
        &self.lotl_sources
    }

    /// Run one full cycle and report the state of every scheduled source.
    pub async fn run_cycle(&self) -> CycleSummary {
        let clock = Arc::clone(self.processor.clock());
        let started = Instant::now();
        let started_at = clock.now();
        let deadline = tokio::time::Instant::now() + self.config.cycle_timeout();
        info!(lotls = self.lotl_sources.len(), "starting refresh cycle");

        for lotl in &self.lotl_sources {
            self.cache().register(SourceRole::Lotl, lotl.url());
        }
        let lotl_jobs: Vec<SourceJob> = self.lotl_sources.iter().map(lotl_job).collect();
        let mut timed_out = !self.run_phase(&lotl_jobs, deadline).await;

        let tl_sources = unique_by_key(
            TlSourceBuilder::new(&self.lotl_sources, &self.cache().snapshot()).build(),
        );
        for tl in &tl_sources {
            self.cache().register(SourceRole::Tl, tl.url());
        }
        if !timed_out {
            let tl_jobs: Vec<SourceJob> = tl_sources.iter().map(tl_job).collect();
            timed_out = !self.run_phase(&tl_jobs, deadline).await;
        } else {
            warn!(tls = tl_sources.len(), "cycle deadline reached before trusted lists were refreshed");
        }

        let snapshot = self.cache().snapshot();
        let finished_at = clock.now();
        let trusted_certificates = self.trust_store.rebuild(&tl_sources, &snapshot, finished_at);

        let mut sources = Vec::with_capacity(self.lotl_sources.len() + tl_sources.len());
        for lotl in &self.lotl_sources {
            if let Some(record) = snapshot.get(&lotl.key()) {
                let contributed =
                    validated_content(&lotl.key(), lotl.certificate_source(), &snapshot).is_some();
                sources.push(SourceSummary::new(SourceRole::Lotl, record, contributed));
            }
        }
        for tl in &tl_sources {
            if let Some(record) = snapshot.get(&tl.key()) {
                let contributed = validated_providers(tl, &snapshot).is_some();
                sources.push(SourceSummary::new(SourceRole::Tl, record, contributed));
            }
        }
        self.cache().cleanup().await;

        let summary = CycleSummary {
            started_at,
            finished_at,
            duration: started.elapsed(),
            timed_out,
            sources,
            trusted_certificates,
        };
        if let Some(metrics) = &self.metrics {
            metrics.cycles.inc();
            metrics
                .trusted_certificates
                .set(i64::try_from(trusted_certificates).unwrap_or(i64::MAX));
            metrics.cycle_seconds.observe(summary.duration.as_secs_f64());
        }
        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            trusted_certificates,
            timed_out,
            elapsed_ms = summary.duration.as_millis() as u64,
            "refresh cycle complete"
        );
        summary
    }

    /// Run according to `mode` until it completes or `shutdown` fires.
    ///
    /// Returns the summary of the last completed cycle.
    pub async fn run(
        &self,
        mode: RefreshMode,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Option<CycleSummary> {
        let mut last = None;
        loop {
            tokio::select! {
                summary = self.run_cycle() => last = Some(summary),
                _ = shutdown.recv() => {
                    let expired = self.cache().expire_all_in_flight(self.processor.clock().now()).await;
                    info!(expired, "refresh cancelled by shutdown");
                    return last;
                }
            }
            let RefreshMode::Periodic { interval } = mode else {
                return last;
            };
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.recv() => {
                    info!("refresh loop stopped");
                    return last;
                }
            }
        }
    }

    /// Process `jobs` on the worker pool. Returns `false` if the deadline passed first.
    async fn run_phase(&self, jobs: &[SourceJob], deadline: tokio::time::Instant) -> bool {
        let mut set = JoinSet::new();
        for job in jobs.iter().cloned() {
            let processor = Arc::clone(&self.processor);
            let workers = Arc::clone(&self.workers);
            set.spawn(async move {
                let Ok(_permit) = workers.acquire_owned().await else {
                    return;
                };
                if let Err(e) = processor.process(&job).await {
                    error!(url = %job.url, error = %e, "source processing aborted");
                }
            });
        }

        let drained = tokio::time::timeout_at(deadline, async {
            while let Some(joined) = set.join_next().await {
                if let Err(e) = joined {
                    error!(error = %e, "source task failed");
                }
            }
        })
        .await;
        if drained.is_ok() {
            return true;
        }

        set.shutdown().await;
        let now = self.processor.clock().now();
        let mut expired = 0;
        for job in jobs {
            expired += self.cache().expire_in_flight(job.role, &job.url, now).await;
        }
        warn!(sources = jobs.len(), expired, "refresh phase timed out");
        false
    }
}

fn lotl_job(lotl: &LotlSource) -> SourceJob {
    SourceJob {
        role: SourceRole::Lotl,
        url: lotl.url().to_string(),
        certificates: lotl.certificate_source().clone(),
    }
}

fn tl_job(tl: &TlSource) -> SourceJob {
    SourceJob {
        role: SourceRole::Tl,
        url: tl.url().to_string(),
        certificates: tl.certificate_source().clone(),
    }
}

/// First occurrence wins when several pointers name the same list.
fn unique_by_key(sources: Vec<TlSource>) -> Vec<TlSource> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|s| seen.insert(s.key()))
        .collect()
}
