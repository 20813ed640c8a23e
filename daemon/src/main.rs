//! eutl daemon: keeps a trust store built from EU trusted lists up to date.

mod config;
mod error;
mod http_loader;
mod json_decoder;
mod shutdown;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use eutl_store_lmdb::LmdbCachePersistence;
use eutl_tsl::{
    CycleSummary, LotlSource, RefreshMetrics, RefreshMode, RefreshOrchestrator, SourceProcessor,
    TlCache, TrustedListValidator, TrustedListsCertificateSource,
};
use eutl_types::{CertificateToken, Clock, CommonCertificateSource, SystemClock};
use eutl_utils::{format_duration, init_logging, LogFormat};

use crate::config::{DaemonConfig, LotlConfig};
use crate::error::DaemonError;
use crate::http_loader::HttpDataLoader;
use crate::json_decoder::JsonListDecoder;
use crate::shutdown::ShutdownController;

#[derive(Parser)]
#[command(name = "eutl-daemon", about = "EU trusted list synchronisation daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "EUTL_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the persisted cache.
    #[arg(long, env = "EUTL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Additional LOTL URL (signing certificates come from the config file).
    #[arg(long, env = "EUTL_LOTL_URL")]
    lotl_url: Vec<String>,

    /// Do not persist the cache between runs.
    #[arg(long, env = "EUTL_NO_PERSIST")]
    no_persist: bool,

    /// Log format: "human" or "json".
    #[arg(long, env = "EUTL_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "EUTL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Print Prometheus metrics on exit.
    #[arg(long, env = "EUTL_PRINT_METRICS")]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run one refresh cycle and print its summary as JSON.
    Refresh,
    /// Refresh periodically until interrupted.
    Run {
        /// Seconds between cycles (defaults to the configured interval).
        #[arg(long, env = "EUTL_REFRESH_INTERVAL")]
        interval: Option<u64>,
    },
}

impl Cli {
    /// File configuration (or defaults) with CLI flags applied on top.
    fn resolve_config(&self) -> Result<DaemonConfig, DaemonError> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_toml_file(path)?,
            None => DaemonConfig::default(),
        };
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if self.no_persist {
            config.persist_cache = false;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config.print_metrics |= self.metrics;
        config.lotls.extend(self.lotl_url.iter().map(|url| LotlConfig {
            url: url.clone(),
            signing_certificates: Vec::new(),
            service_types: Vec::new(),
            territories: Vec::new(),
        }));
        if let Command::Run {
            interval: Some(secs),
        } = self.command
        {
            config.refresh.refresh_interval_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }
}

fn load_certificate(path: &Path) -> Result<CertificateToken, DaemonError> {
    let failure = |reason: String| DaemonError::Certificate {
        path: path.display().to_string(),
        reason,
    };
    let bytes = std::fs::read(path).map_err(|e| failure(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| failure(e.to_string()))
}

fn lotl_source(config: &LotlConfig) -> Result<LotlSource, DaemonError> {
    let certificates = config
        .signing_certificates
        .iter()
        .map(|path| load_certificate(path))
        .collect::<Result<Vec<_>, _>>()?;
    let mut source = LotlSource::new(
        &config.url,
        CommonCertificateSource::from_certificates(certificates),
    )
    .map_err(|e| DaemonError::Config(e.to_string()))?;

    if !config.service_types.is_empty() {
        let types = config.service_types.clone();
        source = source.with_service_predicate(move |s| types.contains(&s.service_type));
    }
    if !config.territories.is_empty() {
        let territories = config.territories.clone();
        source = source.with_tsp_predicate(move |p| {
            p.territory
                .as_ref()
                .is_some_and(|t| territories.contains(t))
        });
    }
    Ok(source)
}

fn build_orchestrator(
    config: &DaemonConfig,
    metrics: Arc<RefreshMetrics>,
) -> anyhow::Result<RefreshOrchestrator> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let lotls = config
        .lotls
        .iter()
        .map(lotl_source)
        .collect::<Result<Vec<_>, _>>()?;
    if lotls.is_empty() {
        tracing::warn!("no LOTL configured; the trust store will stay empty");
    }

    let cache = if config.persist_cache {
        let dir = config.cache_dir();
        let persistence = LmdbCachePersistence::open(&dir)
            .with_context(|| format!("opening cache at {}", dir.display()))?;
        tracing::info!(path = %dir.display(), "using persisted cache");
        TlCache::with_persistence(Arc::new(persistence), clock.as_ref())
    } else {
        TlCache::new()
    };

    let loader = HttpDataLoader::new(Duration::from_secs(config.http_timeout_secs), clock.clone())?;
    let processor = SourceProcessor::new(
        Arc::new(cache),
        Arc::new(loader),
        Arc::new(JsonListDecoder),
        TrustedListValidator::new(config.refresh.tl_freshness_warning),
        clock,
    );
    let orchestrator = RefreshOrchestrator::new(
        lotls,
        processor,
        Arc::new(TrustedListsCertificateSource::new()),
        config.refresh.clone(),
    )?
    .with_metrics(metrics);
    Ok(orchestrator)
}

fn report(summary: &CycleSummary) {
    tracing::info!(
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        trusted_certificates = summary.trusted_certificates,
        "cycle finished in {}",
        format_duration(summary.duration)
    );
    for source in summary.sources.iter().filter(|s| s.has_error()) {
        tracing::warn!(
            url = %source.url,
            download = %source.download.state,
            parsing = %source.parsing.state,
            validation = %source.validation.state,
            "source not fully refreshed"
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    init_logging(config.log_format, &config.log_level)?;

    let metrics = Arc::new(RefreshMetrics::new()?);
    let orchestrator = build_orchestrator(&config, Arc::clone(&metrics))?;

    let shutdown = Arc::new(ShutdownController::new());
    let signals = Arc::clone(&shutdown);
    tokio::spawn(async move { signals.wait_for_signal().await });

    let mode = match cli.command {
        Command::Refresh => RefreshMode::OneShot,
        Command::Run { .. } => {
            tracing::info!(
                lotls = config.lotls.len(),
                "refreshing every {}",
                format_duration(config.refresh.refresh_interval())
            );
            RefreshMode::Periodic {
                interval: config.refresh.refresh_interval(),
            }
        }
    };

    let last = orchestrator.run(mode, shutdown.subscribe()).await;
    match (&cli.command, last) {
        (Command::Refresh, Some(summary)) => {
            report(&summary);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        (_, Some(summary)) => report(&summary),
        (_, None) => tracing::warn!("stopped before any cycle completed"),
    }

    if config.print_metrics {
        print!("{}", metrics.encode()?);
    }
    tracing::info!("eutl daemon exited cleanly");
    Ok(())
}
