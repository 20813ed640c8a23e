//! Prometheus metrics for trusted-list refresh.
//!
//! [`RefreshMetrics`] owns its own [`Registry`] so several orchestrators in
//! one process (or one test binary) never collide on metric names.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::TslError;

pub struct RefreshMetrics {
    pub registry: Registry,

    /// Completed refresh cycles, including timed-out ones.
    pub cycles: IntCounter,
    /// Stage failures, labelled by stage and error kind.
    pub source_failures: IntCounterVec,
    /// Certificates in the currently published trust snapshot.
    pub trusted_certificates: IntGauge,
    /// Wall-clock duration of each cycle in seconds.
    pub cycle_seconds: Histogram,
}

impl RefreshMetrics {
    pub fn new() -> Result<Self, TslError> {
        let registry = Registry::new();

        let cycles = register_int_counter_with_registry!(
            Opts::new("eutl_refresh_cycles_total", "Completed refresh cycles"),
            registry
        )?;

        let source_failures = register_int_counter_vec_with_registry!(
            Opts::new(
                "eutl_source_failures_total",
                "Stage failures recorded against trusted-list sources"
            ),
            &["stage", "kind"],
            registry
        )?;

        let trusted_certificates = register_int_gauge_with_registry!(
            Opts::new(
                "eutl_trusted_certificates",
                "Certificates in the published trust snapshot"
            ),
            registry
        )?;

        // 0.5 s .. ~17 min
        let cycle_seconds = register_histogram_with_registry!(
            HistogramOpts::new("eutl_refresh_cycle_seconds", "Refresh cycle duration")
                .buckets(prometheus::exponential_buckets(0.5, 2.0, 12)?),
            registry
        )?;

        Ok(Self {
            registry,
            cycles,
            source_failures,
            trusted_certificates,
            cycle_seconds,
        })
    }

    /// Text exposition of every metric in the registry.
    pub fn encode(&self) -> Result<String, TslError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
