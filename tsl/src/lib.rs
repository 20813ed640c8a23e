//! Trusted-list acquisition and trust store aggregation.
//!
//! The refresh pipeline, leaves first:
//!
//! - [`TlCache`] holds one [`eutl_store::CacheRecord`] per source and admits a
//!   single writer per key.
//! - [`SourceProcessor`] drives one source through download, parsing and
//!   validation, using the [`DataLoader`] and [`DocumentDecoder`] collaborators.
//! - [`TlSourceBuilder`] derives child [`TlSource`]s from cached LOTL parses.
//! - [`TrustedListsCertificateSource`] publishes the merged trust store.
//! - [`RefreshOrchestrator`] sequences all of the above per cycle.

pub mod aggregator;
pub mod builder;
pub mod cache;
pub mod config;
pub mod decoder;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod orchestrator;
pub mod processor;
pub mod source;
pub mod summary;
pub mod validator;

pub use aggregator::{
    TrustProperties, TrustSnapshot, TrustSnapshotBuilder, TrustedCertificate,
    TrustedListsCertificateSource,
};
pub use builder::TlSourceBuilder;
pub use cache::{CacheLease, CacheSnapshot, TlCache};
pub use config::RefreshConfig;
pub use decoder::DocumentDecoder;
pub use error::{DecodeError, FetchError, TslError};
pub use loader::{DataLoader, FetchedDocument};
pub use metrics::RefreshMetrics;
pub use orchestrator::{RefreshMode, RefreshOrchestrator};
pub use processor::{SourceJob, SourceProcessor};
pub use source::{LotlSource, ServicePredicate, TlSource, TspPredicate};
pub use summary::{CycleSummary, SourceSummary, StageSummary};
pub use validator::{validation_input, TrustedListValidator};
