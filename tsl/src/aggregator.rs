//! Trust store built from every validated trusted list.
//!
//! The published [`TrustSnapshot`] is immutable. A rebuild assembles a new
//! snapshot off to the side and swaps it in with a single pointer store, so
//! readers see either the old store or the new one.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use eutl_store::CacheKey;
use eutl_types::{
    CertificateToken, CommonCertificateSource, Fingerprint, ParsingResult, ServiceStatus,
    Timestamp, TrustService, TrustServiceProvider,
};
use serde::Serialize;

use crate::cache::CacheSnapshot;
use crate::validator::validation_input;
use crate::TlSource;

/// One trusted list's assertion about a certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrustProperties {
    pub tl_url: String,
    pub lotl_url: String,
    pub territory: Option<String>,
    pub provider: String,
    pub service_name: String,
    pub service_type: String,
    pub status: ServiceStatus,
    pub status_starting_time: Timestamp,
}

#[derive(Clone, Debug)]
pub struct TrustedCertificate {
    pub certificate: CertificateToken,
    /// Every assertion made about this certificate, in source order.
    pub properties: Vec<TrustProperties>,
}

#[derive(Clone, Debug, Default)]
pub struct TrustSnapshot {
    entries: HashMap<Fingerprint, TrustedCertificate>,
    lists: Vec<String>,
    built_at: Option<Timestamp>,
}

impl TrustSnapshot {
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&TrustedCertificate> {
        self.entries.get(fingerprint)
    }

    pub fn trust_properties(&self, fingerprint: &Fingerprint) -> &[TrustProperties] {
        self.entries
            .get(fingerprint)
            .map(|e| e.properties.as_slice())
            .unwrap_or(&[])
    }

    /// Trusted when at least one list asserts an active service status.
    pub fn is_trusted(&self, fingerprint: &Fingerprint) -> bool {
        self.trust_properties(fingerprint)
            .iter()
            .any(|p| p.status.is_active())
    }

    pub fn certificates(&self) -> impl Iterator<Item = &CertificateToken> {
        self.entries.values().map(|e| &e.certificate)
    }

    pub fn number_of_certificates(&self) -> usize {
        self.entries.len()
    }

    /// URLs of the lists that contributed, in merge order.
    pub fn lists(&self) -> &[String] {
        &self.lists
    }

    pub fn built_at(&self) -> Option<Timestamp> {
        self.built_at
    }
}

/// Accumulates trusted lists into a new [`TrustSnapshot`].
#[derive(Default)]
pub struct TrustSnapshotBuilder {
    snapshot: TrustSnapshot,
}

impl TrustSnapshotBuilder {
    pub fn new(now: Timestamp) -> Self {
        Self {
            snapshot: TrustSnapshot {
                built_at: Some(now),
                ..Default::default()
            },
        }
    }

    /// Merge the providers of one validated list, applying its predicates.
    pub fn add_list(&mut self, source: &TlSource, providers: &[TrustServiceProvider]) {
        for provider in providers.iter().filter(|p| source.accepts_provider(p)) {
            for service in provider.services.iter().filter(|s| source.accepts_service(s)) {
                self.add_service(source, provider, service);
            }
        }
        self.snapshot.lists.push(source.url().to_string());
    }

    fn add_service(
        &mut self,
        source: &TlSource,
        provider: &TrustServiceProvider,
        service: &TrustService,
    ) {
        for certificate in &service.certificates {
            let properties = TrustProperties {
                tl_url: source.url().to_string(),
                lotl_url: source.lotl_url().to_string(),
                territory: source.territory().map(str::to_string),
                provider: provider.name.clone(),
                service_name: service.name.clone(),
                service_type: service.service_type.clone(),
                status: service.status.clone(),
                status_starting_time: service.status_starting_time,
            };
            let entry = self
                .snapshot
                .entries
                .entry(certificate.fingerprint())
                .or_insert_with(|| TrustedCertificate {
                    certificate: certificate.clone(),
                    properties: Vec::new(),
                });
            if !entry.properties.contains(&properties) {
                entry.properties.push(properties);
            }
        }
    }

    pub fn build(self) -> TrustSnapshot {
        self.snapshot
    }
}

/// Queryable trust store shared by validators.
pub struct TrustedListsCertificateSource {
    current: RwLock<Arc<TrustSnapshot>>,
}

impl TrustedListsCertificateSource {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(TrustSnapshot::default())),
        }
    }

    /// The currently published snapshot. Holding it never blocks a rebuild.
    pub fn snapshot(&self) -> Arc<TrustSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn publish(&self, snapshot: TrustSnapshot) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
    }

    /// Rebuild from every `sources` entry whose cached content is validated,
    /// then publish. Returns the number of certificates now trusted.
    pub fn rebuild(&self, sources: &[TlSource], cache: &CacheSnapshot, now: Timestamp) -> usize {
        let mut builder = TrustSnapshotBuilder::new(now);
        for source in sources {
            if let Some(providers) = validated_providers(source, cache) {
                builder.add_list(source, providers);
            }
        }
        let snapshot = builder.build();
        let count = snapshot.number_of_certificates();
        self.publish(snapshot);
        count
    }

    pub fn is_trusted(&self, certificate: &CertificateToken) -> bool {
        self.snapshot().is_trusted(&certificate.fingerprint())
    }

    pub fn trust_properties(&self, fingerprint: &Fingerprint) -> Vec<TrustProperties> {
        self.snapshot().trust_properties(fingerprint).to_vec()
    }

    pub fn number_of_certificates(&self) -> usize {
        self.snapshot().number_of_certificates()
    }
}

impl Default for TrustedListsCertificateSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Providers of `source` when its parsed content is exactly the content that
/// passed validation against the source's declared signers, and the LOTL
/// that declared those signers is itself validated.
pub fn validated_providers<'a>(
    source: &TlSource,
    cache: &'a CacheSnapshot,
) -> Option<&'a [TrustServiceProvider]> {
    validated_content(&source.lotl_key(), source.lotl_certificate_source(), cache)?;
    validated_content(&source.key(), source.certificate_source(), cache)
        .map(|parsed| parsed.providers.as_slice())
}

/// Parsed content of `key` when its validation succeeded over exactly that
/// content and `certificates`.
pub fn validated_content<'a>(
    key: &CacheKey,
    certificates: &CommonCertificateSource,
    cache: &'a CacheSnapshot,
) -> Option<&'a ParsingResult> {
    let record = cache.get(key)?;
    let validation = record.validation.last_known_good()?;
    let parsed = record.parsing.last_known_good()?;
    if !validation.is_valid() {
        return None;
    }
    let content = record.parsing.input_digest()?;
    let expected = validation_input(&content, certificates);
    (record.validation.input_digest() == Some(expected)).then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LotlSource;
    use eutl_types::{OtherTslPointer, PublicKey, Signature, TbsCertificate};

    fn certificate(serial: u64) -> CertificateToken {
        let tbs = TbsCertificate {
            serial_number: serial,
            subject: format!("CN=CA {serial}"),
            issuer: format!("CN=CA {serial}"),
            public_key: PublicKey([serial as u8; 32]),
            not_before: Timestamp::new(0),
            not_after: Timestamp::new(1_000_000),
            ca: true,
        };
        CertificateToken::from_parts(tbs, Signature([0; 64])).unwrap()
    }

    fn tl(url: &str) -> TlSource {
        LotlSource::new("https://lotl.example/eu.xml", CommonCertificateSource::new())
            .unwrap()
            .child(&OtherTslPointer {
                location: url.to_string(),
                territory: None,
                mime_type: None,
                certificates: Vec::new(),
            })
    }

    fn provider(name: &str, service_type: &str, cert: &CertificateToken) -> TrustServiceProvider {
        TrustServiceProvider {
            name: name.to_string(),
            trade_names: Vec::new(),
            territory: None,
            services: vec![TrustService {
                name: format!("{name} service"),
                service_type: service_type.to_string(),
                status: ServiceStatus::Granted,
                status_starting_time: Timestamp::new(1),
                certificates: vec![cert.clone()],
                qualifiers: Vec::new(),
            }],
        }
    }

    #[test]
    fn conflicting_assertions_are_both_kept() {
        let cert = certificate(1);
        let mut builder = TrustSnapshotBuilder::new(Timestamp::new(5));
        builder.add_list(&tl("https://tl.example/be"), &[provider("A", "CA/QC", &cert)]);
        builder.add_list(&tl("https://tl.example/fr"), &[provider("B", "TSA/QTST", &cert)]);
        let snapshot = builder.build();

        let props = snapshot.trust_properties(&cert.fingerprint());
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].service_type, "CA/QC");
        assert_eq!(props[1].service_type, "TSA/QTST");
        assert_eq!(snapshot.number_of_certificates(), 1);
    }

    #[test]
    fn withdrawn_only_is_not_trusted() {
        let cert = certificate(2);
        let mut p = provider("A", "CA/QC", &cert);
        p.services[0].status = ServiceStatus::Withdrawn;
        let mut builder = TrustSnapshotBuilder::new(Timestamp::new(5));
        builder.add_list(&tl("https://tl.example/be"), &[p]);
        let snapshot = builder.build();
        assert_eq!(snapshot.trust_properties(&cert.fingerprint()).len(), 1);
        assert!(!snapshot.is_trusted(&cert.fingerprint()));
    }

    #[test]
    fn predicates_filter_providers() {
        let keep = certificate(3);
        let drop = certificate(4);
        let source = LotlSource::new("https://lotl.example/eu.xml", CommonCertificateSource::new())
            .unwrap()
            .with_tsp_predicate(|p| p.name == "Keep")
            .child(&OtherTslPointer {
                location: "https://tl.example/be".into(),
                territory: None,
                mime_type: None,
                certificates: Vec::new(),
            });
        let mut builder = TrustSnapshotBuilder::new(Timestamp::new(5));
        builder.add_list(
            &source,
            &[provider("Keep", "CA/QC", &keep), provider("Drop", "CA/QC", &drop)],
        );
        let snapshot = builder.build();
        assert!(snapshot.is_trusted(&keep.fingerprint()));
        assert!(snapshot.get(&drop.fingerprint()).is_none());
    }

    #[test]
    fn held_snapshot_survives_publish() {
        let cert = certificate(5);
        let store = TrustedListsCertificateSource::new();
        let mut builder = TrustSnapshotBuilder::new(Timestamp::new(5));
        builder.add_list(&tl("https://tl.example/be"), &[provider("A", "CA/QC", &cert)]);
        store.publish(builder.build());

        let held = store.snapshot();
        store.publish(TrustSnapshot::default());
        assert!(held.is_trusted(&cert.fingerprint()));
        assert!(!store.is_trusted(&cert));
    }

    #[test]
    fn rebuild_ignores_unvalidated_sources() {
        let store = TrustedListsCertificateSource::new();
        let count = store.rebuild(&[tl("https://tl.example/be")], &CacheSnapshot::new(), Timestamp::new(5));
        assert_eq!(count, 0);
        assert_eq!(store.snapshot().built_at(), Some(Timestamp::new(5)));
    }
}
