//! Configured and derived trusted-list sources.

use std::fmt;
use std::sync::Arc;

use eutl_store::{CacheKey, SourceRole};
use eutl_types::{CommonCertificateSource, OtherTslPointer, TrustService, TrustServiceProvider};

use crate::TslError;

pub type TspPredicate = Arc<dyn Fn(&TrustServiceProvider) -> bool + Send + Sync>;
pub type ServicePredicate = Arc<dyn Fn(&TrustService) -> bool + Send + Sync>;

/// A root List of Trusted Lists.
#[derive(Clone)]
pub struct LotlSource {
    url: String,
    certificate_source: CommonCertificateSource,
    tsp_predicate: Option<TspPredicate>,
    service_predicate: Option<ServicePredicate>,
}

impl LotlSource {
    pub fn new(url: &str, certificate_source: CommonCertificateSource) -> Result<Self, TslError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(TslError::InvalidSource("LOTL url is empty".into()));
        }
        Ok(Self {
            url: url.to_string(),
            certificate_source,
            tsp_predicate: None,
            service_predicate: None,
        })
    }

    /// Restrict aggregation to providers accepted by `predicate`.
    pub fn with_tsp_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&TrustServiceProvider) -> bool + Send + Sync + 'static,
    {
        self.tsp_predicate = Some(Arc::new(predicate));
        self
    }

    /// Restrict aggregation to services accepted by `predicate`.
    pub fn with_service_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&TrustService) -> bool + Send + Sync + 'static,
    {
        self.service_predicate = Some(Arc::new(predicate));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn key(&self) -> CacheKey {
        CacheKey::new(SourceRole::Lotl, &self.url)
    }

    pub fn certificate_source(&self) -> &CommonCertificateSource {
        &self.certificate_source
    }

    /// Derive the child source for one of this LOTL's pointers.
    ///
    /// Predicates are shared with the parent, never replaced per pointer.
    pub fn child(&self, pointer: &OtherTslPointer) -> TlSource {
        TlSource {
            url: pointer.location.trim().to_string(),
            lotl_url: self.url.clone(),
            lotl_certificates: self.certificate_source.clone(),
            territory: pointer.territory.clone(),
            certificate_source: CommonCertificateSource::from_certificates(
                pointer.certificates.iter().cloned(),
            ),
            tsp_predicate: self.tsp_predicate.clone(),
            service_predicate: self.service_predicate.clone(),
        }
    }
}

impl fmt::Debug for LotlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LotlSource")
            .field("url", &self.url)
            .field("certificates", &self.certificate_source.len())
            .field("tsp_predicate", &self.tsp_predicate.is_some())
            .field("service_predicate", &self.service_predicate.is_some())
            .finish()
    }
}

/// A trusted list discovered through a LOTL pointer. Rebuilt every cycle.
#[derive(Clone)]
pub struct TlSource {
    url: String,
    lotl_url: String,
    lotl_certificates: CommonCertificateSource,
    territory: Option<String>,
    certificate_source: CommonCertificateSource,
    tsp_predicate: Option<TspPredicate>,
    service_predicate: Option<ServicePredicate>,
}

impl TlSource {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn lotl_url(&self) -> &str {
        &self.lotl_url
    }

    /// Cache key of the LOTL that declared this list.
    pub fn lotl_key(&self) -> CacheKey {
        CacheKey::new(SourceRole::Lotl, &self.lotl_url)
    }

    /// Certificates the parent LOTL is expected to be signed with.
    pub fn lotl_certificate_source(&self) -> &CommonCertificateSource {
        &self.lotl_certificates
    }

    pub fn territory(&self) -> Option<&str> {
        self.territory.as_deref()
    }

    pub fn key(&self) -> CacheKey {
        CacheKey::new(SourceRole::Tl, &self.url)
    }

    pub fn certificate_source(&self) -> &CommonCertificateSource {
        &self.certificate_source
    }

    pub fn accepts_provider(&self, provider: &TrustServiceProvider) -> bool {
        self.tsp_predicate.as_ref().map_or(true, |p| p(provider))
    }

    pub fn accepts_service(&self, service: &TrustService) -> bool {
        self.service_predicate.as_ref().map_or(true, |p| p(service))
    }

    /// Whether both sources share the very same predicate instances.
    pub fn shares_predicates_with(&self, lotl: &LotlSource) -> bool {
        fn same<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
        }
        same(&self.tsp_predicate, &lotl.tsp_predicate)
            && same(&self.service_predicate, &lotl.service_predicate)
    }
}

impl fmt::Debug for TlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlSource")
            .field("url", &self.url)
            .field("lotl_url", &self.lotl_url)
            .field("territory", &self.territory)
            .field("certificates", &self.certificate_source.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer(location: &str) -> OtherTslPointer {
        OtherTslPointer {
            location: location.to_string(),
            territory: Some("BE".into()),
            mime_type: None,
            certificates: Vec::new(),
        }
    }

    #[test]
    fn empty_url_is_rejected() {
        assert!(matches!(
            LotlSource::new("  ", CommonCertificateSource::new()),
            Err(TslError::InvalidSource(_))
        ));
    }

    #[test]
    fn child_inherits_predicates() {
        let lotl = LotlSource::new("https://lotl.example/eu.xml", CommonCertificateSource::new())
            .unwrap()
            .with_tsp_predicate(|p| p.name.starts_with('A'))
            .with_service_predicate(|s| s.status.is_active());
        let tl = lotl.child(&pointer(" https://tl.example/be.xml "));

        assert_eq!(tl.url(), "https://tl.example/be.xml");
        assert_eq!(tl.lotl_url(), "https://lotl.example/eu.xml");
        assert_eq!(tl.territory(), Some("BE"));
        assert!(tl.shares_predicates_with(&lotl));
    }

    #[test]
    fn no_predicate_accepts_everything() {
        let lotl =
            LotlSource::new("https://lotl.example/eu.xml", CommonCertificateSource::new()).unwrap();
        let tl = lotl.child(&pointer("https://tl.example/be.xml"));
        let provider = TrustServiceProvider {
            name: "Zeta".into(),
            trade_names: Vec::new(),
            territory: None,
            services: Vec::new(),
        };
        assert!(tl.accepts_provider(&provider));
    }
}
