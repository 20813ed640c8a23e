//! First-match revocation verifier chain.

use std::sync::Arc;

use eutl_types::{CertificateToken, Clock, Fingerprint};
use tracing::debug;

use crate::{
    RevocationError, RevocationKind, RevocationPolicy, RevocationSource, RevocationToken,
    SourceVerifier,
};

/// Result of a revocation check. `Unknown` is an answer, not an error.
#[derive(Clone, Debug)]
pub enum RevocationOutcome {
    Token(RevocationToken),
    Unknown,
}

impl RevocationOutcome {
    pub fn token(&self) -> Option<&RevocationToken> {
        match self {
            Self::Token(token) => Some(token),
            Self::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn is_revoked(&self) -> bool {
        self.token().is_some_and(RevocationToken::is_revoked)
    }
}

/// Queries sources in policy order and returns the first accepted token.
pub struct RevocationVerifierChain {
    verifiers: Vec<SourceVerifier>,
    policy: RevocationPolicy,
    clock: Arc<dyn Clock>,
}

impl RevocationVerifierChain {
    pub fn new(policy: RevocationPolicy, clock: Arc<dyn Clock>) -> Result<Self, RevocationError> {
        policy.validate()?;
        Ok(Self {
            verifiers: Vec::new(),
            policy,
            clock,
        })
    }

    /// Register a source. Sources of the same kind are consulted in registration order.
    pub fn with_source(mut self, name: &str, source: Arc<dyn RevocationSource>) -> Self {
        self.verifiers.push(SourceVerifier::new(name, source));
        self
    }

    pub fn policy(&self) -> &RevocationPolicy {
        &self.policy
    }

    pub fn sources(&self) -> impl Iterator<Item = &SourceVerifier> {
        self.verifiers.iter()
    }

    /// Check `certificate` using the default order, or the override registered
    /// for `issuer` as trust anchor.
    pub async fn check(
        &self,
        certificate: &CertificateToken,
        issuer: &CertificateToken,
    ) -> RevocationOutcome {
        self.check_under_anchor(certificate, issuer, Some(&issuer.fingerprint()))
            .await
    }

    /// Check `certificate` using the order configured for `anchor`.
    pub async fn check_under_anchor(
        &self,
        certificate: &CertificateToken,
        issuer: &CertificateToken,
        anchor: Option<&Fingerprint>,
    ) -> RevocationOutcome {
        let now = self.clock.now();
        for kind in self.policy.order_for(anchor) {
            for verifier in self.verifiers_of(*kind) {
                if let Some(token) = verifier
                    .verify(certificate, issuer, now, self.policy.max_freshness_secs)
                    .await
                {
                    debug!(source = verifier.name(), %kind, serial = certificate.serial_number(), "accepted revocation token");
                    return RevocationOutcome::Token(token);
                }
            }
        }
        debug!(serial = certificate.serial_number(), "revocation status unknown");
        RevocationOutcome::Unknown
    }

    fn verifiers_of(&self, kind: RevocationKind) -> impl Iterator<Item = &SourceVerifier> {
        self.verifiers.iter().filter(move |v| v.kind() == kind)
    }
}
