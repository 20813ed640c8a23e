//! Certificate-level answers for signature-format validators.

use std::sync::Arc;

use eutl_crypto::is_signed_by;
use eutl_revocation::{CertificateStatus, RevocationOutcome, RevocationVerifierChain};
use eutl_tsl::TrustedListsCertificateSource;
use eutl_types::{CertificateToken, Indication, SubIndication, Timestamp};
use tracing::debug;

use crate::Conclusion;

/// Joins the published trust store with the revocation chain.
pub struct CertificateVerifier {
    trust_store: Arc<TrustedListsCertificateSource>,
    revocation: Arc<RevocationVerifierChain>,
}

impl CertificateVerifier {
    pub fn new(
        trust_store: Arc<TrustedListsCertificateSource>,
        revocation: Arc<RevocationVerifierChain>,
    ) -> Self {
        Self {
            trust_store,
            revocation,
        }
    }

    pub fn is_trusted(&self, certificate: &CertificateToken) -> bool {
        self.trust_store.is_trusted(certificate)
    }

    pub async fn check_revocation(
        &self,
        certificate: &CertificateToken,
        issuer: &CertificateToken,
    ) -> RevocationOutcome {
        self.revocation.check(certificate, issuer).await
    }

    /// Verdict for `signing_certificate`, using `chain` to reach a trusted certificate.
    ///
    /// Every certificate below the anchor must be inside its validity period
    /// at `now` and have a revocation answer. A revoked certificate fails the
    /// chain; missing evidence leaves it indeterminate.
    pub async fn verify_chain(
        &self,
        signing_certificate: &CertificateToken,
        chain: &[CertificateToken],
        now: Timestamp,
    ) -> Conclusion {
        let Some(path) = self.build_path(signing_certificate, chain) else {
            let mut conclusion = Conclusion::indeterminate(SubIndication::NoCertificateChainFound);
            conclusion.error(format!(
                "no chain from {} to a trusted certificate",
                signing_certificate.subject()
            ));
            return conclusion;
        };

        let mut conclusion = Conclusion::passed();
        let anchor = &path[path.len() - 1];
        let anchor_fp = anchor.fingerprint();
        let services: Vec<String> = self
            .trust_store
            .trust_properties(&anchor_fp)
            .into_iter()
            .map(|p| format!("{} [{}]", p.service_type, p.territory.as_deref().unwrap_or("-")))
            .collect();
        conclusion.info(format!(
            "trust anchor {} ({})",
            anchor.subject(),
            services.join(", ")
        ));

        let mut out_of_bounds = false;
        let mut revoked = false;
        let mut unknown = false;
        for pair in path.windows(2) {
            let (certificate, issuer) = (&pair[0], &pair[1]);
            if !certificate.is_valid_on(now) {
                out_of_bounds = true;
                conclusion.error(format!(
                    "{} is outside its validity period [{}, {}]",
                    certificate.subject(),
                    certificate.not_before(),
                    certificate.not_after()
                ));
            }
            match self
                .revocation
                .check_under_anchor(certificate, issuer, Some(&anchor_fp))
                .await
            {
                RevocationOutcome::Token(token) => match token.status() {
                    CertificateStatus::Revoked { .. } => {
                        revoked = true;
                        let reason = token
                            .reason()
                            .map_or_else(|| "unspecified".to_string(), |r| r.to_string());
                        conclusion.error(format!(
                            "{} is revoked ({reason}) according to {}",
                            certificate.subject(),
                            token.kind()
                        ));
                    }
                    CertificateStatus::Good => conclusion.info(format!(
                        "{} is not revoked according to {}",
                        certificate.subject(),
                        token.kind()
                    )),
                    CertificateStatus::Unknown => {
                        unknown = true;
                        conclusion.warning(format!(
                            "{} is unknown to {}",
                            certificate.subject(),
                            token.kind()
                        ));
                    }
                },
                RevocationOutcome::Unknown => {
                    unknown = true;
                    conclusion.warning(format!(
                        "revocation status of {} is unknown",
                        certificate.subject()
                    ));
                }
            }
        }

        if revoked {
            conclusion.set_verdict(Indication::TotalFailed, Some(SubIndication::Revoked));
        } else if out_of_bounds {
            conclusion.set_verdict(Indication::Indeterminate, Some(SubIndication::OutOfBoundsNoPoe));
        } else if unknown {
            conclusion.set_verdict(Indication::Indeterminate, Some(SubIndication::TryLater));
        }
        debug!(
            subject = signing_certificate.subject(),
            path = path.len(),
            indication = %conclusion.indication,
            "chain verified"
        );
        conclusion
    }

    /// Path from `signing_certificate` up to the first trusted certificate.
    fn build_path(
        &self,
        signing_certificate: &CertificateToken,
        chain: &[CertificateToken],
    ) -> Option<Vec<CertificateToken>> {
        let mut path = vec![signing_certificate.clone()];
        loop {
            let current = path.last()?;
            if self.is_trusted(current) {
                return Some(path);
            }
            if path.len() > chain.len() {
                return None;
            }
            let issuer = chain.iter().find(|candidate| {
                !path.iter().any(|p| p.fingerprint() == candidate.fingerprint())
                    && is_signed_by(current, candidate)
            })?;
            path.push(issuer.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eutl_crypto::{issue_certificate, keypair_from_seed, self_signed_certificate};
    use eutl_types::{KeyPair, TbsCertificate, SystemClock};
    use eutl_revocation::RevocationPolicy;

    fn tbs(serial: u64, subject: &str, issuer: &str, keys: &KeyPair) -> TbsCertificate {
        TbsCertificate {
            serial_number: serial,
            subject: subject.to_string(),
            issuer: issuer.to_string(),
            public_key: keys.public.clone(),
            not_before: Timestamp::new(0),
            not_after: Timestamp::new(u64::MAX / 2),
            ca: serial == 1,
        }
    }

    fn verifier() -> CertificateVerifier {
        let chain = RevocationVerifierChain::new(RevocationPolicy::default(), Arc::new(SystemClock))
            .unwrap();
        CertificateVerifier::new(
            Arc::new(TrustedListsCertificateSource::new()),
            Arc::new(chain),
        )
    }

    #[tokio::test]
    async fn untrusted_root_has_no_chain() {
        let root_keys = keypair_from_seed(&[1; 32]);
        let leaf_keys = keypair_from_seed(&[2; 32]);
        let root = self_signed_certificate(tbs(1, "CN=Root", "", &root_keys), &root_keys.private).unwrap();
        let leaf = issue_certificate(tbs(2, "CN=Leaf", "CN=Root", &leaf_keys), &root_keys.private).unwrap();

        let conclusion = verifier()
            .verify_chain(&leaf, &[root], Timestamp::new(10))
            .await;

        assert_eq!(conclusion.indication, Indication::Indeterminate);
        assert_eq!(conclusion.sub_indication, Some(SubIndication::NoCertificateChainFound));
        assert_eq!(conclusion.errors.len(), 1);
    }
}
