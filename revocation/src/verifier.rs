//! Acceptance rules for a single revocation token, and the per-source
//! verifier that applies them.

use std::sync::Arc;

use eutl_crypto::{is_signed_by, verify_digest};
use eutl_types::{CertificateToken, Timestamp};
use tracing::{debug, warn};

use crate::{CertificateStatus, RevocationKind, RevocationSource, RevocationToken, TokenValidity};

/// Decide whether `token` is usable evidence about `certificate` at `now`.
pub fn check_token(
    token: &RevocationToken,
    certificate: &CertificateToken,
    issuer: &CertificateToken,
    now: Timestamp,
    max_freshness_secs: u64,
) -> TokenValidity {
    match token_problem(token, certificate, issuer, now, max_freshness_secs) {
        Some(problem) => TokenValidity::Invalid(problem),
        None => TokenValidity::Valid,
    }
}

fn token_problem(
    token: &RevocationToken,
    certificate: &CertificateToken,
    issuer: &CertificateToken,
    now: Timestamp,
    max_freshness_secs: u64,
) -> Option<String> {
    if token.related_certificate() != Some(certificate.fingerprint())
        || token.serial_number() != certificate.serial_number()
        || token.issuer() != issuer.fingerprint()
    {
        return Some("token does not answer for this certificate and issuer".into());
    }
    if *token.status() == CertificateStatus::Unknown {
        return Some("responder does not know the certificate".into());
    }
    if token
        .cert_hash()
        .is_some_and(|hash| hash != certificate.fingerprint())
    {
        return Some("CertHash does not match the certificate".into());
    }

    let signer = token.signer();
    let delegated = signer.fingerprint() != issuer.fingerprint();
    if delegated && !is_signed_by(signer, issuer) {
        return Some(format!(
            "signer {} is neither the issuer nor issued by it",
            signer.subject()
        ));
    }
    if delegated && !signer.is_valid_on(token.production_time()) {
        return Some("delegated signer was not valid at production time".into());
    }
    if !verify_digest(token.signed_digest(), token.signature(), signer.public_key()) {
        return Some("signature does not verify".into());
    }

    if token.this_update() > now {
        return Some(format!("this_update {} is in the future", token.this_update()));
    }
    let archived = token
        .archive_cutoff()
        .is_some_and(|cutoff| cutoff <= certificate.not_after());
    match token.next_update() {
        Some(next) if next < now && !archived => {
            Some(format!("next_update {next} has elapsed"))
        }
        Some(_) => None,
        None if archived => None,
        None if token.this_update().has_expired(max_freshness_secs, now) => Some(format!(
            "no next_update and this_update {} is older than {max_freshness_secs}s",
            token.this_update()
        )),
        None => None,
    }
}

/// One configured source plus the rules for accepting its tokens.
///
/// Every failure of the source is caught here and reported as "no token".
#[derive(Clone)]
pub struct SourceVerifier {
    name: String,
    source: Arc<dyn RevocationSource>,
}

impl SourceVerifier {
    pub fn new(name: &str, source: Arc<dyn RevocationSource>) -> Self {
        Self {
            name: name.to_string(),
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RevocationKind {
        self.source.kind()
    }

    /// The source's token if it is valid evidence, otherwise `None`.
    pub async fn verify(
        &self,
        certificate: &CertificateToken,
        issuer: &CertificateToken,
        now: Timestamp,
        max_freshness_secs: u64,
    ) -> Option<RevocationToken> {
        let token = match self.source.get_revocation_token(certificate, issuer).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!(source = %self.name, serial = certificate.serial_number(), "no revocation data");
                return None;
            }
            Err(e) => {
                warn!(source = %self.name, kind = %self.kind(), error = %e, "revocation source failed");
                return None;
            }
        };
        let mut token = token;
        let validity = check_token(&token, certificate, issuer, now, max_freshness_secs);
        if let TokenValidity::Invalid(reason) = &validity {
            warn!(source = %self.name, kind = %token.kind(), %reason, "discarding revocation token");
        }
        token.set_validity(validity);
        token.is_valid().then_some(token)
    }
}
