//! Signature validation of decoded LOTL/TL documents.

use eutl_crypto::{sha256_multi, verify_digest};
use eutl_types::{
    CommonCertificateSource, ContentDigest, Indication, ParsingResult, SubIndication, Timestamp,
    ValidationResult,
};
use tracing::warn;

use crate::TslError;

/// Input digest of the validation stage.
///
/// Covers the downloaded content and the certificates the list is expected
/// to be signed with, so a change on either side forces re-validation.
pub fn validation_input(
    content: &ContentDigest,
    certificates: &CommonCertificateSource,
) -> ContentDigest {
    let mut fingerprints = certificates.fingerprints();
    fingerprints.sort();
    let mut parts: Vec<&[u8]> = Vec::with_capacity(fingerprints.len() + 1);
    parts.push(content.as_bytes());
    parts.extend(fingerprints.iter().map(|fp| fp.as_bytes().as_slice()));
    ContentDigest::new(sha256_multi(&parts))
}

/// Checks the mandatory enveloped signature of a trusted list.
#[derive(Clone, Debug)]
pub struct TrustedListValidator {
    freshness_warning: bool,
}

impl TrustedListValidator {
    pub fn new(freshness_warning: bool) -> Self {
        Self { freshness_warning }
    }

    /// Validate `parsed` against the certificates declared for its source.
    ///
    /// A missing signature, an undeclared signer or a signature that does not
    /// verify is an `Err`. A signer outside its validity period yields an
    /// INDETERMINATE result rather than an error.
    pub fn validate(
        &self,
        url: &str,
        parsed: &ParsingResult,
        certificates: &CommonCertificateSource,
        now: Timestamp,
    ) -> Result<ValidationResult, TslError> {
        let signature = parsed.signature.as_ref().ok_or(TslError::SignatureMissing)?;
        let signer = certificates
            .get(&signature.signer)
            .ok_or(TslError::UnknownSigner(signature.signer))?;

        if !verify_digest(
            &signature.signed_digest,
            &signature.signature,
            signer.public_key(),
        ) {
            return Err(TslError::InvalidSignature(signature.signer));
        }

        let expired = parsed.next_update.is_some_and(|next| next < now);
        if expired && self.freshness_warning {
            warn!(url, next_update = ?parsed.next_update, "trusted list is past its next update");
        }

        let signed_at = signature.signing_time.unwrap_or(now);
        let (indication, sub_indication) = if signer.is_valid_on(signed_at) {
            (Indication::TotalPassed, None)
        } else {
            (Indication::Indeterminate, Some(SubIndication::OutOfBoundsNoPoe))
        };

        Ok(ValidationResult {
            indication,
            sub_indication,
            signing_certificate: Some(signer.fingerprint()),
            signing_time: signature.signing_time,
            validated_at: now,
            expired,
        })
    }
}

impl Default for TrustedListValidator {
    fn default() -> Self {
        Self::new(true)
    }
}
