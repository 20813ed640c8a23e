use std::sync::Arc;

use eutl_crypto::{content_digest, verify_digest};
use eutl_types::{SubIndication, Timestamp};
use tracing::{info, warn};

use crate::{
    CertificateVerifier, Conclusion, EmbeddedSignature, IdentifierRegistry, SignatureIdentifier,
    SignatureReport, SignedArtifact, SimpleReport,
};

/// Validates every signature of an artifact into a [`SimpleReport`].
pub struct DocumentValidator {
    verifier: Arc<CertificateVerifier>,
}

impl DocumentValidator {
    pub fn new(verifier: Arc<CertificateVerifier>) -> Self {
        Self { verifier }
    }

    pub async fn validate(&self, artifact: &SignedArtifact, now: Timestamp) -> SimpleReport {
        let mut ids = IdentifierRegistry::new();
        let mut signatures = Vec::with_capacity(artifact.signatures().len());
        for signature in artifact.signatures() {
            let id = ids.assign(SignatureIdentifier::compute(
                &signature.signing_certificate.fingerprint(),
                signature.signing_time,
                &signature.signature,
                signature.byte_range,
            ));
            let conclusion = self.validate_signature(artifact, signature, now).await;
            if !conclusion.is_passed() {
                warn!(
                    document = artifact.name(),
                    %id,
                    indication = %conclusion.indication,
                    "signature did not pass"
                );
            }
            signatures.push(SignatureReport {
                id,
                dialect: signature.dialect,
                signing_certificate: signature.signing_certificate.fingerprint(),
                signed_by: signature.signing_certificate.subject().to_string(),
                signing_time: signature.signing_time,
                conclusion,
            });
        }
        let report = SimpleReport {
            document_name: artifact.name().to_string(),
            validation_time: now,
            signatures,
        };
        info!(
            document = artifact.name(),
            signatures = report.signatures_count(),
            valid = report.valid_signatures_count(),
            "document validated"
        );
        report
    }

    async fn validate_signature(
        &self,
        artifact: &SignedArtifact,
        signature: &EmbeddedSignature,
        now: Timestamp,
    ) -> Conclusion {
        let signed = match signature.byte_range.slice(artifact.content()) {
            Ok(bytes) => bytes,
            Err(e) => {
                let mut conclusion = Conclusion::failed(SubIndication::FormatFailure);
                conclusion.error(e.to_string());
                return conclusion;
            }
        };
        if content_digest(signed) != signature.signed_digest {
            let mut conclusion = Conclusion::failed(SubIndication::HashFailure);
            conclusion.error("signed content does not match the signed digest");
            return conclusion;
        }
        if !verify_digest(
            &signature.signed_digest,
            &signature.signature,
            signature.signing_certificate.public_key(),
        ) {
            let mut conclusion = Conclusion::failed(SubIndication::SigCryptoFailure);
            conclusion.error("signature value does not verify");
            return conclusion;
        }

        let mut conclusion = Conclusion::passed();
        conclusion.info(format!("{} signature value verified", signature.dialect));
        if !signature.signing_certificate.is_valid_on(signature.signing_time) {
            conclusion.warning(format!(
                "claimed signing time {} is outside the signing certificate validity",
                signature.signing_time
            ));
        }
        let chain = self
            .verifier
            .verify_chain(&signature.signing_certificate, &signature.chain, now)
            .await;
        let (indication, sub_indication) = (chain.indication, chain.sub_indication);
        conclusion.absorb_messages(chain);
        conclusion.set_verdict(indication, sub_indication);
        conclusion
    }
}
