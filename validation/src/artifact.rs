//! Documents that accumulate signatures through incremental updates.
//!
//! Each signature covers every byte present when it was applied. The
//! signature is then appended to the document, so a later signature also
//! covers the earlier ones.

use eutl_crypto::{content_digest, sign_digest};
use eutl_types::{CertificateToken, ContentDigest, PrivateKey, Signature, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{SignatureDialect, ValidationError};

/// Contiguous region of the document covered by a signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteRange {
    pub offset: usize,
    pub length: usize,
}

impl ByteRange {
    pub fn slice<'a>(&self, bytes: &'a [u8]) -> Result<&'a [u8], ValidationError> {
        let invalid = || ValidationError::InvalidByteRange {
            offset: self.offset,
            length: self.length,
            size: bytes.len(),
        };
        let end = self.offset.checked_add(self.length).ok_or_else(invalid)?;
        bytes.get(self.offset..end).ok_or_else(invalid)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddedSignature {
    pub dialect: SignatureDialect,
    pub signing_certificate: CertificateToken,
    /// Certificates shipped with the signature, in no particular order.
    pub chain: Vec<CertificateToken>,
    pub signing_time: Timestamp,
    pub byte_range: ByteRange,
    pub signed_digest: ContentDigest,
    pub signature: Signature,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedArtifact {
    name: String,
    content: Vec<u8>,
    signatures: Vec<EmbeddedSignature>,
}

impl SignedArtifact {
    pub fn new(name: &str, content: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            content,
            signatures: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn signatures(&self) -> &[EmbeddedSignature] {
        &self.signatures
    }

    /// Sign everything currently in the document and append the signature.
    pub fn sign(
        &mut self,
        dialect: SignatureDialect,
        signing_certificate: CertificateToken,
        chain: Vec<CertificateToken>,
        key: &PrivateKey,
        signing_time: Timestamp,
    ) -> &EmbeddedSignature {
        let byte_range = ByteRange {
            offset: 0,
            length: self.content.len(),
        };
        let signed_digest = content_digest(&self.content);
        let signature = sign_digest(&signed_digest, key);

        self.content.extend_from_slice(signature.as_bytes());
        self.signatures.push(EmbeddedSignature {
            dialect,
            signing_certificate,
            chain,
            signing_time,
            byte_range,
            signed_digest,
            signature,
        });
        let last = self.signatures.len() - 1;
        &self.signatures[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eutl_crypto::{keypair_from_seed, self_signed_certificate};
    use eutl_types::TbsCertificate;

    #[test]
    fn incremental_signatures_cover_earlier_ones() {
        let keys = keypair_from_seed(&[5; 32]);
        let cert = self_signed_certificate(
            TbsCertificate {
                serial_number: 5,
                subject: "CN=Signer".into(),
                issuer: String::new(),
                public_key: keys.public.clone(),
                not_before: Timestamp::new(0),
                not_after: Timestamp::new(1_000),
                ca: false,
            },
            &keys.private,
        )
        .unwrap();
        let mut artifact = SignedArtifact::new("contract.pdf", b"%PDF body".to_vec());

        let first = artifact
            .sign(SignatureDialect::Xades132, cert.clone(), Vec::new(), &keys.private, Timestamp::new(10))
            .byte_range;
        let second = artifact
            .sign(SignatureDialect::Xades132, cert, Vec::new(), &keys.private, Timestamp::new(10))
            .byte_range;

        assert_eq!(first.length, 9);
        assert_eq!(second.length, 9 + 64);
        assert_eq!(artifact.content().len(), 9 + 128);
    }

    #[test]
    fn out_of_bounds_range_is_rejected() {
        let range = ByteRange { offset: 4, length: 10 };
        assert!(matches!(
            range.slice(b"short"),
            Err(ValidationError::InvalidByteRange { size: 5, .. })
        ));
        assert_eq!(ByteRange { offset: 1, length: 3 }.slice(b"short").unwrap(), b"hor");
    }
}
