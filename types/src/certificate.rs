//! Certificates and in-memory certificate sources.
//!
//! Low-level X.509 decoding happens in external collaborators; this workspace
//! only needs the fields that trust and revocation decisions read, plus the
//! issuer's signature over them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::{Fingerprint, PublicKey, Signature, Timestamp, TypesError};

/// The signed portion of a certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TbsCertificate {
    pub serial_number: u64,
    pub subject: String,
    pub issuer: String,
    pub public_key: PublicKey,
    pub not_before: Timestamp,
    pub not_after: Timestamp,
    /// Whether the subject may issue certificates (basicConstraints cA).
    pub ca: bool,
}

impl TbsCertificate {
    /// Canonical encoding signed by the issuer.
    pub fn encode(&self) -> Result<Vec<u8>, TypesError> {
        bincode::serialize(self).map_err(|e| TypesError::Encoding(e.to_string()))
    }
}

/// A certificate together with its issuer signature and fingerprint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateToken {
    tbs: TbsCertificate,
    signature: Signature,
    fingerprint: Fingerprint,
}

impl CertificateToken {
    /// Assemble a certificate from its signed fields and the issuer's signature.
    ///
    /// The fingerprint is SHA-256 over the encoded fields followed by the signature.
    pub fn from_parts(tbs: TbsCertificate, signature: Signature) -> Result<Self, TypesError> {
        let encoded = tbs.encode()?;
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        hasher.update(signature.as_bytes());
        let mut output = [0u8; 32];
        output.copy_from_slice(&hasher.finalize());
        let fingerprint = Fingerprint::new(output);
        Ok(Self {
            tbs,
            signature,
            fingerprint,
        })
    }

    pub fn tbs(&self) -> &TbsCertificate {
        &self.tbs
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn subject(&self) -> &str {
        &self.tbs.subject
    }

    pub fn issuer(&self) -> &str {
        &self.tbs.issuer
    }

    pub fn serial_number(&self) -> u64 {
        self.tbs.serial_number
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.tbs.public_key
    }

    pub fn not_before(&self) -> Timestamp {
        self.tbs.not_before
    }

    pub fn not_after(&self) -> Timestamp {
        self.tbs.not_after
    }

    pub fn is_ca(&self) -> bool {
        self.tbs.ca
    }

    /// Whether the subject and issuer names match.
    pub fn is_self_issued(&self) -> bool {
        self.tbs.subject == self.tbs.issuer
    }

    /// Whether `at` lies inside `[not_before, not_after]`.
    pub fn is_valid_on(&self, at: Timestamp) -> bool {
        self.tbs.not_before <= at && at <= self.tbs.not_after
    }

    /// Short identifier for log lines.
    pub fn id_string(&self) -> String {
        format!("C-{}", self.fingerprint.to_hex().to_uppercase())
    }
}

/// A set of certificates indexed by fingerprint.
///
/// Insertion order is preserved; re-adding a known certificate is a no-op.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommonCertificateSource {
    certificates: Vec<CertificateToken>,
    #[serde(skip)]
    index: HashMap<Fingerprint, usize>,
}

impl CommonCertificateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_certificates<I>(certificates: I) -> Self
    where
        I: IntoIterator<Item = CertificateToken>,
    {
        let mut source = Self::new();
        for certificate in certificates {
            source.add_certificate(certificate);
        }
        source
    }

    /// Add a certificate, returning `false` if it was already present.
    pub fn add_certificate(&mut self, certificate: CertificateToken) -> bool {
        self.ensure_index();
        let fp = certificate.fingerprint();
        if self.index.contains_key(&fp) {
            return false;
        }
        self.index.insert(fp, self.certificates.len());
        self.certificates.push(certificate);
        true
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&CertificateToken> {
        match self.index.get(fingerprint) {
            Some(&i) => self.certificates.get(i),
            // A deserialized source has no index until first mutation.
            None => self
                .certificates
                .iter()
                .find(|c| &c.fingerprint() == fingerprint),
        }
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.get(fingerprint).is_some()
    }

    /// Certificates whose subject matches `subject`, in insertion order.
    pub fn by_subject<'a>(&'a self, subject: &'a str) -> impl Iterator<Item = &'a CertificateToken> {
        self.certificates.iter().filter(move |c| c.subject() == subject)
    }

    pub fn certificates(&self) -> &[CertificateToken] {
        &self.certificates
    }

    pub fn fingerprints(&self) -> Vec<Fingerprint> {
        self.certificates.iter().map(|c| c.fingerprint()).collect()
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    fn ensure_index(&mut self) {
        if self.index.len() != self.certificates.len() {
            self.index = self
                .certificates
                .iter()
                .enumerate()
                .map(|(i, c)| (c.fingerprint(), i))
                .collect();
        }
    }
}

impl PartialEq for CommonCertificateSource {
    fn eq(&self, other: &Self) -> bool {
        self.certificates == other.certificates
    }
}

impl Eq for CommonCertificateSource {}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert(serial: u64, subject: &str) -> CertificateToken {
        let tbs = TbsCertificate {
            serial_number: serial,
            subject: subject.to_string(),
            issuer: "CN=Root".to_string(),
            public_key: PublicKey([serial as u8; 32]),
            not_before: Timestamp::new(0),
            not_after: Timestamp::new(1_000),
            ca: false,
        };
        CertificateToken::from_parts(tbs, Signature([1u8; 64])).unwrap()
    }

    #[test]
    fn fingerprint_depends_on_signature() {
        let a = cert(1, "CN=A");
        let b = CertificateToken::from_parts(a.tbs().clone(), Signature([2u8; 64])).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn source_deduplicates_by_fingerprint() {
        let mut source = CommonCertificateSource::new();
        assert!(source.add_certificate(cert(1, "CN=A")));
        assert!(!source.add_certificate(cert(1, "CN=A")));
        assert!(source.add_certificate(cert(2, "CN=B")));
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn lookup_works_after_deserialization() {
        let source = CommonCertificateSource::from_certificates([cert(1, "CN=A"), cert(2, "CN=B")]);
        let bytes = bincode::serialize(&source).unwrap();
        let back: CommonCertificateSource = bincode::deserialize(&bytes).unwrap();
        let fp = cert(2, "CN=B").fingerprint();
        assert_eq!(back.get(&fp).map(|c| c.subject()), Some("CN=B"));
        assert_eq!(back.by_subject("CN=A").count(), 1);
    }

    #[test]
    fn validity_window_is_inclusive() {
        let c = cert(1, "CN=A");
        assert!(c.is_valid_on(Timestamp::new(0)));
        assert!(c.is_valid_on(Timestamp::new(1_000)));
        assert!(!c.is_valid_on(Timestamp::new(1_001)));
    }
}
