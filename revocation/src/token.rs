//! A single revocation-status assertion.

use eutl_types::{CertificateToken, ContentDigest, Fingerprint, Signature, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{RevocationError, RevocationReason};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevocationKind {
    Crl,
    Ocsp,
}

impl fmt::Display for RevocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Crl => "CRL",
            Self::Ocsp => "OCSP",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Good,
    Revoked {
        revoked_at: Timestamp,
        reason: RevocationReason,
    },
    Unknown,
}

/// Outcome of checking the token itself. Starts as `NotChecked`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenValidity {
    NotChecked,
    Valid,
    Invalid(String),
}

/// Fields common to CRL- and OCSP-derived tokens.
#[derive(Clone, Debug)]
pub struct TokenFields {
    pub kind: RevocationKind,
    pub issuer: Fingerprint,
    pub serial_number: u64,
    pub status: CertificateStatus,
    pub production_time: Timestamp,
    pub this_update: Timestamp,
    pub next_update: Option<Timestamp>,
    pub archive_cutoff: Option<Timestamp>,
    pub cert_hash: Option<Fingerprint>,
    /// Certificate whose key produced `signature`.
    pub signer: CertificateToken,
    /// Digest of the evidence body the signature covers.
    pub signed_digest: ContentDigest,
    pub signature: Signature,
    pub source_url: Option<String>,
}

/// Revocation evidence for one (certificate, issuer) pair.
///
/// Built in two phases: construction from evidence fields, then a single
/// [`bind_to`](Self::bind_to) naming the certificate it answers for.
#[derive(Clone, Debug)]
pub struct RevocationToken {
    fields: TokenFields,
    related_certificate: Option<Fingerprint>,
    validity: TokenValidity,
}

impl RevocationToken {
    pub fn new(fields: TokenFields) -> Self {
        Self {
            fields,
            related_certificate: None,
            validity: TokenValidity::NotChecked,
        }
    }

    /// Bind the token to the certificate it is about. Allowed once.
    pub fn bind_to(&mut self, certificate: &CertificateToken) -> Result<(), RevocationError> {
        if let Some(existing) = self.related_certificate {
            return Err(RevocationError::AlreadyBound(existing));
        }
        self.related_certificate = Some(certificate.fingerprint());
        Ok(())
    }

    pub fn related_certificate(&self) -> Option<Fingerprint> {
        self.related_certificate
    }

    pub fn kind(&self) -> RevocationKind {
        self.fields.kind
    }

    pub fn issuer(&self) -> Fingerprint {
        self.fields.issuer
    }

    pub fn serial_number(&self) -> u64 {
        self.fields.serial_number
    }

    pub fn status(&self) -> &CertificateStatus {
        &self.fields.status
    }

    pub fn reason(&self) -> Option<RevocationReason> {
        match self.fields.status {
            CertificateStatus::Revoked { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn production_time(&self) -> Timestamp {
        self.fields.production_time
    }

    pub fn this_update(&self) -> Timestamp {
        self.fields.this_update
    }

    pub fn next_update(&self) -> Option<Timestamp> {
        self.fields.next_update
    }

    pub fn archive_cutoff(&self) -> Option<Timestamp> {
        self.fields.archive_cutoff
    }

    pub fn cert_hash(&self) -> Option<Fingerprint> {
        self.fields.cert_hash
    }

    pub fn signer(&self) -> &CertificateToken {
        &self.fields.signer
    }

    pub fn signed_digest(&self) -> &ContentDigest {
        &self.fields.signed_digest
    }

    pub fn signature(&self) -> &Signature {
        &self.fields.signature
    }

    pub fn source_url(&self) -> Option<&str> {
        self.fields.source_url.as_deref()
    }

    pub fn validity(&self) -> &TokenValidity {
        &self.validity
    }

    pub fn is_valid(&self) -> bool {
        self.validity == TokenValidity::Valid
    }

    pub fn is_revoked(&self) -> bool {
        matches!(self.fields.status, CertificateStatus::Revoked { .. })
    }

    pub(crate) fn set_validity(&mut self, validity: TokenValidity) {
        self.validity = validity;
    }

    /// A copy carrying no binding or validity, for sources that cache tokens.
    pub(crate) fn unbound(&self) -> Self {
        Self::new(self.fields.clone())
    }
}

impl fmt::Display for RevocationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} token for serial {} ({:?}, this_update {})",
            self.fields.kind, self.fields.serial_number, self.fields.status, self.fields.this_update
        )
    }
}
